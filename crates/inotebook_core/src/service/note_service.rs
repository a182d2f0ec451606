//! Note lifecycle service.
//!
//! # Responsibility
//! - Create, edit, recycle, restore and purge notes on behalf of an owner.
//! - Route every state change through `NoteState::apply`.
//! - List an owner's notes per lifecycle state.
//!
//! # Invariants
//! - Notes owned by someone else are reported as not found.
//! - Writes are compare-and-set on the state read just before; a lost race
//!   surfaces as `NotFound` or `Conflict`, never as a silent overwrite.
//! - `find_note` does not check ownership.

use crate::error::ServiceError;
use crate::model::account::AccountId;
use crate::model::note::{Note, NoteEdit, NoteId, NoteState, NoteTransition, NoteWithAuthor};
use crate::model::now_epoch_ms;
use crate::repo::note_repo::NoteRepository;
use log::{info, warn};

/// Note creation input.
#[derive(Debug, Clone, Default)]
pub struct CreateNoteRequest {
    pub title: String,
    pub description: String,
    pub tag: Option<String>,
}

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates an active note. A missing tag becomes the default category.
    pub fn create_note(
        &self,
        owner: AccountId,
        request: &CreateNoteRequest,
    ) -> Result<Note, ServiceError> {
        if request.title.trim().is_empty() {
            return Err(ServiceError::Validation("title cannot be empty".to_string()));
        }
        if request.description.trim().is_empty() {
            return Err(ServiceError::Validation(
                "description cannot be empty".to_string(),
            ));
        }

        let note = Note::new(
            owner,
            request.title.as_str(),
            request.description.as_str(),
            request.tag.as_deref(),
            now_epoch_ms(),
        );
        self.repo.insert_note(&note)?;
        info!(
            "event=note_create module=note status=ok note_id={} owner_id={owner}",
            note.id
        );
        Ok(note)
    }

    /// Overwrites the provided fields of a note, whether active or recycled.
    pub fn edit_note(
        &self,
        owner: AccountId,
        id: NoteId,
        edit: &NoteEdit,
    ) -> Result<Note, ServiceError> {
        if edit.title.as_deref().is_some_and(|title| title.trim().is_empty()) {
            return Err(ServiceError::Validation("title cannot be empty".to_string()));
        }

        let mut note = self.load_owned(owner, id)?;
        note.state.apply(NoteTransition::Edit)?;
        edit.apply_to(&mut note);

        let now_ms = now_epoch_ms();
        if !self.repo.save_content(&note, now_ms)? {
            return Err(self.lost_race(owner, id, NoteTransition::Edit));
        }
        note.updated_at = now_ms;
        info!("event=note_edit module=note status=ok note_id={id}");
        Ok(note)
    }

    /// Moves a note to the recycle bin.
    pub fn soft_delete_note(&self, owner: AccountId, id: NoteId) -> Result<Note, ServiceError> {
        self.transition(owner, id, NoteTransition::SoftDelete)
    }

    /// Brings a recycled note back to the active listing.
    pub fn restore_note(&self, owner: AccountId, id: NoteId) -> Result<Note, ServiceError> {
        self.transition(owner, id, NoteTransition::Restore)
    }

    /// Permanently removes a note from either listing.
    pub fn purge_note(&self, owner: AccountId, id: NoteId) -> Result<(), ServiceError> {
        self.transition(owner, id, NoteTransition::Purge).map(|_| ())
    }

    /// Fetches one note with its author, for any authenticated caller.
    pub fn find_note(&self, id: NoteId) -> Result<NoteWithAuthor, ServiceError> {
        self.repo
            .get_note_with_author(id)?
            .ok_or(ServiceError::NotFound("note"))
    }

    /// Lists the owner's notes in `state`, oldest first.
    pub fn list_notes(&self, owner: AccountId, state: NoteState) -> Result<Vec<Note>, ServiceError> {
        if state == NoteState::Purged {
            return Ok(Vec::new());
        }
        Ok(self.repo.list_notes(owner, state)?)
    }

    fn transition(
        &self,
        owner: AccountId,
        id: NoteId,
        transition: NoteTransition,
    ) -> Result<Note, ServiceError> {
        let mut note = self.load_owned(owner, id)?;
        let from = note.state;
        let to = from.apply(transition)?;
        let now_ms = now_epoch_ms();

        let applied = match to {
            NoteState::Purged => self.repo.purge_note(owner, id, from)?,
            live => self.repo.set_state(owner, id, from, live, now_ms)?,
        };
        if !applied {
            return Err(self.lost_race(owner, id, transition));
        }
        info!(
            "event=note_transition module=note status=ok note_id={id} transition={transition} from={from} to={to}"
        );
        note.state = to;
        note.updated_at = now_ms;
        Ok(note)
    }

    fn load_owned(&self, owner: AccountId, id: NoteId) -> Result<Note, ServiceError> {
        self.repo
            .get_owned_note(owner, id)?
            .ok_or(ServiceError::NotFound("note"))
    }

    /// Classifies a compare-and-set that matched no row.
    fn lost_race(&self, owner: AccountId, id: NoteId, transition: NoteTransition) -> ServiceError {
        warn!(
            "event=note_transition module=note status=conflict note_id={id} transition={transition}"
        );
        match self.repo.get_owned_note(owner, id) {
            Ok(None) => ServiceError::NotFound("note"),
            Ok(Some(_)) => {
                ServiceError::Conflict("note was modified concurrently".to_string())
            }
            Err(err) => err.into(),
        }
    }
}
