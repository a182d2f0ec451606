//! Note domain model and lifecycle state machine.
//!
//! # Responsibility
//! - Define the stored note record and edit payloads.
//! - Own the legal lifecycle transitions between active, recycled and purged.
//!
//! # Invariants
//! - `owner_id` never changes after creation.
//! - `Purged` is terminal: no transition leaves it.
//! - Edits and purges apply to active and recycled notes alike; an edit
//!   never moves a note between listings.

use crate::model::account::AccountId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a note.
pub type NoteId = Uuid;

/// Category applied when a note is created without a tag.
pub const DEFAULT_TAG: &str = "General";

/// Lifecycle position of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteState {
    /// Visible in the main listing.
    Active,
    /// Moved to the recycle bin; restorable.
    Recycled,
    /// Physically removed.
    Purged,
}

/// Operation requested against a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteTransition {
    Edit,
    SoftDelete,
    Restore,
    Purge,
}

impl Display for NoteState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Recycled => "recycled",
            Self::Purged => "purged",
        })
    }
}

impl Display for NoteTransition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Edit => "edit",
            Self::SoftDelete => "soft_delete",
            Self::Restore => "restore",
            Self::Purge => "purge",
        })
    }
}

/// A transition that the lifecycle does not allow from the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IllegalTransition {
    pub from: NoteState,
    pub transition: NoteTransition,
}

impl Display for IllegalTransition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot {} a {} note", self.transition, self.from)
    }
}

impl Error for IllegalTransition {}

impl NoteState {
    /// Returns the state reached by applying `transition`.
    ///
    /// Soft-deleting a recycled note and restoring an active note are
    /// accepted as no-ops. Editing keeps the current state.
    pub fn apply(self, transition: NoteTransition) -> Result<NoteState, IllegalTransition> {
        use NoteState::{Active, Purged, Recycled};
        use NoteTransition::{Edit, Purge, Restore, SoftDelete};

        match (self, transition) {
            (live @ (Active | Recycled), Edit) => Ok(live),
            (Active | Recycled, SoftDelete) => Ok(Recycled),
            (Active | Recycled, Restore) => Ok(Active),
            (Active | Recycled, Purge) => Ok(Purged),
            (from, transition) => Err(IllegalTransition { from, transition }),
        }
    }

    pub(crate) fn from_is_deleted(is_deleted: bool) -> Self {
        if is_deleted {
            Self::Recycled
        } else {
            Self::Active
        }
    }
}

/// Stored note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(rename = "noteId")]
    pub id: NoteId,
    pub owner_id: AccountId,
    pub title: String,
    pub description: String,
    pub tag: String,
    pub state: NoteState,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Note {
    /// Builds a fresh active note with a generated id.
    ///
    /// Blank or missing tags fall back to [`DEFAULT_TAG`].
    pub fn new(
        owner_id: AccountId,
        title: impl Into<String>,
        description: impl Into<String>,
        tag: Option<&str>,
        now_ms: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title: title.into(),
            description: description.into(),
            tag: effective_tag(tag),
            state: NoteState::Active,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }
}

/// Note joined with its author's identity, as returned by single-note fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteWithAuthor {
    #[serde(flatten)]
    pub note: Note,
    pub user_name: String,
    pub email: String,
}

/// Partial overwrite of a stored note. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NoteEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tag: Option<String>,
}

impl NoteEdit {
    /// Applies the provided fields onto `note`.
    pub fn apply_to(&self, note: &mut Note) {
        if let Some(title) = &self.title {
            note.title = title.clone();
        }
        if let Some(description) = &self.description {
            note.description = description.clone();
        }
        if let Some(tag) = &self.tag {
            note.tag = effective_tag(Some(tag));
        }
    }
}

fn effective_tag(tag: Option<&str>) -> String {
    match tag.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => DEFAULT_TAG.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_note_accepts_edit_and_soft_delete_only_moves_to_recycled() {
        assert_eq!(NoteState::Active.apply(NoteTransition::Edit), Ok(NoteState::Active));
        assert_eq!(
            NoteState::Active.apply(NoteTransition::SoftDelete),
            Ok(NoteState::Recycled)
        );
        assert_eq!(
            NoteState::Active.apply(NoteTransition::Restore),
            Ok(NoteState::Active)
        );
    }

    #[test]
    fn purge_is_allowed_from_either_live_state() {
        assert_eq!(
            NoteState::Active.apply(NoteTransition::Purge),
            Ok(NoteState::Purged)
        );
        assert_eq!(
            NoteState::Recycled.apply(NoteTransition::Purge),
            Ok(NoteState::Purged)
        );
    }

    #[test]
    fn edit_keeps_recycled_note_in_the_bin() {
        assert_eq!(
            NoteState::Recycled.apply(NoteTransition::Edit),
            Ok(NoteState::Recycled)
        );
    }

    #[test]
    fn purged_is_terminal() {
        for transition in [
            NoteTransition::Edit,
            NoteTransition::SoftDelete,
            NoteTransition::Restore,
            NoteTransition::Purge,
        ] {
            assert!(NoteState::Purged.apply(transition).is_err());
        }
        let err = NoteState::Purged.apply(NoteTransition::Edit).unwrap_err();
        assert_eq!(err.to_string(), "cannot edit a purged note");
    }

    #[test]
    fn missing_or_blank_tag_defaults_to_general() {
        let owner = AccountId::new_v4();
        assert_eq!(Note::new(owner, "N", "D", None, 0).tag, DEFAULT_TAG);
        assert_eq!(Note::new(owner, "N", "D", Some("  "), 0).tag, DEFAULT_TAG);
        assert_eq!(Note::new(owner, "N", "D", Some("work"), 0).tag, "work");
    }

    #[test]
    fn edit_keeps_fields_that_are_not_provided() {
        let mut note = Note::new(AccountId::new_v4(), "N", "D", Some("work"), 0);
        NoteEdit {
            title: Some("N2".to_string()),
            ..NoteEdit::default()
        }
        .apply_to(&mut note);
        assert_eq!(note.title, "N2");
        assert_eq!(note.description, "D");
        assert_eq!(note.tag, "work");
    }
}
