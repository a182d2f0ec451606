//! Note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist notes and their lifecycle flag (`is_deleted`).
//! - Provide owner-scoped reads and compare-and-set writes for transitions.
//!
//! # Invariants
//! - Owner-scoped writes never touch another account's rows.
//! - State writes only apply when the row is still in the expected state;
//!   callers learn about a lost race through the `false` return value.
//! - Listings are ordered by `created_at ASC`, then insertion order.

use crate::model::account::AccountId;
use crate::model::note::{Note, NoteId, NoteState, NoteWithAuthor};
use crate::repo::{ensure_tables, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const NOTE_SELECT_SQL: &str = "SELECT
    notes.id,
    notes.owner_id,
    notes.title,
    notes.description,
    notes.tag,
    notes.is_deleted,
    notes.created_at,
    notes.updated_at
FROM notes";

/// Repository interface for note records.
pub trait NoteRepository {
    fn insert_note(&self, note: &Note) -> RepoResult<()>;
    /// Gets a note only when `owner` owns it.
    fn get_owned_note(&self, owner: AccountId, id: NoteId) -> RepoResult<Option<Note>>;
    /// Gets a note joined with its author's name and email.
    fn get_note_with_author(&self, id: NoteId) -> RepoResult<Option<NoteWithAuthor>>;
    /// Overwrites content fields of an owned note in either live state.
    fn save_content(&self, note: &Note, now_ms: i64) -> RepoResult<bool>;
    /// Moves an owned note between `Active` and `Recycled`.
    fn set_state(
        &self,
        owner: AccountId,
        id: NoteId,
        from: NoteState,
        to: NoteState,
        now_ms: i64,
    ) -> RepoResult<bool>;
    /// Physically removes an owned note that is still in `from`.
    fn purge_note(&self, owner: AccountId, id: NoteId, from: NoteState) -> RepoResult<bool>;
    /// Lists an owner's notes in one lifecycle state.
    fn list_notes(&self, owner: AccountId, state: NoteState) -> RepoResult<Vec<Note>>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["notes", "accounts"])?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn insert_note(&self, note: &Note) -> RepoResult<()> {
        let is_deleted = stored_flag(note.state)?;
        self.conn.execute(
            "INSERT INTO notes (
                id,
                owner_id,
                title,
                description,
                tag,
                is_deleted,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                note.id.to_string(),
                note.owner_id.to_string(),
                note.title.as_str(),
                note.description.as_str(),
                note.tag.as_str(),
                is_deleted,
                note.created_at,
                note.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get_owned_note(&self, owner: AccountId, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL} WHERE notes.id = ?1 AND notes.owner_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![id.to_string(), owner.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_note_row(row)?)),
            None => Ok(None),
        }
    }

    fn get_note_with_author(&self, id: NoteId) -> RepoResult<Option<NoteWithAuthor>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                notes.id,
                notes.owner_id,
                notes.title,
                notes.description,
                notes.tag,
                notes.is_deleted,
                notes.created_at,
                notes.updated_at,
                accounts.user_name AS author_name,
                accounts.email AS author_email
             FROM notes
             INNER JOIN accounts ON accounts.id = notes.owner_id
             WHERE notes.id = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(NoteWithAuthor {
                note: parse_note_row(row)?,
                user_name: row.get("author_name")?,
                email: row.get("author_email")?,
            })),
            None => Ok(None),
        }
    }

    fn save_content(&self, note: &Note, now_ms: i64) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE notes
             SET
                title = ?3,
                description = ?4,
                tag = ?5,
                updated_at = ?6
             WHERE id = ?1
               AND owner_id = ?2;",
            params![
                note.id.to_string(),
                note.owner_id.to_string(),
                note.title.as_str(),
                note.description.as_str(),
                note.tag.as_str(),
                now_ms,
            ],
        )?;
        Ok(changed == 1)
    }

    fn set_state(
        &self,
        owner: AccountId,
        id: NoteId,
        from: NoteState,
        to: NoteState,
        now_ms: i64,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE notes
             SET
                is_deleted = ?4,
                updated_at = ?5
             WHERE id = ?1
               AND owner_id = ?2
               AND is_deleted = ?3;",
            params![
                id.to_string(),
                owner.to_string(),
                stored_flag(from)?,
                stored_flag(to)?,
                now_ms,
            ],
        )?;
        Ok(changed == 1)
    }

    fn purge_note(&self, owner: AccountId, id: NoteId, from: NoteState) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM notes
             WHERE id = ?1
               AND owner_id = ?2
               AND is_deleted = ?3;",
            params![id.to_string(), owner.to_string(), stored_flag(from)?],
        )?;
        Ok(changed == 1)
    }

    fn list_notes(&self, owner: AccountId, state: NoteState) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL}
             WHERE notes.owner_id = ?1
               AND notes.is_deleted = ?2
             ORDER BY notes.created_at ASC, notes.rowid ASC;"
        ))?;
        let mut rows = stmt.query(params![owner.to_string(), stored_flag(state)?])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }
}

/// Maps a live state onto the `is_deleted` column. `Purged` has no row.
fn stored_flag(state: NoteState) -> RepoResult<i64> {
    match state {
        NoteState::Active => Ok(0),
        NoteState::Recycled => Ok(1),
        NoteState::Purged => Err(RepoError::InvalidData(
            "purged notes have no stored representation".to_string(),
        )),
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let id_text: String = row.get("id")?;
    let owner_text: String = row.get("owner_id")?;
    let state = match row.get::<_, i64>("is_deleted")? {
        0 => NoteState::from_is_deleted(false),
        1 => NoteState::from_is_deleted(true),
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_deleted value `{other}` in notes.is_deleted"
            )));
        }
    };

    Ok(Note {
        id: parse_uuid(&id_text, "notes.id")?,
        owner_id: parse_uuid(&owner_text, "notes.owner_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        tag: row.get("tag")?,
        state,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
