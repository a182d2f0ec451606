//! `/api/notes`: note lifecycle for the authenticated caller.

use crate::error::ApiError;
use crate::extract::{AppJson, AppPath, Authenticated};
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::extract::State;
use axum::routing::{delete, get, post, put};
use axum::Router;
use inotebook_core::{AccountId, CreateNoteRequest, NoteEdit, NoteId, NoteState};
use serde::Deserialize;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/addNote", post(add_note))
        .route("/editNote/:id", put(edit_note))
        .route("/deleteNote/:id", put(soft_delete_note))
        .route("/restoreNote/:id", put(restore_note))
        .route("/deletePermanent/:id", delete(purge_note))
        .route("/findNote/:id", get(find_note))
        .route("/fetchAllNotes", get(fetch_all_notes))
        .route("/fetchRecycleBin", get(fetch_recycle_bin))
}

#[derive(Deserialize)]
struct AddNoteBody {
    title: String,
    description: String,
    tag: Option<String>,
}

async fn add_note(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    AppJson(body): AppJson<AddNoteBody>,
) -> Result<ApiResponse, ApiError> {
    let request = CreateNoteRequest {
        title: body.title,
        description: body.description,
        tag: body.tag,
    };
    let note = state
        .run(move |state, conn| state.notes(conn)?.create_note(principal.id, &request))
        .await?;
    ApiResponse::created("Note added successfully").with("note", note)
}

async fn edit_note(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    AppPath(id): AppPath<NoteId>,
    AppJson(edit): AppJson<NoteEdit>,
) -> Result<ApiResponse, ApiError> {
    let note = state
        .run(move |state, conn| state.notes(conn)?.edit_note(principal.id, id, &edit))
        .await?;
    ApiResponse::ok("Note updated successfully").with("note", note)
}

async fn soft_delete_note(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    AppPath(id): AppPath<NoteId>,
) -> Result<ApiResponse, ApiError> {
    state
        .run(move |state, conn| state.notes(conn)?.soft_delete_note(principal.id, id))
        .await?;
    Ok(ApiResponse::ok("Note moved to recycle bin successfully"))
}

async fn restore_note(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    AppPath(id): AppPath<NoteId>,
) -> Result<ApiResponse, ApiError> {
    state
        .run(move |state, conn| state.notes(conn)?.restore_note(principal.id, id))
        .await?;
    Ok(ApiResponse::ok("Note restored successfully"))
}

async fn purge_note(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    AppPath(id): AppPath<NoteId>,
) -> Result<ApiResponse, ApiError> {
    state
        .run(move |state, conn| state.notes(conn)?.purge_note(principal.id, id))
        .await?;
    Ok(ApiResponse::ok("Note deleted permanently"))
}

/// Any authenticated caller may read any note by id.
async fn find_note(
    State(state): State<AppState>,
    Authenticated(_): Authenticated,
    AppPath(id): AppPath<NoteId>,
) -> Result<ApiResponse, ApiError> {
    let note = state
        .run(move |state, conn| state.notes(conn)?.find_note(id))
        .await?;
    ApiResponse::ok("Note found successfully").with("note", note)
}

async fn fetch_all_notes(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
) -> Result<ApiResponse, ApiError> {
    list(state, principal.id, NoteState::Active, "Notes fetched successfully").await
}

async fn fetch_recycle_bin(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
) -> Result<ApiResponse, ApiError> {
    list(
        state,
        principal.id,
        NoteState::Recycled,
        "Recycle bin notes fetched successfully",
    )
    .await
}

async fn list(
    state: AppState,
    owner: AccountId,
    note_state: NoteState,
    message: &'static str,
) -> Result<ApiResponse, ApiError> {
    let notes = state
        .run(move |state, conn| state.notes(conn)?.list_notes(owner, note_state))
        .await?;
    ApiResponse::ok(message).with("notes", notes)
}
