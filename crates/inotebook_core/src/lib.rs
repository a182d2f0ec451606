//! Core domain logic for iNotebook.
//! Accounts, sessions, notes and profile images live here; transports only
//! translate requests into these services.

pub mod auth;
pub mod blob;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use auth::password::{Argon2Hasher, CredentialHasher, HashError};
pub use auth::session::{extract_bearer, AuthError, SessionValidator};
pub use auth::token::{Claims, TokenCodec, TokenConfig, TokenError, DEFAULT_TOKEN_TTL};
pub use blob::{BlobError, BlobStore, FsBlobStore, StoredBlob};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use error::{ErrorCode, ServiceError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::account::{Account, AccountId, Epoch, Principal};
pub use model::image::{ImageId, ProfileImage};
pub use model::note::{
    Note, NoteEdit, NoteId, NoteState, NoteTransition, NoteWithAuthor, DEFAULT_TAG,
};
pub use repo::account_repo::{AccountDeletion, AccountRepository, SqliteAccountRepository};
pub use repo::image_repo::{ImageRepository, SqliteImageRepository};
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::{RepoError, RepoResult};
pub use service::account_service::{
    AccountService, IssuedSession, ResetPasswordRequest, SignupRequest, UpdateDetailsRequest,
};
pub use service::image_service::{ImageService, ImageUpload};
pub use service::note_service::{CreateNoteRequest, NoteService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
