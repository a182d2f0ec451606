//! Shared handler state.
//!
//! One SQLite connection behind a mutex. Service calls run on the blocking
//! pool and hold the lock only for the duration of that call.

use crate::error::ApiError;
use inotebook_core::{
    AccountService, Argon2Hasher, CredentialHasher, FsBlobStore, ImageService, NoteService,
    ServiceError, SqliteAccountRepository, SqliteImageRepository, SqliteNoteRepository,
    TokenCodec,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    codec: Arc<TokenCodec>,
    hasher: Arc<dyn CredentialHasher>,
    blobs: Arc<FsBlobStore>,
    max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        conn: Connection,
        codec: TokenCodec,
        hasher: Arc<dyn CredentialHasher>,
        blobs: FsBlobStore,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            codec: Arc::new(codec),
            hasher,
            blobs: Arc::new(blobs),
            max_upload_bytes,
        }
    }

    /// State with the production Argon2id hasher.
    pub fn with_default_hasher(
        conn: Connection,
        codec: TokenCodec,
        blobs: FsBlobStore,
        max_upload_bytes: usize,
    ) -> Self {
        Self::new(
            conn,
            codec,
            Arc::new(Argon2Hasher::default()),
            blobs,
            max_upload_bytes,
        )
    }

    pub fn blobs(&self) -> &FsBlobStore {
        &self.blobs
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    pub fn accounts<'a>(
        &'a self,
        conn: &'a Connection,
    ) -> Result<AccountService<'a, SqliteAccountRepository<'a>>, ServiceError> {
        Ok(AccountService::new(
            SqliteAccountRepository::try_new(conn)?,
            self.codec.as_ref(),
            self.hasher.as_ref(),
        ))
    }

    pub fn notes<'a>(
        &self,
        conn: &'a Connection,
    ) -> Result<NoteService<SqliteNoteRepository<'a>>, ServiceError> {
        Ok(NoteService::new(SqliteNoteRepository::try_new(conn)?))
    }

    pub fn images<'a>(
        &'a self,
        conn: &'a Connection,
    ) -> Result<ImageService<'a, SqliteImageRepository<'a>>, ServiceError> {
        Ok(
            ImageService::new(SqliteImageRepository::try_new(conn)?, self.blobs.as_ref())
                .with_max_bytes(self.max_upload_bytes),
        )
    }

    /// Runs `op` against the locked connection on the blocking pool.
    pub async fn run<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&AppState, &Connection) -> Result<T, ServiceError> + Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || {
            let conn = state
                .db
                .lock()
                .map_err(|_| ServiceError::Storage("database lock poisoned".to_string()))?;
            op(&state, &*conn)
        })
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::from)
    }
}
