//! HTTP surface for iNotebook.
//!
//! # Responsibility
//! - Map `/api/user`, `/api/notes` and `/api/images` onto core services.
//! - Serve stored uploads under `/uploads`.
//! - Render every outcome in the `{ message, success, ... }` envelope.

pub mod error;
pub mod extract;
pub mod response;
pub mod routes;
pub mod settings;
pub mod state;

use axum::routing::get;
use axum::Router;
use inotebook_core::{
    init_logging, open_db, BlobError, DbError, FsBlobStore, TokenCodec, TokenConfig, TokenError,
};
use log::info;
use settings::{Settings, SettingsError};
use state::AppState;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

pub use error::ApiError;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug)]
pub enum StartupError {
    Settings(SettingsError),
    Logging(String),
    Db(DbError),
    Token(TokenError),
    Blob(BlobError),
    Io(std::io::Error),
}

impl Display for StartupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Settings(err) => write!(f, "settings: {err}"),
            Self::Logging(details) => write!(f, "logging: {details}"),
            Self::Db(err) => write!(f, "database: {err}"),
            Self::Token(err) => write!(f, "token config: {err}"),
            Self::Blob(err) => write!(f, "upload store: {err}"),
            Self::Io(err) => write!(f, "server: {err}"),
        }
    }
}

impl Error for StartupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Settings(err) => Some(err),
            Self::Logging(_) => None,
            Self::Db(err) => Some(err),
            Self::Token(err) => Some(err),
            Self::Blob(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<SettingsError> for StartupError {
    fn from(value: SettingsError) -> Self {
        Self::Settings(value)
    }
}

impl From<DbError> for StartupError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<TokenError> for StartupError {
    fn from(value: TokenError) -> Self {
        Self::Token(value)
    }
}

impl From<BlobError> for StartupError {
    fn from(value: BlobError) -> Self {
        Self::Blob(value)
    }
}

impl From<std::io::Error> for StartupError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Builds the full application router over `state`.
pub fn build_router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.blobs().root());
    Router::new()
        .route("/", get(root))
        .nest("/api/user", routes::user::router())
        .nest("/api/notes", routes::notes::router())
        .nest("/api/images", routes::images::router(state.max_upload_bytes()))
        .nest_service("/uploads", uploads)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "Hello World!"
}

/// Opens storage per `settings` and assembles handler state.
pub fn build_state(settings: &Settings) -> Result<AppState, StartupError> {
    let conn = open_db(&settings.database.path)?;
    let ttl = Duration::from_secs(settings.auth.token_ttl_days.saturating_mul(SECONDS_PER_DAY));
    let codec = TokenCodec::new(TokenConfig::new(settings.auth.secret.as_bytes(), ttl)?);
    let blobs = FsBlobStore::open(&settings.uploads.dir, &settings.uploads.public_base_url)?;
    Ok(AppState::with_default_hasher(
        conn,
        codec,
        blobs,
        settings.uploads.max_bytes,
    ))
}

/// Initializes logging, storage and the listener, then serves until the
/// process is stopped.
pub async fn launch(settings: Settings) -> Result<(), StartupError> {
    init_logging(&settings.logging.level, settings.logging.dir.as_deref())
        .map_err(StartupError::Logging)?;

    let state = build_state(&settings)?;
    let listener = tokio::net::TcpListener::bind(&settings.server.bind).await?;
    info!(
        "event=server_start module=http status=ok bind={} version={}",
        settings.server.bind,
        inotebook_core::core_version()
    );
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
