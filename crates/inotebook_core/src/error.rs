//! Use-case error taxonomy shared by all services.
//!
//! # Responsibility
//! - Collapse layer-specific errors into the stable `ErrorCode` set that
//!   callers branch on.
//! - Keep storage detail out of caller-facing messages.

use crate::auth::password::HashError;
use crate::auth::session::AuthError;
use crate::auth::token::TokenError;
use crate::blob::BlobError;
use crate::model::account::AccountValidationError;
use crate::model::note::IllegalTransition;
use crate::repo::RepoError;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable, caller-visible failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    AuthMissing,
    AuthMalformed,
    AuthInvalidSignature,
    AuthExpired,
    AuthStaleEpoch,
    AuthAccountNotFound,
    Validation,
    NotFound,
    Conflict,
    CredentialMismatch,
    InvalidTransition,
    PayloadTooLarge,
    StorageFailure,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthMissing => "AUTH_MISSING",
            Self::AuthMalformed => "AUTH_MALFORMED",
            Self::AuthInvalidSignature => "AUTH_INVALID_SIGNATURE",
            Self::AuthExpired => "AUTH_EXPIRED",
            Self::AuthStaleEpoch => "AUTH_STALE_EPOCH",
            Self::AuthAccountNotFound => "AUTH_ACCOUNT_NOT_FOUND",
            Self::Validation => "VALIDATION",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::CredentialMismatch => "CREDENTIAL_MISMATCH",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::StorageFailure => "STORAGE_FAILURE",
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service error for every account, note and image use-case.
#[derive(Debug)]
pub enum ServiceError {
    Auth(AuthError),
    Validation(String),
    /// Names what was missing (`"note"`, `"account"`, ...).
    NotFound(&'static str),
    Conflict(String),
    CredentialMismatch,
    InvalidTransition(IllegalTransition),
    PayloadTooLarge { limit_bytes: usize },
    /// Internal detail; never shown to callers.
    Storage(String),
}

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Auth(err) => match err {
                AuthError::NoToken => ErrorCode::AuthMissing,
                AuthError::Malformed(_) => ErrorCode::AuthMalformed,
                AuthError::InvalidSignature => ErrorCode::AuthInvalidSignature,
                AuthError::Expired => ErrorCode::AuthExpired,
                AuthError::StaleEpoch => ErrorCode::AuthStaleEpoch,
                AuthError::AccountNotFound(_) => ErrorCode::AuthAccountNotFound,
                AuthError::Repo(_) => ErrorCode::StorageFailure,
            },
            Self::Validation(_) => ErrorCode::Validation,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Conflict(_) => ErrorCode::Conflict,
            Self::CredentialMismatch => ErrorCode::CredentialMismatch,
            Self::InvalidTransition(_) => ErrorCode::InvalidTransition,
            Self::PayloadTooLarge { .. } => ErrorCode::PayloadTooLarge,
            Self::Storage(_) => ErrorCode::StorageFailure,
        }
    }

    /// Message safe to return to callers.
    pub fn public_message(&self) -> String {
        match self {
            Self::Auth(AuthError::Repo(_)) | Self::Storage(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth(err) => write!(f, "{err}"),
            Self::Validation(details) => write!(f, "{details}"),
            Self::NotFound(what) => write!(f, "{what} not found"),
            Self::Conflict(details) => write!(f, "{details}"),
            Self::CredentialMismatch => write!(f, "invalid credentials"),
            Self::InvalidTransition(err) => write!(f, "{err}"),
            Self::PayloadTooLarge { limit_bytes } => {
                write!(f, "payload exceeds {limit_bytes} bytes")
            }
            Self::Storage(details) => write!(f, "storage failure: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Auth(err) => Some(err),
            Self::InvalidTransition(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Duplicate(column) => Self::Conflict(format!("{column} already in use")),
            RepoError::NotFound(_) => Self::NotFound("record"),
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<AccountValidationError> for ServiceError {
    fn from(value: AccountValidationError) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<IllegalTransition> for ServiceError {
    fn from(value: IllegalTransition) -> Self {
        Self::InvalidTransition(value)
    }
}

impl From<HashError> for ServiceError {
    fn from(value: HashError) -> Self {
        Self::Storage(value.to_string())
    }
}

impl From<TokenError> for ServiceError {
    fn from(value: TokenError) -> Self {
        Self::Storage(value.to_string())
    }
}

impl From<BlobError> for ServiceError {
    fn from(value: BlobError) -> Self {
        Self::Storage(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn storage_detail_is_hidden_from_callers() {
        let err = ServiceError::from(RepoError::InvalidData("secret column".to_string()));
        assert_eq!(err.code(), ErrorCode::StorageFailure);
        assert!(!err.public_message().contains("secret"));
    }

    #[test]
    fn duplicate_maps_to_conflict() {
        let err = ServiceError::from(RepoError::Duplicate("email"));
        assert_eq!(err.code(), ErrorCode::Conflict);
        assert_eq!(err.public_message(), "email already in use");
    }

    #[test]
    fn repo_not_found_maps_to_not_found() {
        let err = ServiceError::from(RepoError::NotFound(Uuid::nil()));
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn auth_errors_keep_their_codes() {
        assert_eq!(
            ServiceError::from(AuthError::StaleEpoch).code(),
            ErrorCode::AuthStaleEpoch
        );
        assert_eq!(ServiceError::from(AuthError::NoToken).code(), ErrorCode::AuthMissing);
        assert_eq!(ErrorCode::AuthStaleEpoch.to_string(), "AUTH_STALE_EPOCH");
    }
}
