//! Session validation against the account's current epoch.
//!
//! # Responsibility
//! - Extract the bearer token from an `Authorization` header value.
//! - Decide authenticity (signature, expiry) and freshness (epoch) of a token.
//!
//! # Invariants
//! - A token is accepted iff it verifies, has not expired, and its epoch
//!   snapshot equals the account's stored epoch exactly.
//! - Validation is read-only; repeating it has no side effects.

use crate::auth::token::{TokenCodec, TokenError};
use crate::model::account::{AccountId, Principal};
use crate::repo::account_repo::AccountRepository;
use crate::repo::RepoError;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

const BEARER_SCHEME: &str = "bearer";

/// Reasons a presented credential is rejected.
#[derive(Debug)]
pub enum AuthError {
    /// No bearer token present.
    NoToken,
    /// Header or token structure unusable, or a required claim is missing.
    Malformed(String),
    InvalidSignature,
    Expired,
    /// Account has started a newer session since this token was issued.
    StaleEpoch,
    AccountNotFound(AccountId),
    /// Account lookup failed for storage reasons.
    Repo(RepoError),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoToken => write!(f, "no token, authorization denied"),
            Self::Malformed(details) => write!(f, "invalid token structure: {details}"),
            Self::InvalidSignature => write!(f, "invalid token"),
            Self::Expired => write!(f, "token expired"),
            Self::StaleEpoch => write!(f, "session superseded by a newer login"),
            Self::AccountNotFound(_) => write!(f, "user not found"),
            Self::Repo(err) => write!(f, "account lookup failed: {err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(value: TokenError) -> Self {
        match value {
            TokenError::InvalidSignature => Self::InvalidSignature,
            TokenError::Expired { .. } => Self::Expired,
            other => Self::Malformed(other.to_string()),
        }
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.map(str::trim).unwrap_or_default();
    if header.is_empty() {
        return Err(AuthError::NoToken);
    }

    let (scheme, token) = header.split_once(' ').unwrap_or((header, ""));
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(AuthError::Malformed(
            "authorization scheme must be Bearer".to_string(),
        ));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::NoToken);
    }
    Ok(token)
}

/// Validates presented tokens against the account store.
pub struct SessionValidator<'a, R: AccountRepository> {
    codec: &'a TokenCodec,
    accounts: &'a R,
}

impl<'a, R: AccountRepository> SessionValidator<'a, R> {
    pub fn new(codec: &'a TokenCodec, accounts: &'a R) -> Self {
        Self { codec, accounts }
    }

    /// Validates the raw `Authorization` header value.
    pub fn validate(&self, authorization: Option<&str>) -> Result<Principal, AuthError> {
        let token = extract_bearer(authorization)?;
        self.validate_token(token)
    }

    /// Validates a bare token.
    pub fn validate_token(&self, token: &str) -> Result<Principal, AuthError> {
        let claims = self.codec.decode(token).map_err(|err| {
            debug!("event=session_validate module=auth status=rejected reason={err}");
            AuthError::from(err)
        })?;

        let account = self
            .accounts
            .find_by_id(claims.sub)
            .map_err(AuthError::Repo)?
            .ok_or_else(|| {
                warn!(
                    "event=session_validate module=auth status=rejected reason=account_not_found account_id={}",
                    claims.sub
                );
                AuthError::AccountNotFound(claims.sub)
            })?;

        if account.epoch != claims.epoch {
            warn!(
                "event=session_validate module=auth status=rejected reason=stale_epoch account_id={} token_epoch={} current_epoch={}",
                account.id, claims.epoch, account.epoch
            );
            return Err(AuthError::StaleEpoch);
        }

        Ok(account.into_principal())
    }
}
