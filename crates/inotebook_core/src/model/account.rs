//! Account domain model.
//!
//! # Responsibility
//! - Define the stored account record and its credential-free projection.
//! - Own the session epoch type and its advancement rule.
//! - Validate signup/update input before it reaches storage.
//!
//! # Invariants
//! - `email` is the unique login identifier.
//! - `password_hash` only ever holds a one-way hash.
//! - `Epoch` values are integer milliseconds, compared by exact equality.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of an account.
pub type AccountId = Uuid;

/// Minimum accepted plaintext password length.
pub const MIN_PASSWORD_CHARS: usize = 12;
/// Minimum number of digits in a phone number.
pub const MIN_PHONE_DIGITS: usize = 10;
const MAX_USER_NAME_CHARS: usize = 100;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9]+$").expect("valid phone regex"));

/// Current session generation of an account.
///
/// Every token embeds a snapshot of this value. A token is only accepted
/// while its snapshot equals the account's current epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epoch(i64);

impl Epoch {
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Returns the epoch that replaces `self` when a new session starts at
    /// `now_ms`. The result is always strictly greater than `self`, so two
    /// logins inside one millisecond still produce distinct generations.
    pub fn advanced(self, now_ms: i64) -> Self {
        Self(now_ms.max(self.0.saturating_add(1)))
    }
}

impl Display for Epoch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stored account record, including the credential hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    /// Display name, snapshotted into issued tokens.
    pub user_name: String,
    /// Unique login identifier.
    pub email: String,
    /// PHC-format one-way hash.
    pub password_hash: String,
    pub phone: String,
    pub epoch: Epoch,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Account {
    /// Drops the credential hash, yielding the authenticated principal shape.
    pub fn into_principal(self) -> Principal {
        Principal {
            id: self.id,
            user_name: self.user_name,
            email: self.email,
            phone: self.phone,
            epoch: self.epoch,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Authenticated account as seen by downstream handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: AccountId,
    pub user_name: String,
    pub email: String,
    pub phone: String,
    pub epoch: Epoch,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Validated input for a new account. Holds the hash, never the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub id: AccountId,
    pub user_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub epoch: Epoch,
}

/// Identity fields replaced by a profile update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityUpdate {
    pub user_name: String,
    pub email: String,
    pub phone: String,
}

/// Validation failures for account input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    EmptyUserName,
    UserNameTooLong { max_chars: usize },
    InvalidEmail(String),
    PasswordTooShort { min_chars: usize },
    InvalidPhone(String),
}

impl Display for AccountValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUserName => write!(f, "user name cannot be empty"),
            Self::UserNameTooLong { max_chars } => {
                write!(f, "user name must be at most {max_chars} characters")
            }
            Self::InvalidEmail(value) => write!(f, "invalid email: `{value}`"),
            Self::PasswordTooShort { min_chars } => {
                write!(f, "password must be at least {min_chars} characters")
            }
            Self::InvalidPhone(value) => write!(
                f,
                "invalid phone `{value}`; expected at least {MIN_PHONE_DIGITS} digits"
            ),
        }
    }
}

impl Error for AccountValidationError {}

/// Trims and checks a display name.
pub fn normalize_user_name(value: &str) -> Result<String, AccountValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AccountValidationError::EmptyUserName);
    }
    if trimmed.chars().count() > MAX_USER_NAME_CHARS {
        return Err(AccountValidationError::UserNameTooLong {
            max_chars: MAX_USER_NAME_CHARS,
        });
    }
    Ok(trimmed.to_string())
}

/// Trims and checks an email identifier. Case is preserved.
pub fn normalize_email(value: &str) -> Result<String, AccountValidationError> {
    let trimmed = value.trim();
    if !EMAIL_RE.is_match(trimmed) {
        return Err(AccountValidationError::InvalidEmail(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Trims and checks a phone number.
pub fn normalize_phone(value: &str) -> Result<String, AccountValidationError> {
    let trimmed = value.trim();
    let digits = trimmed.chars().filter(char::is_ascii_digit).count();
    if !PHONE_RE.is_match(trimmed) || digits < MIN_PHONE_DIGITS {
        return Err(AccountValidationError::InvalidPhone(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Checks a plaintext password against the length policy.
pub fn validate_password(value: &str) -> Result<(), AccountValidationError> {
    if value.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AccountValidationError::PasswordTooShort {
            min_chars: MIN_PASSWORD_CHARS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_advance_is_strictly_increasing() {
        let epoch = Epoch::from_millis(1_000);
        assert_eq!(epoch.advanced(5_000), Epoch::from_millis(5_000));
        assert_eq!(epoch.advanced(1_000), Epoch::from_millis(1_001));
        assert_eq!(epoch.advanced(10), Epoch::from_millis(1_001));
    }

    #[test]
    fn epoch_serializes_as_plain_integer() {
        let json = serde_json::to_string(&Epoch::from_millis(1_700_000_000_123)).unwrap();
        assert_eq!(json, "1700000000123");
    }

    #[test]
    fn email_must_look_like_an_address() {
        assert_eq!(normalize_email("  a@x.com ").unwrap(), "a@x.com");
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("a @x.com").is_err());
    }

    #[test]
    fn phone_requires_ten_digits() {
        assert!(normalize_phone("0123456789").is_ok());
        assert!(normalize_phone("+441234567890").is_ok());
        assert!(normalize_phone("12345").is_err());
        assert!(normalize_phone("01234-56789").is_err());
    }

    #[test]
    fn password_policy_counts_characters() {
        assert!(validate_password("longpassword1").is_ok());
        assert_eq!(
            validate_password("short").unwrap_err(),
            AccountValidationError::PasswordTooShort { min_chars: 12 }
        );
    }

    #[test]
    fn principal_drops_password_hash() {
        let account = Account {
            id: AccountId::new_v4(),
            user_name: "Ada".to_string(),
            email: "ada@x.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            phone: "0123456789".to_string(),
            epoch: Epoch::from_millis(7),
            created_at: 1,
            updated_at: 2,
        };
        let json = serde_json::to_string(&account.into_principal()).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"userName\":\"Ada\""));
    }
}
