//! Signed, time-bound session tokens.
//!
//! # Responsibility
//! - Encode a claim set into a compact token signed with HMAC-SHA256.
//! - Decode a token, separating signature failures from malformed input.
//!
//! # Invariants
//! - The signature is verified before the payload is parsed.
//! - A decoded claim set always carries account id, display name and epoch.
//! - The codec holds no state beyond its `TokenConfig`.
//!
//! Wire format: `<hex(JSON claims)>.<hex(HMAC-SHA256(secret, first segment))>`.

use crate::model::account::{AccountId, Epoch};
use crate::model::now_epoch_ms;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::time::Duration;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Default token lifetime: 30 days.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

const SEGMENT_SEPARATOR: char = '.';

/// Token decoding/encoding failures.
#[derive(Debug)]
pub enum TokenError {
    /// Structure, encoding, or claim set is unusable.
    Malformed(String),
    /// MAC does not match the payload.
    InvalidSignature,
    /// `exp` is in the past.
    Expired { expired_at: i64 },
    /// Codec configuration rejected at construction.
    InvalidConfig(&'static str),
    /// Claim serialization failed.
    Encode(serde_json::Error),
}

impl Display for TokenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(details) => write!(f, "malformed token: {details}"),
            Self::InvalidSignature => write!(f, "token signature mismatch"),
            Self::Expired { expired_at } => write!(f, "token expired at {expired_at}"),
            Self::InvalidConfig(details) => write!(f, "invalid token config: {details}"),
            Self::Encode(err) => write!(f, "failed to encode claims: {err}"),
        }
    }
}

impl Error for TokenError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            _ => None,
        }
    }
}

/// Signing configuration, built once at startup.
#[derive(Clone)]
pub struct TokenConfig {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenConfig {
    /// Rejects empty secrets and zero lifetimes.
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Result<Self, TokenError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(TokenError::InvalidConfig("signing secret cannot be empty"));
        }
        if ttl.as_secs() == 0 {
            return Err(TokenError::InvalidConfig("token ttl must be at least one second"));
        }
        Ok(Self { secret, ttl })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Debug for TokenConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Decoded token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id.
    pub sub: AccountId,
    /// Display name at issuance.
    pub name: String,
    /// Account epoch at issuance.
    pub epoch: Epoch,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expiry, Unix seconds.
    pub exp: i64,
}

#[derive(Deserialize)]
struct RawClaims {
    sub: Option<String>,
    name: Option<String>,
    epoch: Option<i64>,
    iat: Option<i64>,
    exp: Option<i64>,
}

impl RawClaims {
    fn into_claims(self) -> Result<Claims, TokenError> {
        let sub = self.sub.ok_or_else(|| missing("sub"))?;
        let sub = Uuid::parse_str(&sub)
            .map_err(|_| TokenError::Malformed(format!("claim `sub` is not a uuid: `{sub}`")))?;
        let name = self
            .name
            .filter(|value| !value.is_empty())
            .ok_or_else(|| missing("name"))?;
        let epoch = self.epoch.ok_or_else(|| missing("epoch"))?;
        let exp = self.exp.ok_or_else(|| missing("exp"))?;

        Ok(Claims {
            sub,
            name,
            epoch: Epoch::from_millis(epoch),
            iat: self.iat.unwrap_or(0),
            exp,
        })
    }
}

fn missing(claim: &str) -> TokenError {
    TokenError::Malformed(format!("missing required claim `{claim}`"))
}

/// Stateless token encoder/decoder.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    config: TokenConfig,
}

impl TokenCodec {
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Issues a token valid for the configured ttl from now.
    pub fn issue(
        &self,
        account_id: AccountId,
        display_name: &str,
        epoch: Epoch,
    ) -> Result<String, TokenError> {
        self.issue_at(account_id, display_name, epoch, now_epoch_secs())
    }

    /// Issues a token as if the current time were `issued_at` (Unix seconds).
    pub fn issue_at(
        &self,
        account_id: AccountId,
        display_name: &str,
        epoch: Epoch,
        issued_at: i64,
    ) -> Result<String, TokenError> {
        let ttl_secs = i64::try_from(self.config.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: account_id,
            name: display_name.to_string(),
            epoch,
            iat: issued_at,
            exp: issued_at.saturating_add(ttl_secs),
        };
        self.encode(&claims)
    }

    /// Signs an explicit claim set.
    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        let payload = serde_json::to_vec(claims).map_err(TokenError::Encode)?;
        let payload_segment = hex::encode(payload);
        let signature = self.sign(payload_segment.as_bytes())?;
        Ok(format!(
            "{payload_segment}{SEGMENT_SEPARATOR}{}",
            hex::encode(signature)
        ))
    }

    /// Verifies and decodes a token against the current time.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_at(token, now_epoch_secs())
    }

    /// Verifies and decodes a token as if the current time were `now` (Unix seconds).
    pub fn decode_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let (payload_segment, signature_segment) = token
            .trim()
            .split_once(SEGMENT_SEPARATOR)
            .ok_or_else(|| TokenError::Malformed("expected two segments".to_string()))?;
        if payload_segment.is_empty()
            || signature_segment.is_empty()
            || signature_segment.contains(SEGMENT_SEPARATOR)
        {
            return Err(TokenError::Malformed("expected two segments".to_string()));
        }

        let signature = hex::decode(signature_segment)
            .map_err(|_| TokenError::Malformed("signature is not hex".to_string()))?;
        let mut mac = self.mac()?;
        mac.update(payload_segment.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let payload = hex::decode(payload_segment)
            .map_err(|_| TokenError::Malformed("payload is not hex".to_string()))?;
        let raw: RawClaims = serde_json::from_slice(&payload)
            .map_err(|err| TokenError::Malformed(format!("payload is not a claim set: {err}")))?;
        let claims = raw.into_claims()?;

        if now >= claims.exp {
            return Err(TokenError::Expired {
                expired_at: claims.exp,
            });
        }

        Ok(claims)
    }

    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, TokenError> {
        let mut mac = self.mac()?;
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(&self.config.secret)
            .map_err(|_| TokenError::InvalidConfig("signing secret has an invalid length"))
    }
}

fn now_epoch_secs() -> i64 {
    now_epoch_ms() / 1000
}
