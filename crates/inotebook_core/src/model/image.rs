//! Profile image record.

use crate::model::account::AccountId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a profile image record.
pub type ImageId = Uuid;

/// Content types accepted for profile uploads.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];

/// Upper bound for one uploaded image, in bytes.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Profile image owned by one account. `image_url` points at the stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileImage {
    pub id: ImageId,
    pub owner_id: AccountId,
    pub image_url: String,
    pub created_at: i64,
}
