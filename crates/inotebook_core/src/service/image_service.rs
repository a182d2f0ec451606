//! Profile image use-case service.
//!
//! # Invariants
//! - Only JPEG/PNG uploads up to the configured size (`MAX_IMAGE_BYTES` by
//!   default) are stored.
//! - A record is only deleted after its blob was removed; a blob failure
//!   aborts the delete and leaves both in place.

use crate::blob::BlobStore;
use crate::error::ServiceError;
use crate::model::account::AccountId;
use crate::model::image::{ImageId, ProfileImage, ALLOWED_IMAGE_TYPES, MAX_IMAGE_BYTES};
use crate::model::now_epoch_ms;
use crate::repo::image_repo::ImageRepository;
use log::{error, info};
use uuid::Uuid;

/// One uploaded file as received from the transport layer.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Use-case service over image records and blob storage.
pub struct ImageService<'a, R: ImageRepository> {
    repo: R,
    blobs: &'a dyn BlobStore,
    max_bytes: usize,
}

impl<'a, R: ImageRepository> ImageService<'a, R> {
    pub fn new(repo: R, blobs: &'a dyn BlobStore) -> Self {
        Self {
            repo,
            blobs,
            max_bytes: MAX_IMAGE_BYTES,
        }
    }

    /// Caps accepted uploads at `max_bytes`, never above `MAX_IMAGE_BYTES`.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes.min(MAX_IMAGE_BYTES);
        self
    }

    /// Stores the blob, then records it for `owner`.
    pub fn upload(
        &self,
        owner: AccountId,
        upload: &ImageUpload,
    ) -> Result<ProfileImage, ServiceError> {
        let content_type = upload.content_type.trim().to_ascii_lowercase();
        if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
            return Err(ServiceError::Validation(
                "Invalid file type. Only JPEG and PNG are allowed.".to_string(),
            ));
        }
        if upload.bytes.is_empty() {
            return Err(ServiceError::Validation("No file uploaded".to_string()));
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(ServiceError::PayloadTooLarge {
                limit_bytes: self.max_bytes,
            });
        }

        let blob = self.blobs.put(&upload.file_name, &upload.bytes)?;
        let image = ProfileImage {
            id: Uuid::new_v4(),
            owner_id: owner,
            image_url: blob.url,
            created_at: now_epoch_ms(),
        };

        if let Err(err) = self.repo.insert_image(&image) {
            error!(
                "event=image_upload module=image status=error owner_id={owner} error={err}"
            );
            if let Err(cleanup) = self.blobs.remove(&image.image_url) {
                error!(
                    "event=image_upload module=image status=error stage=cleanup key={} error={cleanup}",
                    blob.key
                );
            }
            return Err(err.into());
        }

        info!(
            "event=image_upload module=image status=ok image_id={} owner_id={owner} bytes={}",
            image.id,
            upload.bytes.len()
        );
        Ok(image)
    }

    /// Removes the blob, then the record. Images of other owners are not found.
    pub fn delete(&self, owner: AccountId, id: ImageId) -> Result<(), ServiceError> {
        let image = self
            .repo
            .find_owned_image(owner, id)?
            .ok_or(ServiceError::NotFound("image"))?;

        self.blobs.remove(&image.image_url)?;
        self.repo.delete_image(image.id)?;
        info!("event=image_delete module=image status=ok image_id={id} owner_id={owner}");
        Ok(())
    }

    /// Lists every image record of `owner`, oldest first.
    pub fn list(&self, owner: AccountId) -> Result<Vec<ProfileImage>, ServiceError> {
        Ok(self.repo.list_images_for_owner(owner)?)
    }

    /// Removes blobs whose records are already gone. Failures are logged and
    /// skipped; returns how many blobs were removed.
    pub fn discard_blobs(&self, images: &[ProfileImage]) -> usize {
        images
            .iter()
            .filter(|image| match self.blobs.remove(&image.image_url) {
                Ok(()) => true,
                Err(err) => {
                    error!(
                        "event=image_discard module=image status=error image_id={} error={err}",
                        image.id
                    );
                    false
                }
            })
            .count()
    }

    /// Returns the owner's profile image.
    pub fn fetch(&self, owner: AccountId) -> Result<ProfileImage, ServiceError> {
        self.repo
            .first_image_for_owner(owner)?
            .ok_or(ServiceError::NotFound("image"))
    }
}
