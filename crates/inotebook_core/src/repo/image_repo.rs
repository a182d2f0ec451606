//! Profile image repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `image_url` is unique; several images per owner are allowed by storage.
//! - The owner's image is the earliest stored one.

use crate::model::account::AccountId;
use crate::model::image::{ImageId, ProfileImage};
use crate::repo::{ensure_tables, map_unique_violation, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

/// Repository interface for profile image records.
pub trait ImageRepository {
    fn insert_image(&self, image: &ProfileImage) -> RepoResult<()>;
    fn find_owned_image(&self, owner: AccountId, id: ImageId) -> RepoResult<Option<ProfileImage>>;
    fn first_image_for_owner(&self, owner: AccountId) -> RepoResult<Option<ProfileImage>>;
    fn list_images_for_owner(&self, owner: AccountId) -> RepoResult<Vec<ProfileImage>>;
    fn delete_image(&self, id: ImageId) -> RepoResult<()>;
}

/// SQLite-backed image repository.
pub struct SqliteImageRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteImageRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["profile_images"])?;
        Ok(Self { conn })
    }
}

impl ImageRepository for SqliteImageRepository<'_> {
    fn insert_image(&self, image: &ProfileImage) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO profile_images (id, owner_id, image_url, created_at)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    image.id.to_string(),
                    image.owner_id.to_string(),
                    image.image_url.as_str(),
                    image.created_at,
                ],
            )
            .map_err(|err| map_unique_violation(err, "image_url"))?;
        Ok(())
    }

    fn find_owned_image(&self, owner: AccountId, id: ImageId) -> RepoResult<Option<ProfileImage>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, image_url, created_at
             FROM profile_images
             WHERE id = ?1 AND owner_id = ?2;",
        )?;
        let mut rows = stmt.query(params![id.to_string(), owner.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_image_row(row)?)),
            None => Ok(None),
        }
    }

    fn first_image_for_owner(&self, owner: AccountId) -> RepoResult<Option<ProfileImage>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, image_url, created_at
             FROM profile_images
             WHERE owner_id = ?1
             ORDER BY created_at ASC, rowid ASC
             LIMIT 1;",
        )?;
        let mut rows = stmt.query([owner.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_image_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_images_for_owner(&self, owner: AccountId) -> RepoResult<Vec<ProfileImage>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, image_url, created_at
             FROM profile_images
             WHERE owner_id = ?1
             ORDER BY created_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([owner.to_string()])?;
        let mut images = Vec::new();
        while let Some(row) = rows.next()? {
            images.push(parse_image_row(row)?);
        }
        Ok(images)
    }

    fn delete_image(&self, id: ImageId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM profile_images WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_image_row(row: &Row<'_>) -> RepoResult<ProfileImage> {
    let id_text: String = row.get("id")?;
    let owner_text: String = row.get("owner_id")?;
    Ok(ProfileImage {
        id: parse_uuid(&id_text, "profile_images.id")?,
        owner_id: parse_uuid(&owner_text, "profile_images.owner_id")?,
        image_url: row.get("image_url")?,
        created_at: row.get("created_at")?,
    })
}
