//! Blob storage for uploaded profile images.
//!
//! # Responsibility
//! - Store uploaded bytes under a generated, collision-free key.
//! - Hand back a public URL and remove blobs by that URL.
//!
//! # Invariants
//! - Keys never contain path separators or `..`; removal refuses such URLs.
//! - Files are created with `create_new`, so an existing blob is never overwritten.

use crate::model::now_epoch_ms;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const FALLBACK_FILE_NAME: &str = "image";
const MAX_FILE_NAME_CHARS: usize = 64;

/// Blob storage failures.
#[derive(Debug)]
pub enum BlobError {
    Io { path: PathBuf, source: std::io::Error },
    InvalidKey(String),
}

impl Display for BlobError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "blob io failed at `{}`: {source}", path.display()),
            Self::InvalidKey(key) => write!(f, "invalid blob key `{key}`"),
        }
    }
}

impl Error for BlobError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidKey(_) => None,
        }
    }
}

/// Location of a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub key: String,
    pub url: String,
}

/// Content-addressable blob store with a URL accessor.
pub trait BlobStore: Send + Sync {
    fn put(&self, original_name: &str, bytes: &[u8]) -> Result<StoredBlob, BlobError>;
    fn remove(&self, url: &str) -> Result<(), BlobError>;
}

/// Stores blobs as files in one directory, served under `public_base_url`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsBlobStore {
    /// Creates the root directory when missing.
    pub fn open(root: impl AsRef<Path>, public_base_url: &str) -> Result<Self, BlobError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|source| BlobError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base_url)
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, original_name: &str, bytes: &[u8]) -> Result<StoredBlob, BlobError> {
        let suffix = Uuid::new_v4().simple().to_string();
        let key = format!(
            "{}_{}_{}",
            now_epoch_ms(),
            &suffix[..8],
            sanitize_file_name(original_name)
        );
        let path = self.root.join(&key);

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(source) => {
                error!("event=blob_put module=blob status=error key={key} error={source}");
                return Err(BlobError::Io { path, source });
            }
        };
        if let Err(source) = file.write_all(bytes).and_then(|()| file.sync_all()) {
            error!("event=blob_put module=blob status=error key={key} error={source}");
            drop(file);
            // Only a file this call created is removed.
            discard_partial(&path, &key);
            return Err(BlobError::Io { path, source });
        }

        info!(
            "event=blob_put module=blob status=ok key={key} bytes={}",
            bytes.len()
        );
        Ok(StoredBlob {
            url: self.url_for(&key),
            key,
        })
    }

    fn remove(&self, url: &str) -> Result<(), BlobError> {
        let key = url.rsplit('/').next().unwrap_or_default();
        if !is_safe_key(key) {
            return Err(BlobError::InvalidKey(key.to_string()));
        }

        let path = self.root.join(key);
        std::fs::remove_file(&path).map_err(|source| {
            error!("event=blob_remove module=blob status=error key={key} error={source}");
            BlobError::Io { path, source }
        })?;
        info!("event=blob_remove module=blob status=ok key={key}");
        Ok(())
    }
}

/// Keeps `[A-Za-z0-9._-]`, replaces everything else with `_`, and caps length.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        return FALLBACK_FILE_NAME.to_string();
    }
    let start = trimmed.chars().count().saturating_sub(MAX_FILE_NAME_CHARS);
    trimmed.chars().skip(start).collect()
}

/// Removes a half-written upload. Returns whether the file is gone.
fn discard_partial(path: &Path, key: &str) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => true,
        Err(err) => {
            warn!("event=blob_put_cleanup module=blob status=error key={key} error={err}");
            false
        }
    }
}

fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && key != "."
        && !key.contains("..")
        && !key.contains(['/', '\\'])
}
