//! Flat-file cache store.
//!
//! Each entry is one file `{root}/{key}.{extension}`. Writes go to a unique
//! temporary file in the same directory and are renamed into place, so a
//! reader never observes a half-written entry, concurrent writes of the same
//! key (same payload) are idempotent, and writes to different keys never
//! touch each other's files.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CacheError, CacheResult};

/// What an entry holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// A JSON document
    Json,
    /// UTF-8 text
    Text,
    /// An opaque media file with the given extension (e.g. "mp3", "mp4")
    File(String),
}

impl CacheKind {
    /// Create a file kind for the given extension.
    pub fn file(extension: impl Into<String>) -> Self {
        Self::File(extension.into())
    }

    /// Extension used for the entry on disk.
    pub fn extension(&self) -> &str {
        match self {
            CacheKind::Json => "json",
            CacheKind::Text => "text",
            CacheKind::File(ext) => ext,
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKind::Json => write!(f, "json"),
            CacheKind::Text => write!(f, "text"),
            CacheKind::File(ext) => write!(f, "file({})", ext),
        }
    }
}

/// Entry contents.
#[derive(Debug, Clone, PartialEq)]
pub enum CachePayload {
    Json(serde_json::Value),
    Text(String),
    /// On `put`: the file to copy in. On `get`: the cached file's path.
    File(PathBuf),
}

impl CachePayload {
    fn kind_name(&self) -> &'static str {
        match self {
            CachePayload::Json(_) => "json",
            CachePayload::Text(_) => "text",
            CachePayload::File(_) => "file",
        }
    }
}

/// On-disk cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
    enabled: bool,
}

impl CacheStore {
    /// Open (and create if needed) a cache rooted at `root`.
    pub async fn open(root: impl AsRef<Path>) -> CacheResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        debug!(root = %root.display(), "Cache store opened");
        Ok(Self {
            root,
            enabled: true,
        })
    }

    /// Enable or disable lookups and writes.
    ///
    /// A disabled store always misses and silently drops writes; `clear`
    /// still works.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path an entry lives at.
    pub fn entry_path(&self, key: &str, kind: &CacheKind) -> CacheResult<PathBuf> {
        validate_key(key)?;
        validate_key(kind.extension())?;
        Ok(self.root.join(format!("{}.{}", key, kind.extension())))
    }

    /// Look up an entry.
    ///
    /// Unreadable or corrupt JSON entries are reported as misses.
    pub async fn get(&self, key: &str, kind: &CacheKind) -> CacheResult<Option<CachePayload>> {
        if !self.enabled {
            return Ok(None);
        }

        let path = self.entry_path(key, kind)?;
        if !fs::try_exists(&path).await? {
            debug!(key = %key, kind = %kind, "Cache miss");
            return Ok(None);
        }

        let payload = match kind {
            CacheKind::Json => {
                let raw = fs::read(&path).await?;
                match serde_json::from_slice(&raw) {
                    Ok(value) => CachePayload::Json(value),
                    Err(e) => {
                        warn!(key = %key, error = %e, "Corrupt JSON cache entry, treating as miss");
                        return Ok(None);
                    }
                }
            }
            CacheKind::Text => CachePayload::Text(fs::read_to_string(&path).await?),
            CacheKind::File(_) => CachePayload::File(path),
        };

        debug!(key = %key, kind = %kind, "Cache hit");
        Ok(Some(payload))
    }

    /// Store an entry.
    pub async fn put(&self, key: &str, kind: &CacheKind, payload: &CachePayload) -> CacheResult<()> {
        if !self.enabled {
            return Ok(());
        }

        let path = self.entry_path(key, kind)?;
        match (kind, payload) {
            (CacheKind::Json, CachePayload::Json(value)) => {
                let bytes = serde_json::to_vec(value)?;
                self.write_atomic(&path, &bytes).await?;
            }
            (CacheKind::Text, CachePayload::Text(text)) => {
                self.write_atomic(&path, text.as_bytes()).await?;
            }
            (CacheKind::File(_), CachePayload::File(source)) => {
                self.copy_atomic(source, &path).await?;
            }
            (kind, payload) => {
                return Err(CacheError::kind_mismatch(kind.to_string(), payload.kind_name()));
            }
        }

        debug!(key = %key, kind = %kind, "Cache entry stored");
        Ok(())
    }

    /// Delete every entry.
    pub async fn clear(&self) -> CacheResult<()> {
        if fs::try_exists(&self.root).await? {
            fs::remove_dir_all(&self.root).await?;
        }
        fs::create_dir_all(&self.root).await?;
        info!(root = %self.root.display(), "Cache cleared");
        Ok(())
    }

    /// Typed JSON lookup.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        match self.get(key, &CacheKind::Json).await? {
            Some(CachePayload::Json(value)) => match serde_json::from_value(value) {
                Ok(typed) => Ok(Some(typed)),
                Err(e) => {
                    warn!(key = %key, error = %e, "Cached JSON has unexpected shape, treating as miss");
                    Ok(None)
                }
            },
            _ => Ok(None),
        }
    }

    /// Typed JSON store.
    pub async fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> CacheResult<()> {
        let value = serde_json::to_value(value)?;
        self.put(key, &CacheKind::Json, &CachePayload::Json(value)).await
    }

    pub async fn get_text(&self, key: &str) -> CacheResult<Option<String>> {
        match self.get(key, &CacheKind::Text).await? {
            Some(CachePayload::Text(text)) => Ok(Some(text)),
            _ => Ok(None),
        }
    }

    pub async fn put_text(&self, key: &str, text: &str) -> CacheResult<()> {
        self.put(key, &CacheKind::Text, &CachePayload::Text(text.to_string()))
            .await
    }

    /// Path of a cached file, if present.
    pub async fn get_file(&self, key: &str, extension: &str) -> CacheResult<Option<PathBuf>> {
        match self.get(key, &CacheKind::file(extension)).await? {
            Some(CachePayload::File(path)) => Ok(Some(path)),
            _ => Ok(None),
        }
    }

    /// Copy `source` into the cache.
    pub async fn put_file(&self, key: &str, extension: &str, source: &Path) -> CacheResult<()> {
        self.put(
            key,
            &CacheKind::file(extension),
            &CachePayload::File(source.to_path_buf()),
        )
        .await
    }

    /// Copy a cached file out to `dest`. Returns `false` on a miss.
    pub async fn restore_file(&self, key: &str, extension: &str, dest: &Path) -> CacheResult<bool> {
        let Some(cached) = self.get_file(key, extension).await? else {
            return Ok(false);
        };

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(&cached, dest).await?;
        Ok(true)
    }

    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> CacheResult<()> {
        let tmp = self.temp_path();
        fs::write(&tmp, bytes).await?;
        self.finish_atomic(&tmp, path).await
    }

    async fn copy_atomic(&self, source: &Path, path: &Path) -> CacheResult<()> {
        if !fs::try_exists(source).await? {
            return Err(CacheError::SourceMissing(source.display().to_string()));
        }
        let tmp = self.temp_path();
        fs::copy(source, &tmp).await?;
        self.finish_atomic(&tmp, path).await
    }

    async fn finish_atomic(&self, tmp: &Path, path: &Path) -> CacheResult<()> {
        if let Err(e) = fs::rename(tmp, path).await {
            let _ = fs::remove_file(tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        self.root.join(format!(".{}.tmp", Uuid::new_v4()))
    }
}

/// Keys and extensions become file names; keep them to a safe alphabet.
fn validate_key(key: &str) -> CacheResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CacheError::invalid_key(key))
    }
}
