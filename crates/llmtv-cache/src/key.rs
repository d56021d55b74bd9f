//! Cache key derivation.
//!
//! Keys are SHA-256 hex digests of a canonical JSON document
//! `{"namespace": ..., "params": ...}`. `serde_json` objects are sorted
//! maps, so the same parameters always hash to the same key.

use std::path::Path;

use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::error::CacheResult;

/// Generate a cache key for a call in `namespace` with the given parameters.
///
/// ```ignore
/// let key = cache_key("lyrics", &(prompt, model))?;
/// ```
pub fn cache_key<P: Serialize + ?Sized>(namespace: &str, params: &P) -> CacheResult<String> {
    let document = json!({
        "namespace": namespace,
        "params": serde_json::to_value(params)?,
    });
    let canonical = serde_json::to_string(&document)?;
    Ok(hash_bytes(canonical.as_bytes()))
}

/// SHA-256 hex digest of raw bytes.
pub fn hash_bytes(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// SHA-256 hex digest of a file's contents.
///
/// Used to key results derived from large local inputs (e.g. the audio
/// track handed to transcription).
pub async fn hash_file(path: impl AsRef<Path>) -> CacheResult<String> {
    let data = tokio::fs::read(path).await?;
    Ok(hash_bytes(&data))
}
