//! Shared HTTP helpers.

use std::path::Path;

use reqwest::{RequestBuilder, Response};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{AiError, AiResult};

/// Pass successful responses through; turn anything else into [`AiError::Http`].
pub(crate) async fn check_response(response: Response) -> AiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AiError::from_status(status, body))
}

/// Send `request` and stream the body into `dest`, replacing any previous file.
pub(crate) async fn download_to_file(request: RequestBuilder, dest: &Path) -> AiResult<u64> {
    let mut response = check_response(request.send().await?).await?;

    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let mut file = tokio::fs::File::create(dest).await?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    if written == 0 {
        return Err(AiError::invalid_response("downloaded file is empty"));
    }

    debug!(dest = %dest.display(), bytes = written, "Download complete");
    Ok(written)
}
