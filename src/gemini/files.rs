//! Staged upload lifecycle for the Files API.
//!
//! Bytes destined for generation are written to a local temp file, uploaded,
//! and polled until the remote copy leaves its processing state. The
//! resulting [`StagedAsset`] is a scoped lease: releasing it deletes the
//! remote file and removes the local one, and every failure path inside the
//! staging routine releases whatever was acquired before the error escapes.

use crate::gemini::client::GeminiClient;
use crate::gemini::types::{FileState, GeminiError, Part, RemoteFile};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::time::Instant;

const POLL_INITIAL_DELAY: Duration = Duration::from_millis(500);
const POLL_MAX_DELAY: Duration = Duration::from_secs(8);

/// Scoped lease over a local temp file and its uploaded remote counterpart.
///
/// Owned exclusively by the request that staged it. Callers must invoke
/// [`StagedAsset::release`] once generation finishes, on success and failure
/// alike; the remote asset never outlives the request that created it.
#[derive(Debug)]
pub struct StagedAsset<'a> {
    client: &'a GeminiClient,
    temp_file: NamedTempFile,
    remote: RemoteFile,
    content_type: String,
}

impl StagedAsset<'_> {
    /// Build the generation request part referencing this asset.
    pub fn part(&self) -> Part {
        Part::file(self.remote.uri.clone(), self.content_type.clone())
    }

    /// Path of the local temp file backing the upload.
    pub fn temp_path(&self) -> &Path {
        self.temp_file.path()
    }

    /// Delete the remote asset and remove the local temp file.
    ///
    /// Failures are logged and swallowed so that cleanup never masks the
    /// error being propagated by the caller.
    pub async fn release(self) {
        release_parts(self.client, self.temp_file, Some(self.remote)).await;
    }
}

impl GeminiClient {
    /// Upload bytes to the Files API and wait until the remote copy is ready.
    ///
    /// The poll loop backs off exponentially under a hard deadline
    /// (`FILE_POLL_TIMEOUT_SECS`); a deadline hit yields
    /// [`GeminiError::PollTimeout`], and any terminal state other than ACTIVE
    /// yields [`GeminiError::AssetProcessingFailed`] without attempting
    /// generation.
    pub async fn stage_file(
        &self,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<StagedAsset<'_>, GeminiError> {
        if bytes.is_empty() {
            return Err(GeminiError::UploadFailed(
                "no bytes provided for upload".to_string(),
            ));
        }

        let temp_file = write_temp_file(bytes, extension_for_content_type(content_type))?;
        tracing::debug!(
            path = %temp_file.path().display(),
            content_type,
            size = bytes.len(),
            "Staged upload bytes locally"
        );

        let mut remote = match self.upload_file(temp_file.path(), content_type).await {
            Ok(file) => file,
            Err(err) => {
                release_parts(self, temp_file, None).await;
                return Err(err);
            }
        };

        let deadline = Instant::now() + self.poll_timeout;
        let mut delay = POLL_INITIAL_DELAY;
        while remote.state == FileState::Processing {
            if Instant::now() >= deadline {
                let waited_secs = self.poll_timeout.as_secs();
                release_parts(self, temp_file, Some(remote)).await;
                return Err(GeminiError::PollTimeout { waited_secs });
            }
            tracing::debug!(name = %remote.name, "File is still processing");
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(POLL_MAX_DELAY);

            remote = match self.get_file(&remote.name).await {
                Ok(updated) => updated,
                Err(err) => {
                    release_parts(self, temp_file, Some(remote)).await;
                    return Err(err);
                }
            };
        }

        if remote.state != FileState::Active {
            let state = remote.state;
            release_parts(self, temp_file, Some(remote)).await;
            return Err(GeminiError::AssetProcessingFailed { state });
        }

        tracing::debug!(name = %remote.name, uri = %remote.uri, "Remote file ready");
        Ok(StagedAsset {
            client: self,
            temp_file,
            remote,
            content_type: content_type.to_string(),
        })
    }
}

/// Best-effort cleanup of whatever the staging routine has acquired so far.
async fn release_parts(
    client: &GeminiClient,
    temp_file: NamedTempFile,
    remote: Option<RemoteFile>,
) {
    if let Some(remote) = remote {
        if let Err(err) = client.delete_file(&remote.name).await {
            tracing::warn!(name = %remote.name, error = %err, "Failed to delete remote file");
        }
    }
    let path = temp_file.path().display().to_string();
    if let Err(err) = temp_file.close() {
        tracing::warn!(path = %path, error = %err, "Failed to remove local temp file");
    }
}

fn write_temp_file(bytes: &[u8], extension: &str) -> Result<NamedTempFile, GeminiError> {
    let mut temp_file = tempfile::Builder::new()
        .prefix("mosaic-upload-")
        .suffix(&format!(".{extension}"))
        .tempfile()?;
    temp_file.write_all(bytes)?;
    temp_file.flush()?;
    Ok(temp_file)
}

/// Suffix hint for the staged temp file, derived from the declared content type.
fn extension_for_content_type(content_type: &str) -> &'static str {
    match content_type.split(';').next().unwrap_or("").trim() {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/ogg" => "ogg",
        "audio/mp4" | "audio/x-m4a" => "m4a",
        "audio/webm" => "webm",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}
