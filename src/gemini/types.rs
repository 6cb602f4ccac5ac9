//! Shared types used by the Gemini client and helpers.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned while interacting with the Gemini API.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid Gemini base URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Local staging of upload bytes failed.
    #[error("Failed to stage upload bytes locally: {0}")]
    Io(#[from] std::io::Error),
    /// Gemini responded with an unexpected status code.
    #[error("Unexpected Gemini response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from Gemini.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Upload handshake did not produce a usable remote file handle.
    #[error("File upload failed: {0}")]
    UploadFailed(String),
    /// Remote processing finished in a state other than ACTIVE.
    #[error("File processing failed: file entered state {state}")]
    AssetProcessingFailed {
        /// Terminal state reported by the provider.
        state: FileState,
    },
    /// Remote processing did not finish before the configured deadline.
    #[error("File processing timed out after {waited_secs}s")]
    PollTimeout {
        /// Seconds waited before giving up.
        waited_secs: u64,
    },
    /// Generation returned no usable text.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Lifecycle states reported by the Gemini Files API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    /// The file is still being processed by the provider.
    Processing,
    /// The file is ready for use in generation requests.
    Active,
    /// The provider failed to process the file.
    Failed,
    /// Any state this client does not recognize.
    #[default]
    #[serde(other)]
    Unspecified,
}

impl std::fmt::Display for FileState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Processing => "PROCESSING",
            Self::Active => "ACTIVE",
            Self::Failed => "FAILED",
            Self::Unspecified => "STATE_UNSPECIFIED",
        };
        f.write_str(name)
    }
}

/// Handle to a file object held by the Gemini Files API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    /// Provider-issued resource name, e.g. `files/abc123`.
    pub name: String,
    /// URI referenced from generation requests.
    pub uri: String,
    /// Current processing state.
    #[serde(default)]
    pub state: FileState,
}

/// One content part of a generation request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Part {
    /// Plain prompt text.
    Text(String),
    /// Reference to an uploaded file.
    FileData(FileData),
}

impl Part {
    /// Build a text part.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Build a part referencing an uploaded file.
    pub fn file(uri: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::FileData(FileData {
            file_uri: uri.into(),
            mime_type: mime_type.into(),
        })
    }
}

/// Remote file reference attached to a generation request.
#[derive(Debug, Clone, Serialize)]
pub struct FileData {
    /// URI of the uploaded file.
    pub file_uri: String,
    /// Declared MIME type of the uploaded file.
    pub mime_type: String,
}

#[derive(Deserialize)]
pub(crate) struct UploadResponse {
    pub(crate) file: RemoteFile,
}

#[derive(Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub(crate) candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
pub(crate) struct Candidate {
    #[serde(default)]
    pub(crate) content: Option<CandidateContent>,
}

#[derive(Deserialize)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    pub(crate) parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
pub(crate) struct ResponsePart {
    #[serde(default)]
    pub(crate) text: Option<String>,
}
