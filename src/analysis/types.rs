//! Core data types and error definitions for the analysis pipeline.

use crate::extract::ExtractError;
use crate::gemini::GeminiError;
use serde::Serialize;
use thiserror::Error;

/// Errors emitted by the analysis pipeline.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Input could not be turned into text.
    #[error("{0}")]
    Extraction(#[from] ExtractError),
    /// Gemini interaction failed during staging or generation.
    #[error("{0}")]
    Provider(#[from] GeminiError),
}

/// Input accepted by the summarize operation.
#[derive(Debug, Clone)]
pub enum ExtractionSource {
    /// Remote URL whose response body is summarized.
    Url(String),
    /// Raw text supplied by the caller.
    Text(String),
    /// Uploaded document file.
    File(UploadedMedia),
}

impl ExtractionSource {
    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Url(_) => "URL",
            Self::Text(_) => "Text",
            Self::File(_) => "File",
        }
    }
}

/// An uploaded file together with its declared content type.
#[derive(Debug, Clone)]
pub struct UploadedMedia {
    /// Raw bytes received from the multipart field.
    pub bytes: Vec<u8>,
    /// Declared content type, e.g. `image/png`.
    pub content_type: String,
    /// Original file name, when the client provided one.
    pub file_name: Option<String>,
}

/// Aggregate output of the conversation analysis pipeline.
///
/// Immutable once constructed; serialized verbatim as the response body.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationAnalysis {
    /// Plain transcription of the audio.
    pub transcript: String,
    /// Speaker-labeled rendition of the transcript.
    pub diarization: String,
    /// Summary and key points derived from the transcript.
    pub summary: String,
}
