//! Content extraction: URLs, raw text, and uploaded documents to plain text.
//!
//! PDF and DOCX parsing is delegated to library calls; URL bodies are
//! returned as-is without HTML parsing.

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Declared content type of DOCX uploads.
const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while turning an input source into plain text.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Content type is not one this server can extract text from.
    #[error("Unsupported file type: {0}. Please upload PDF, DOCX, or text files.")]
    UnsupportedFileType(String),
    /// Extraction succeeded but produced only whitespace.
    #[error("Could not extract text from the source")]
    NoExtractableText,
    /// URL fetch failed at the transport layer or returned an error status.
    #[error("Failed to fetch content from URL: {0}")]
    FetchFailed(#[from] reqwest::Error),
    /// PDF parsing failed.
    #[error("Failed to extract text from PDF: {0}")]
    Pdf(String),
    /// DOCX parsing failed.
    #[error("Failed to extract text from DOCX: {0}")]
    Docx(String),
    /// Uploaded text file was not valid UTF-8.
    #[error("Text file is not valid UTF-8")]
    InvalidEncoding,
}

/// Turns URL, raw-text, and uploaded-file sources into plain text suitable
/// for prompting.
pub struct ContentExtractor {
    client: Client,
}

impl ContentExtractor {
    /// Construct an extractor owning its own HTTP client for URL fetches.
    pub fn new() -> Result<Self, ExtractError> {
        let client = Client::builder()
            .user_agent("mosaic/0.1")
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// Fetch a URL and return the raw response body.
    pub async fn extract_from_url(&self, url: &str) -> Result<String, ExtractError> {
        tracing::debug!(url, "Fetching content from URL");
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        non_blank(body)
    }

    /// Extract text from an uploaded file based on its declared content type.
    ///
    /// Unsupported content types are rejected before any parsing is attempted.
    pub fn extract_from_file(
        &self,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, ExtractError> {
        let media_type = content_type.split(';').next().unwrap_or("").trim();
        tracing::debug!(
            content_type = media_type,
            size = bytes.len(),
            "Extracting uploaded file"
        );

        let text = if media_type == "application/pdf" {
            extract_pdf(bytes)?
        } else if media_type == DOCX_CONTENT_TYPE {
            extract_docx(bytes)?
        } else if media_type.starts_with("text/") {
            String::from_utf8(bytes.to_vec()).map_err(|_| ExtractError::InvalidEncoding)?
        } else {
            return Err(ExtractError::UnsupportedFileType(content_type.to_string()));
        };

        non_blank(text)
    }
}

/// Concatenated text of every page in the document.
fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|err| ExtractError::Pdf(err.to_string()))
}

/// Paragraph-by-paragraph text of the document body.
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let document = docx_rs::read_docx(bytes).map_err(|err| ExtractError::Docx(err.to_string()))?;
    let mut text = String::new();
    for child in document.document.children {
        if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
            text.push_str(&paragraph.raw_text());
            text.push('\n');
        }
    }
    Ok(text)
}

fn non_blank(text: String) -> Result<String, ExtractError> {
    if text.trim().is_empty() {
        Err(ExtractError::NoExtractableText)
    } else {
        Ok(text)
    }
}
