//! HTTP client wrapper for the Gemini generative-language API.

use crate::config::get_config;
use crate::gemini::types::{
    Candidate, GeminiError, GenerateContentResponse, Part, RemoteFile, UploadResponse,
};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use serde_json::json;
use std::path::Path;
use std::time::Duration;

/// Lightweight HTTP client for Gemini generation and file operations.
///
/// One configured instance is constructed at process start and shared by all
/// request handlers through the analysis service.
#[derive(Debug)]
pub struct GeminiClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: String,
    pub(crate) model: String,
    pub(crate) poll_timeout: Duration,
}

impl GeminiClient {
    /// Construct a new client using configuration derived from the environment.
    pub fn new() -> Result<Self, GeminiError> {
        let config = get_config();
        let client = Client::builder().user_agent("mosaic/0.1").build()?;

        let base_url =
            normalize_base_url(&config.gemini_base_url).map_err(GeminiError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            model = %config.gemini_model,
            "Initialized Gemini HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            poll_timeout: Duration::from_secs(config.file_poll_timeout_secs),
        })
    }

    /// Ask the configured model to generate text for the given content parts.
    ///
    /// No retry is applied; the first failure propagates to the caller.
    pub async fn generate_content(&self, parts: Vec<Part>) -> Result<String, GeminiError> {
        let body = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": parts,
                }
            ]
        });

        let response = self
            .request(
                Method::POST,
                &format!("v1beta/models/{}:generateContent", self.model),
            )
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(unexpected_status(response, "Gemini generation request failed").await);
        }

        let payload: GenerateContentResponse = response.json().await?;
        let text = collect_candidate_text(payload.candidates);
        if text.trim().is_empty() {
            return Err(GeminiError::GenerationFailed(
                "model returned no text".to_string(),
            ));
        }
        Ok(text)
    }

    /// Upload a staged local file, returning the remote handle in its initial state.
    ///
    /// Uses the Files API resumable protocol: a `start` handshake yields an
    /// upload URL, then a single `upload, finalize` request carries the bytes.
    pub(crate) async fn upload_file(
        &self,
        path: &Path,
        content_type: &str,
    ) -> Result<RemoteFile, GeminiError> {
        let bytes = tokio::fs::read(path).await?;
        let display_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload");

        let mut start_headers = HeaderMap::new();
        start_headers.insert(
            "X-Goog-Upload-Protocol",
            HeaderValue::from_static("resumable"),
        );
        start_headers.insert("X-Goog-Upload-Command", HeaderValue::from_static("start"));
        start_headers.insert(
            "X-Goog-Upload-Header-Content-Length",
            header_value(bytes.len().to_string())?,
        );
        start_headers.insert(
            "X-Goog-Upload-Header-Content-Type",
            header_value(content_type.to_string())?,
        );

        let start = self
            .request(Method::POST, "v1beta/files:upload")
            .headers(start_headers)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;
        if !start.status().is_success() {
            return Err(unexpected_status(start, "Gemini upload start failed").await);
        }
        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                GeminiError::UploadFailed(
                    "upload start response is missing the X-Goog-Upload-URL header".to_string(),
                )
            })?;

        let mut finalize_headers = HeaderMap::new();
        finalize_headers.insert(
            "X-Goog-Upload-Command",
            HeaderValue::from_static("upload, finalize"),
        );
        finalize_headers.insert("X-Goog-Upload-Offset", HeaderValue::from_static("0"));
        finalize_headers.insert(CONTENT_TYPE, header_value(content_type.to_string())?);
        finalize_headers.insert(CONTENT_LENGTH, header_value(bytes.len().to_string())?);

        let finalize = self
            .client
            .post(upload_url)
            .headers(finalize_headers)
            .body(bytes)
            .send()
            .await?;
        if !finalize.status().is_success() {
            return Err(unexpected_status(finalize, "Gemini upload finalize failed").await);
        }

        let payload: UploadResponse = finalize.json().await.map_err(|err| {
            GeminiError::UploadFailed(format!("upload response is missing the file object: {err}"))
        })?;
        tracing::debug!(name = %payload.file.name, state = %payload.file.state, "File uploaded");
        Ok(payload.file)
    }

    /// Fetch the current state of an uploaded file.
    pub(crate) async fn get_file(&self, name: &str) -> Result<RemoteFile, GeminiError> {
        let response = self
            .request(Method::GET, &format!("v1beta/{name}"))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(unexpected_status(response, "Gemini file lookup failed").await);
        }
        Ok(response.json().await?)
    }

    /// Delete an uploaded file from the provider.
    pub(crate) async fn delete_file(&self, name: &str) -> Result<(), GeminiError> {
        let response = self
            .request(Method::DELETE, &format!("v1beta/{name}"))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(unexpected_status(response, "Gemini file deletion failed").await);
        }
        tracing::debug!(name, "Remote file deleted");
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        self.client
            .request(method, url)
            .query(&[("key", self.api_key.as_str())])
    }
}

async fn unexpected_status(response: reqwest::Response, context: &str) -> GeminiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let error = GeminiError::UnexpectedStatus { status, body };
    tracing::error!(error = %error, "{context}");
    error
}

fn header_value(value: String) -> Result<HeaderValue, GeminiError> {
    HeaderValue::from_str(&value).map_err(|err| GeminiError::UploadFailed(err.to_string()))
}

fn collect_candidate_text(candidates: Vec<Candidate>) -> String {
    let Some(candidate) = candidates.into_iter().next() else {
        return String::new();
    };
    candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
