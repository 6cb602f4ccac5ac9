//! HTTP surface for Mosaic.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /api/v1/summarize` – Extract text from a URL, raw text, or an
//!   uploaded document (PDF/DOCX/plain text) and return a model-written
//!   summary.
//! - `POST /api/v1/analyze-image` – Upload an image and return the model's
//!   description, optionally steered by a caller-supplied prompt.
//! - `POST /api/v1/analyze-conversation` – Upload an audio recording and
//!   return its transcript, speaker diarization, and summary.
//! - `GET /` – Liveness message.
//! - `GET /metrics` – Request counters for observability dashboards.
//!
//! Validation failures surface as 400 responses and downstream failures as
//! 500 responses, both carrying a `{"detail": …}` body.

use crate::analysis::{AnalysisApi, AnalysisError, ConversationAnalysis, ExtractionSource, UploadedMedia};
use crate::config::get_config;
use crate::extract::ExtractError;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::Field},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Upper bound for uploaded media bodies (50 MiB).
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Build the HTTP router exposing the analysis API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: AnalysisApi + 'static,
{
    Router::new()
        .route("/", get(root))
        .route("/api/v1/summarize", post(summarize::<S>))
        .route("/api/v1/analyze-image", post(analyze_image::<S>))
        .route(
            "/api/v1/analyze-conversation",
            post(analyze_conversation::<S>),
        )
        .route("/metrics", get(get_metrics::<S>))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer())
        .with_state(service)
}

/// CORS layer permitting the configured frontend origin.
fn cors_layer() -> CorsLayer {
    let origin = get_config()
        .frontend_url
        .parse::<HeaderValue>()
        .expect("FRONTEND_URL is not a valid origin");
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Liveness response for `GET /`.
async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Mosaic backend is running" }))
}

/// Success response for the `POST /api/v1/summarize` endpoint.
#[derive(Serialize)]
struct SummarizeResponse {
    summary: String,
}

/// Success response for the `POST /api/v1/analyze-image` endpoint.
#[derive(Serialize)]
struct ImageAnalysisResponse {
    analysis: String,
}

/// Summarize a document, URL, or pasted text.
async fn summarize<S>(
    State(service): State<Arc<S>>,
    multipart: Multipart,
) -> Result<Json<SummarizeResponse>, AppError>
where
    S: AnalysisApi,
{
    let source = SummarizeForm::parse(multipart).await?.into_source()?;
    tracing::info!(input_type = source.kind(), "Received summarization request");

    let summary = service
        .summarize(source)
        .await
        .map_err(|err| AppError::from_analysis(err, "Failed to summarize content"))?;
    Ok(Json(SummarizeResponse { summary }))
}

/// Describe an uploaded image.
async fn analyze_image<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
) -> Result<Json<ImageAnalysisResponse>, AppError>
where
    S: AnalysisApi,
{
    let mut image = None;
    let mut prompt = None;
    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "image" => image = Some(read_media(field).await?),
            "prompt" => prompt = Some(read_text(field).await?),
            _ => {}
        }
    }

    let image = image.ok_or_else(|| AppError::validation("Image file is required"))?;
    if !image.content_type.starts_with("image/") {
        return Err(AppError::validation("File must be an image"));
    }
    tracing::info!(file_name = ?image.file_name, "Received image analysis request");

    let analysis = service
        .analyze_image(image, prompt)
        .await
        .map_err(|err| AppError::from_analysis(err, "Failed to analyze image"))?;
    Ok(Json(ImageAnalysisResponse { analysis }))
}

/// Transcribe, diarize, and summarize an uploaded conversation recording.
async fn analyze_conversation<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
) -> Result<Json<ConversationAnalysis>, AppError>
where
    S: AnalysisApi,
{
    let mut audio = None;
    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or("").to_string();
        if name == "audio" {
            audio = Some(read_media(field).await?);
        }
    }

    let audio = audio.ok_or_else(|| AppError::validation("Audio file is required"))?;
    if !audio.content_type.starts_with("audio/") {
        return Err(AppError::validation("File must be an audio file"));
    }
    tracing::info!(file_name = ?audio.file_name, "Received conversation analysis request");

    let analysis = service
        .analyze_conversation(audio)
        .await
        .map_err(|err| AppError::from_analysis(err, "Failed to analyze conversation"))?;
    Ok(Json(analysis))
}

/// Return a concise metrics snapshot with request counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<crate::metrics::MetricsSnapshot>
where
    S: AnalysisApi,
{
    Json(service.metrics_snapshot())
}

/// Parsed fields of the summarize multipart form.
#[derive(Default)]
struct SummarizeForm {
    input_type: Option<String>,
    url: Option<String>,
    text: Option<String>,
    file: Option<UploadedMedia>,
}

impl SummarizeForm {
    async fn parse(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();
        while let Some(field) = next_field(&mut multipart).await? {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "inputType" => form.input_type = Some(read_text(field).await?),
                "url" => form.url = Some(read_text(field).await?),
                "text" => form.text = Some(read_text(field).await?),
                "file" => form.file = Some(read_media(field).await?),
                _ => {}
            }
        }
        Ok(form)
    }

    /// Resolve the declared input type against the fields that arrived.
    fn into_source(self) -> Result<ExtractionSource, AppError> {
        match self.input_type.as_deref() {
            Some("URL") => self
                .url
                .filter(|value| !value.is_empty())
                .map(ExtractionSource::Url)
                .ok_or_else(|| AppError::validation("URL is required for URL input type")),
            Some("Text") => self
                .text
                .filter(|value| !value.is_empty())
                .map(ExtractionSource::Text)
                .ok_or_else(|| AppError::validation("Text is required for Text input type")),
            Some("File") => self
                .file
                .map(ExtractionSource::File)
                .ok_or_else(|| AppError::validation("File is required for File input type")),
            _ => Err(AppError::validation("Invalid input type")),
        }
    }
}

async fn next_field<'a>(multipart: &'a mut Multipart) -> Result<Option<Field<'a>>, AppError> {
    multipart
        .next_field()
        .await
        .map_err(|err| AppError::validation(format!("Malformed multipart request: {err}")))
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|err| AppError::validation(format!("Malformed multipart field: {err}")))
}

async fn read_media(field: Field<'_>) -> Result<UploadedMedia, AppError> {
    let content_type = field.content_type().unwrap_or("").to_string();
    let file_name = field.file_name().map(str::to_string);
    let bytes = field
        .bytes()
        .await
        .map_err(|err| AppError::validation(format!("Malformed multipart field: {err}")))?;
    Ok(UploadedMedia {
        bytes: bytes.to_vec(),
        content_type,
        file_name,
    })
}

/// Error envelope translated into `{"detail": …}` HTTP responses.
enum AppError {
    /// Caller error: missing/invalid field or wrong content-type family.
    Validation(String),
    /// Downstream failure surfaced with its underlying message.
    Internal(String),
}

impl AppError {
    fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }

    /// Map a pipeline error onto the HTTP taxonomy: extraction problems the
    /// caller can fix become 400s, everything else a 500 with context.
    fn from_analysis(error: AnalysisError, context: &str) -> Self {
        match &error {
            AnalysisError::Extraction(
                ExtractError::UnsupportedFileType(_) | ExtractError::NoExtractableText,
            ) => Self::Validation(error.to_string()),
            _ => Self::Internal(format!("{context}: {error}")),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::Validation(detail) => (StatusCode::BAD_REQUEST, detail),
            Self::Internal(detail) => {
                tracing::error!(detail = %detail, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, detail)
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::create_router;
    use crate::analysis::{
        AnalysisApi, AnalysisError, ConversationAnalysis, ExtractionSource, UploadedMedia,
    };
    use crate::config::{CONFIG, Config};
    use crate::extract::ExtractError;
    use crate::metrics::MetricsSnapshot;
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use std::sync::{Arc, Once};
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    const BOUNDARY: &str = "mosaic-test-boundary";

    #[tokio::test]
    async fn summarize_accepts_raw_text() {
        ensure_test_config();
        let service = Arc::new(StubAnalysisService::new());
        let app = create_router(service.clone());

        let body = multipart_body(&[
            text_part("inputType", "Text"),
            text_part("text", "Hello world"),
        ]);
        let response = post_multipart(app, "/api/v1/summarize", body).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["summary"], "stub summary");

        let calls = service.calls.lock().await;
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            StubCall::Summarize(ExtractionSource::Text(text)) => assert_eq!(text, "Hello world"),
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn summarize_requires_url_for_url_input() {
        ensure_test_config();
        let app = create_router(Arc::new(StubAnalysisService::new()));

        let body = multipart_body(&[text_part("inputType", "URL")]);
        let response = post_multipart(app, "/api/v1/summarize", body).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        let detail = json["detail"].as_str().expect("detail string");
        assert!(detail.contains("URL is required"));
    }

    #[tokio::test]
    async fn summarize_rejects_unknown_input_types() {
        ensure_test_config();
        let app = create_router(Arc::new(StubAnalysisService::new()));

        let body = multipart_body(&[text_part("inputType", "Telepathy")]);
        let response = post_multipart(app, "/api/v1/summarize", body).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["detail"], "Invalid input type");
    }

    #[tokio::test]
    async fn unsupported_file_types_map_to_bad_request() {
        ensure_test_config();
        let service = Arc::new(StubAnalysisService::failing_with_unsupported_type());
        let app = create_router(service);

        let body = multipart_body(&[
            text_part("inputType", "File"),
            file_part("file", "archive.zip", "application/zip", "PK"),
        ]);
        let response = post_multipart(app, "/api/v1/summarize", body).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        let detail = json["detail"].as_str().expect("detail string");
        assert!(detail.contains("Unsupported file type"));
    }

    #[tokio::test]
    async fn provider_failures_map_to_internal_errors() {
        ensure_test_config();
        let service = Arc::new(StubAnalysisService::failing_with_generation_error());
        let app = create_router(service);

        let body = multipart_body(&[
            text_part("inputType", "Text"),
            text_part("text", "Hello world"),
        ]);
        let response = post_multipart(app, "/api/v1/summarize", body).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        let detail = json["detail"].as_str().expect("detail string");
        assert!(detail.contains("Failed to summarize content"));
    }

    #[tokio::test]
    async fn analyze_image_rejects_non_image_uploads() {
        ensure_test_config();
        let app = create_router(Arc::new(StubAnalysisService::new()));

        let body = multipart_body(&[file_part(
            "image",
            "report.pdf",
            "application/pdf",
            "%PDF-1.4",
        )]);
        let response = post_multipart(app, "/api/v1/analyze-image", body).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["detail"], "File must be an image");
    }

    #[tokio::test]
    async fn analyze_image_forwards_caller_prompt() {
        ensure_test_config();
        let service = Arc::new(StubAnalysisService::new());
        let app = create_router(service.clone());

        let body = multipart_body(&[
            file_part("image", "photo.png", "image/png", "png-bytes"),
            text_part("prompt", "What breed is this dog?"),
        ]);
        let response = post_multipart(app, "/api/v1/analyze-image", body).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["analysis"], "stub analysis");

        let calls = service.calls.lock().await;
        match &calls[0] {
            StubCall::Image {
                content_type,
                prompt,
            } => {
                assert_eq!(content_type, "image/png");
                assert_eq!(prompt.as_deref(), Some("What breed is this dog?"));
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn analyze_conversation_rejects_non_audio_uploads() {
        ensure_test_config();
        let app = create_router(Arc::new(StubAnalysisService::new()));

        let body = multipart_body(&[file_part("audio", "photo.png", "image/png", "png-bytes")]);
        let response = post_multipart(app, "/api/v1/analyze-conversation", body).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["detail"], "File must be an audio file");
    }

    #[tokio::test]
    async fn analyze_conversation_returns_all_sections() {
        ensure_test_config();
        let app = create_router(Arc::new(StubAnalysisService::new()));

        let body = multipart_body(&[file_part("audio", "call.wav", "audio/wav", "wav-bytes")]);
        let response = post_multipart(app, "/api/v1/analyze-conversation", body).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["transcript"], "stub transcript");
        assert_eq!(json["diarization"], "Speaker 1: stub transcript");
        assert_eq!(json["summary"], "stub conversation summary");
    }

    #[tokio::test]
    async fn root_reports_liveness() {
        ensure_test_config();
        let app = create_router(Arc::new(StubAnalysisService::new()));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(
            json["message"]
                .as_str()
                .expect("message string")
                .contains("running")
        );
    }

    #[tokio::test]
    async fn metrics_route_reports_counters() {
        ensure_test_config();
        let app = create_router(Arc::new(StubAnalysisService::new()));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/metrics")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["summaries_generated"], 0);
    }

    // -- test scaffolding -------------------------------------------------

    #[derive(Debug)]
    enum StubCall {
        Summarize(ExtractionSource),
        Image {
            content_type: String,
            prompt: Option<String>,
        },
        Conversation {
            content_type: String,
        },
    }

    #[derive(Clone, Copy)]
    enum StubMode {
        Succeed,
        UnsupportedType,
        GenerationError,
    }

    struct StubAnalysisService {
        calls: Arc<Mutex<Vec<StubCall>>>,
        mode: StubMode,
    }

    impl StubAnalysisService {
        fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                mode: StubMode::Succeed,
            }
        }

        fn failing_with_unsupported_type() -> Self {
            Self {
                mode: StubMode::UnsupportedType,
                ..Self::new()
            }
        }

        fn failing_with_generation_error() -> Self {
            Self {
                mode: StubMode::GenerationError,
                ..Self::new()
            }
        }

        fn failure(&self) -> Option<AnalysisError> {
            match self.mode {
                StubMode::Succeed => None,
                StubMode::UnsupportedType => Some(
                    ExtractError::UnsupportedFileType("application/zip".to_string()).into(),
                ),
                StubMode::GenerationError => Some(
                    crate::gemini::GeminiError::GenerationFailed("model unavailable".to_string())
                        .into(),
                ),
            }
        }
    }

    #[async_trait]
    impl AnalysisApi for StubAnalysisService {
        async fn summarize(&self, source: ExtractionSource) -> Result<String, AnalysisError> {
            self.calls.lock().await.push(StubCall::Summarize(source));
            match self.failure() {
                Some(error) => Err(error),
                None => Ok("stub summary".to_string()),
            }
        }

        async fn analyze_image(
            &self,
            image: UploadedMedia,
            prompt: Option<String>,
        ) -> Result<String, AnalysisError> {
            self.calls.lock().await.push(StubCall::Image {
                content_type: image.content_type,
                prompt,
            });
            match self.failure() {
                Some(error) => Err(error),
                None => Ok("stub analysis".to_string()),
            }
        }

        async fn analyze_conversation(
            &self,
            audio: UploadedMedia,
        ) -> Result<ConversationAnalysis, AnalysisError> {
            self.calls.lock().await.push(StubCall::Conversation {
                content_type: audio.content_type,
            });
            match self.failure() {
                Some(error) => Err(error),
                None => Ok(ConversationAnalysis {
                    transcript: "stub transcript".to_string(),
                    diarization: "Speaker 1: stub transcript".to_string(),
                    summary: "stub conversation summary".to_string(),
                }),
            }
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                summaries_generated: 0,
                images_analyzed: 0,
                conversations_analyzed: 0,
            }
        }
    }

    fn text_part(name: &str, value: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
    }

    fn file_part(name: &str, file_name: &str, content_type: &str, body: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
             filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n{body}\r\n"
        )
    }

    fn multipart_body(parts: &[String]) -> String {
        format!("{}--{BOUNDARY}--\r\n", parts.concat())
    }

    async fn post_multipart(app: Router, uri: &str, body: String) -> axum::response::Response {
        app.oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .expect("request"),
        )
        .await
        .expect("router response")
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn ensure_test_config() {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            let _ = CONFIG.set(Config {
                gemini_api_key: "test-key".into(),
                gemini_model: "test-model".into(),
                gemini_base_url: "http://127.0.0.1:6333".into(),
                frontend_url: "http://localhost:5173".into(),
                server_port: None,
                file_poll_timeout_secs: 5,
            });
        });
    }
}
