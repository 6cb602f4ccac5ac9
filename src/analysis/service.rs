//! Analysis service coordinating extraction, prompting, and Gemini calls.

use crate::{
    analysis::types::{AnalysisError, ConversationAnalysis, ExtractionSource, UploadedMedia},
    extract::{ContentExtractor, ExtractError},
    gemini::{GeminiClient, Part, StagedAsset},
    metrics::{MetricsSnapshot, RequestMetrics},
    prompts,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Coordinates the full request pipeline: content extraction, prompt
/// composition, remote asset staging, and Gemini generation.
///
/// The service owns long-lived handles to the Gemini client, the extractor,
/// and the metrics registry. Construct it once near process start and share
/// it through an `Arc`.
pub struct AnalysisService {
    gemini: GeminiClient,
    extractor: ContentExtractor,
    metrics: Arc<RequestMetrics>,
}

/// Abstraction over the analysis pipeline used by the HTTP surface.
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    /// Extract text from the source and return a model-written summary.
    async fn summarize(&self, source: ExtractionSource) -> Result<String, AnalysisError>;

    /// Describe an uploaded image, optionally steered by a caller prompt.
    async fn analyze_image(
        &self,
        image: UploadedMedia,
        prompt: Option<String>,
    ) -> Result<String, AnalysisError>;

    /// Transcribe, diarize, and summarize an uploaded conversation recording.
    async fn analyze_conversation(
        &self,
        audio: UploadedMedia,
    ) -> Result<ConversationAnalysis, AnalysisError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl AnalysisService {
    /// Build a new analysis service, initializing the provider clients.
    pub fn new() -> Result<Self, AnalysisError> {
        tracing::info!("Initializing Gemini client");
        let gemini = GeminiClient::new()?;
        let extractor = ContentExtractor::new()?;
        Ok(Self {
            gemini,
            extractor,
            metrics: Arc::new(RequestMetrics::new()),
        })
    }

    async fn extract(&self, source: ExtractionSource) -> Result<String, AnalysisError> {
        let text = match source {
            ExtractionSource::Url(url) => self.extractor.extract_from_url(&url).await?,
            ExtractionSource::Text(text) => {
                if text.trim().is_empty() {
                    return Err(ExtractError::NoExtractableText.into());
                }
                text
            }
            ExtractionSource::File(file) => self
                .extractor
                .extract_from_file(&file.bytes, &file.content_type)?,
        };
        Ok(text)
    }

    /// Transcribe the staged audio, then derive the diarization and the
    /// summary from the transcript. The three generation calls run strictly
    /// in sequence; diarization and summary both consume the transcript text,
    /// not the raw audio and not each other.
    async fn run_conversation_pipeline(
        &self,
        asset: &StagedAsset<'_>,
    ) -> Result<ConversationAnalysis, AnalysisError> {
        let transcript = self
            .gemini
            .generate_content(vec![
                asset.part(),
                Part::text(prompts::TRANSCRIBE_AUDIO_PROMPT),
            ])
            .await?;
        tracing::debug!(length = transcript.len(), "Transcript generated");

        let diarization = self
            .gemini
            .generate_content(vec![Part::text(prompts::diarize_transcript(&transcript))])
            .await?;

        let summary = self
            .gemini
            .generate_content(vec![Part::text(prompts::summarize_conversation(
                &transcript,
            ))])
            .await?;

        Ok(ConversationAnalysis {
            transcript,
            diarization,
            summary,
        })
    }
}

#[async_trait]
impl AnalysisApi for AnalysisService {
    async fn summarize(&self, source: ExtractionSource) -> Result<String, AnalysisError> {
        let text = self.extract(source).await?;
        tracing::debug!(length = text.len(), "Extracted text for summarization");

        let summary = self
            .gemini
            .generate_content(vec![Part::text(prompts::summarize_document(&text))])
            .await?;
        self.metrics.record_summary();
        tracing::info!("Summary generated");
        Ok(summary)
    }

    async fn analyze_image(
        &self,
        image: UploadedMedia,
        prompt: Option<String>,
    ) -> Result<String, AnalysisError> {
        let instruction = prompt
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| prompts::DEFAULT_IMAGE_PROMPT.to_string());

        let asset = self
            .gemini
            .stage_file(&image.bytes, &image.content_type)
            .await?;
        let result = self
            .gemini
            .generate_content(vec![asset.part(), Part::text(instruction)])
            .await;
        asset.release().await;

        let analysis = result?;
        self.metrics.record_image();
        tracing::info!("Image analyzed");
        Ok(analysis)
    }

    async fn analyze_conversation(
        &self,
        audio: UploadedMedia,
    ) -> Result<ConversationAnalysis, AnalysisError> {
        let asset = self
            .gemini
            .stage_file(&audio.bytes, &audio.content_type)
            .await?;
        let outcome = self.run_conversation_pipeline(&asset).await;
        asset.release().await;

        let analysis = outcome?;
        self.metrics.record_conversation();
        tracing::info!("Conversation analyzed");
        Ok(analysis)
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
