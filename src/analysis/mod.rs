//! Request orchestration: extraction, asset staging, prompting, and generation.

mod service;
mod types;

pub use service::{AnalysisApi, AnalysisService};
pub use types::{AnalysisError, ConversationAnalysis, ExtractionSource, UploadedMedia};
