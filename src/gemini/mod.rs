//! Gemini generative-language API integration.
//!
//! `client` carries the HTTP calls (generation plus the Files API), and
//! `files` the staged upload lifecycle that guarantees cleanup of remote
//! assets and local temp files on every exit path.

mod client;
mod files;
mod types;

pub use client::GeminiClient;
pub use files::StagedAsset;
pub use types::{FileData, FileState, GeminiError, Part};
