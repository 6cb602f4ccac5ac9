#![deny(missing_docs)]

//! Core library for the Mosaic analysis backend.

/// Request orchestration: extraction, staging, prompting, and generation.
pub mod analysis;
/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Content extraction for URLs and uploaded documents.
pub mod extract;
/// Gemini API client and remote file lifecycle.
pub mod gemini;
/// Structured logging and tracing setup.
pub mod logging;
/// Request metrics helpers.
pub mod metrics;
/// Prompt templates for the supported analysis tasks.
pub mod prompts;
