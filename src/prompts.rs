//! Prompt templates for the supported analysis tasks.
//!
//! Pure string builders; inputs are interpolated without validation.

/// Default instruction used when an image analysis request carries no prompt.
pub const DEFAULT_IMAGE_PROMPT: &str = "Analyze this image and describe what you see in detail.";

/// Instruction for transcribing an uploaded audio recording.
pub const TRANSCRIBE_AUDIO_PROMPT: &str =
    "Please transcribe this audio file. Provide a clean, accurate transcription of all speech content.";

/// Build the prompt asking for a concise summary of extracted document text.
pub fn summarize_document(text: &str) -> String {
    format!(
        "Please provide a concise and informative summary of the following text. \
         Focus on the main points and key insights:\n\n{text}"
    )
}

/// Build the diarization prompt for a finished transcript.
///
/// Assumes at most two speakers; the single-speaker fallback is delegated to
/// the model rather than enforced locally.
pub fn diarize_transcript(transcript: &str) -> String {
    format!(
        "Based on this transcript: \"{transcript}\"\n\n\
         Please provide a speaker-diarized version assuming up to 2 speakers \
         (Speaker 1 and Speaker 2). Analyze voice changes, conversation patterns, \
         and context to identify when different speakers are talking. \
         Format the output as:\n\n\
         Speaker 1: [text]\n\
         Speaker 2: [text]\n\
         Speaker 1: [text]\n\
         etc.\n\n\
         If you can only detect one speaker, label everything as \"Speaker 1\"."
    )
}

/// Build the conversation summary prompt for a finished transcript.
pub fn summarize_conversation(transcript: &str) -> String {
    format!(
        "Based on this conversation transcript: \"{transcript}\"\n\n\
         Please provide:\n\
         1. A concise summary of the conversation\n\
         2. Key topics discussed\n\
         3. Main points from each speaker\n\
         4. Any action items or decisions made"
    )
}
