//! Error taxonomy for the studio pipeline.

use crate::ModelId;

/// Errors surfaced by the synthesis pipeline.
///
/// Hard failures bubble to the caller unhandled; the UI layer decides how
/// to present them. Profile lookups are deliberately not represented here:
/// a missing profile loads as defaults instead of failing.
#[derive(thiserror::Error, Debug)]
pub enum StudioError {
    /// Model weights are missing or incompatible. The previously loaded
    /// model remains active.
    #[error("failed to load model {model}: {reason}")]
    ModelLoad { model: ModelId, reason: String },

    /// A synthesis backend failed during inference. No history artifact
    /// is produced.
    #[error("synthesis failed: {0}")]
    Synthesis(String),

    /// The requested voice is neither a speaker of the selected model nor
    /// a registered cloned voice.
    #[error("unknown voice '{0}' for the selected model")]
    UnknownVoice(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV codec error: {0}")]
    Wav(#[from] hound::Error),
}
