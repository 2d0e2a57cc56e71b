//! Voice-cloning capability.
//!
//! Cloning conditions synthesis on a short reference recording instead of
//! a trained speaker identity. The only implementation shipped here is
//! [`SilenceStub`], which does **not** run any real inference; it exists
//! so the pipeline around it is complete and testable. Swap in a real
//! backend by implementing [`CloningBackend`] over the actual model once
//! its checkpoints are available.

use std::path::Path;

use crate::error::StudioError;
use crate::Waveform;

/// Output sample rate of the stub backend.
pub const CLONE_SAMPLE_RATE: u32 = 22_050;

/// Fixed duration of the stub's output.
const STUB_DURATION_SECS: u32 = 3;

/// Synthesizes speech in the voice of a reference sample.
pub trait CloningBackend: Send + Sync {
    /// Generate speech for `text` in the voice of the recording at
    /// `reference`.
    fn synthesize(&self, text: &str, reference: &Path) -> Result<Waveform, StudioError>;
}

/// Placeholder cloning backend: returns exactly 3 seconds of silence at
/// 22 050 Hz, ignoring the content of both `text` and `reference`.
///
/// The request is logged so integrations can confirm the call path even
/// though the audio carries no speech.
pub struct SilenceStub;

impl CloningBackend for SilenceStub {
    fn synthesize(&self, text: &str, reference: &Path) -> Result<Waveform, StudioError> {
        log::info!(
            "cloning stub: synthesizing {text:?} with reference {}",
            reference.display()
        );
        Ok(Waveform::silence(STUB_DURATION_SECS, CLONE_SAMPLE_RATE))
    }
}
