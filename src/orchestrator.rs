//! The synthesis request pipeline.
//!
//! One call runs the whole flow: ensure the requested model is loaded,
//! resolve the voice, synthesize through the cloning or standard backend,
//! post-process standard output, and publish the result into the history
//! directory. Publication is a rename of a uniquely named scratch file, so
//! a failure anywhere earlier can leak scratch garbage but never a partial
//! history artifact.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::engines::cloned::CloningBackend;
use crate::error::StudioError;
use crate::registry::ModelRegistry;
use crate::transform;
use crate::voice::{ClonedVoices, VoiceIdentity};
use crate::{SynthesisRequest, Waveform};

/// Drives synthesis requests end to end.
pub struct SynthesisOrchestrator {
    registry: Arc<ModelRegistry>,
    clones: Arc<ClonedVoices>,
    cloning: Box<dyn CloningBackend>,
    history_dir: PathBuf,
    scratch_dir: PathBuf,
}

impl SynthesisOrchestrator {
    /// Create an orchestrator rooted at `root`.
    ///
    /// `<root>/history` receives archived artifacts and `<root>/scratch`
    /// holds in-flight files; both are created if absent. Keeping scratch
    /// next to history keeps the publishing rename on one filesystem.
    pub fn new(
        registry: Arc<ModelRegistry>,
        clones: Arc<ClonedVoices>,
        cloning: Box<dyn CloningBackend>,
        root: impl AsRef<Path>,
    ) -> Result<Self, StudioError> {
        let root = root.as_ref();
        let history_dir = root.join("history");
        let scratch_dir = root.join("scratch");
        fs::create_dir_all(&history_dir)?;
        fs::create_dir_all(&scratch_dir)?;
        Ok(Self {
            registry,
            clones,
            cloning,
            history_dir,
            scratch_dir,
        })
    }

    /// Directory holding archived artifacts.
    pub fn history_dir(&self) -> &Path {
        &self.history_dir
    }

    /// Synthesize a request and return the archived artifact's path.
    pub fn synthesize(&self, request: &SynthesisRequest) -> Result<PathBuf, StudioError> {
        let speakers = self.registry.ensure_loaded(request.model)?;
        let identity = self.clones.resolve(&request.voice, &speakers)?;

        let waveform = match &identity {
            VoiceIdentity::Cloned { label, reference } => {
                log::info!("synthesizing with cloned voice {label:?}");
                // Cloned output is published as-is: the cloning backend is
                // expected to carry timbre and prosody itself, so pitch and
                // speed settings apply to standard-model output only.
                self.cloning.synthesize(&request.text, reference)?
            }
            VoiceIdentity::Standard { speaker } => {
                let loaded = self.registry.current();
                let speaker_arg = loaded
                    .handle
                    .is_multi_speaker()
                    .then_some(speaker.as_str());
                let emotion_arg = loaded.handle.is_multi_emotion().then_some(request.emotion);
                log::info!(
                    "synthesizing with {} speaker {speaker:?}",
                    loaded.model_id
                );
                let raw = loaded.handle.synthesize(&request.text, speaker_arg, emotion_arg)?;
                transform::apply(&raw, request.pitch_semitones, request.speed)
            }
        };

        self.archive(&waveform)
    }

    /// Write the waveform to a uniquely named scratch file and rename it
    /// into history. Only the rename publishes a result.
    fn archive(&self, waveform: &Waveform) -> Result<PathBuf, StudioError> {
        let scratch = tempfile::Builder::new()
            .prefix("synth-")
            .suffix(".wav")
            .tempfile_in(&self.scratch_dir)?;
        let scratch_path = scratch.into_temp_path();
        waveform.write_wav(&scratch_path)?;

        let scratch_path = scratch_path.keep().map_err(|e| StudioError::Io(e.error))?;
        let file_name = scratch_path
            .file_name()
            .ok_or_else(|| StudioError::Io(std::io::Error::other("scratch path has no file name")))?
            .to_os_string();
        let history_path = self.history_dir.join(file_name);
        fs::rename(&scratch_path, &history_path)?;

        log::info!(
            "archived {:.2}s of audio to {}",
            waveform.duration_secs(),
            history_path.display()
        );
        Ok(history_path)
    }
}
