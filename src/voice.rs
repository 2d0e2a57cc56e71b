//! Voice identity resolution.
//!
//! A request's voice field is a single string that may name either a
//! speaker of the selected standard model or a registered cloned voice.
//! Resolution happens once per request, against the speaker list
//! enumerated for that model, and produces an explicit [`VoiceIdentity`]
//! that downstream code dispatches on.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::StudioError;

/// A resolved voice selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceIdentity {
    /// A speaker of the currently loaded standard model.
    Standard { speaker: String },
    /// A registered cloned voice with its reference sample.
    Cloned { label: String, reference: PathBuf },
}

/// Registry of cloned voices: display label to reference sample path.
///
/// Cloned voices are model-independent; their labels appear in the speaker
/// enumeration of every model. The set is fixed at startup.
#[derive(Debug, Default)]
pub struct ClonedVoices {
    voices: BTreeMap<String, PathBuf>,
}

impl ClonedVoices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cloned voice under the given label, replacing any
    /// previous registration of that label.
    pub fn register(&mut self, label: impl Into<String>, reference: impl Into<PathBuf>) {
        self.voices.insert(label.into(), reference.into());
    }

    /// All registered labels, sorted.
    pub fn labels(&self) -> Vec<String> {
        self.voices.keys().cloned().collect()
    }

    /// Reference sample for a label, if registered.
    pub fn reference(&self, label: &str) -> Option<&Path> {
        self.voices.get(label).map(PathBuf::as_path)
    }

    /// Resolve a requested voice against the enumerated speaker list.
    ///
    /// Clone labels take precedence over model speakers of the same name.
    /// Names found in neither are rejected here, before any backend runs.
    pub fn resolve(
        &self,
        voice: &str,
        speakers: &[String],
    ) -> Result<VoiceIdentity, StudioError> {
        if let Some(reference) = self.voices.get(voice) {
            return Ok(VoiceIdentity::Cloned {
                label: voice.to_string(),
                reference: reference.clone(),
            });
        }
        if speakers.iter().any(|s| s == voice) {
            return Ok(VoiceIdentity::Standard {
                speaker: voice.to_string(),
            });
        }
        Err(StudioError::UnknownVoice(voice.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_clones() -> ClonedVoices {
        let mut clones = ClonedVoices::new();
        clones.register("Clone: Laura", "clones/laura.wav");
        clones.register("Clone: Mark", "clones/mark.wav");
        clones
    }

    #[test]
    fn labels_are_sorted() {
        let mut clones = ClonedVoices::new();
        clones.register("Clone: Mark", "clones/mark.wav");
        clones.register("Clone: Laura", "clones/laura.wav");
        assert_eq!(clones.labels(), vec!["Clone: Laura", "Clone: Mark"]);
    }

    #[test]
    fn resolves_clone_label() {
        let clones = sample_clones();
        let speakers = vec!["p225".to_string()];
        let identity = clones
            .resolve("Clone: Laura", &speakers)
            .expect("clone label should resolve");
        assert_eq!(
            identity,
            VoiceIdentity::Cloned {
                label: "Clone: Laura".to_string(),
                reference: PathBuf::from("clones/laura.wav"),
            }
        );
    }

    #[test]
    fn resolves_model_speaker() {
        let clones = sample_clones();
        let speakers = vec!["p225".to_string(), "p226".to_string()];
        let identity = clones
            .resolve("p226", &speakers)
            .expect("model speaker should resolve");
        assert_eq!(
            identity,
            VoiceIdentity::Standard {
                speaker: "p226".to_string()
            }
        );
    }

    #[test]
    fn rejects_unknown_voice() {
        let clones = sample_clones();
        let speakers = vec!["p225".to_string()];
        let err = clones.resolve("nonexistent", &speakers).unwrap_err();
        assert!(matches!(err, StudioError::UnknownVoice(name) if name == "nonexistent"));
    }
}
