//! # tts-studio
//!
//! A Rust library implementing the core of a voice-synthesis studio:
//! standard text-to-speech models, cloned-voice synthesis, post-hoc audio
//! effects, output history, and saved parameter profiles.
//!
//! ## Features
//!
//! - **Model switching**: lazy, lock-guarded reload when the selected model changes
//! - **Voice cloning**: reference-sample conditioned synthesis behind a stable interface
//! - **Audio effects**: pitch shift and time stretch applied to standard-model output
//! - **History**: every synthesis archived as a write-once WAV file
//! - **Profiles**: named parameter presets persisted to disk
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! tts-studio = "2026.8"
//! ```
//!
//! ```ignore
//! use std::sync::Arc;
//! use tts_studio::{
//!     engines::cloned::SilenceStub, orchestrator::SynthesisOrchestrator,
//!     registry::ModelRegistry, voice::ClonedVoices, ModelId, SynthesisRequest,
//! };
//!
//! let mut clones = ClonedVoices::new();
//! clones.register("Clone: Laura", "clones/laura.wav");
//! let clones = Arc::new(clones);
//!
//! let registry = Arc::new(ModelRegistry::new(loader, clones.clone(), ModelId::VitsVctk)?);
//! let studio = SynthesisOrchestrator::new(registry, clones, Box::new(SilenceStub), "studio")?;
//!
//! let request = SynthesisRequest::builder()
//!     .text("Hello, world!")
//!     .voice("p225")
//!     .build()?;
//! let path = studio.synthesize(&request)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod engines;
pub mod error;
pub mod orchestrator;
pub mod profiles;
pub mod registry;
pub mod transform;
pub mod voice;

use std::path::Path;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

pub use error::StudioError;

/// A mono audio buffer with its sample rate.
///
/// All synthesis backends and effects operate on this type; it is written
/// to disk as a 32-bit float WAV file.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Raw audio samples as f32 values
    pub samples: Vec<f32>,
    /// Sample rate of the audio
    pub sample_rate: u32,
}

impl Waveform {
    /// A silent waveform of the given duration.
    pub fn silence(duration_secs: u32, sample_rate: u32) -> Self {
        Self {
            samples: vec![0.0; (duration_secs * sample_rate) as usize],
            sample_rate,
        }
    }

    /// Write the audio to a 32-bit float WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), StudioError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Read a mono WAV file. Accepts 32-bit float and 16-bit int PCM.
    pub fn read_wav(path: &Path) -> Result<Self, StudioError> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let samples = match spec.sample_format {
            hound::SampleFormat::Float => {
                reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?
            }
            hound::SampleFormat::Int => reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
        })
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// The standard text-to-speech models this studio can load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelId {
    /// VITS trained on VCTK (English, multi-speaker).
    #[default]
    VitsVctk,
    /// Jenny (English, single speaker).
    Jenny,
    /// XTTS v2 (multilingual).
    XttsV2,
}

impl ModelId {
    /// Every available model, in UI presentation order.
    pub const ALL: [ModelId; 3] = [ModelId::VitsVctk, ModelId::Jenny, ModelId::XttsV2];

    /// Human-readable label shown in model pickers.
    pub fn label(&self) -> &'static str {
        match self {
            ModelId::VitsVctk => "VITS VCTK (English)",
            ModelId::Jenny => "Jenny (English)",
            ModelId::XttsV2 => "XTTS v2 (Multilingual)",
        }
    }

    /// Directory name under the models root holding this model's files.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ModelId::VitsVctk => "vits-vctk",
            ModelId::Jenny => "jenny",
            ModelId::XttsV2 => "xtts-v2",
        }
    }

    /// Look a model up by its picker label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.label() == label)
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single synthesis request: what to say, with which model and voice,
/// and how to post-process the result.
///
/// Construct through [`SynthesisRequest::builder`]; field ranges are
/// enforced at build time.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SynthesisRequest {
    /// Text to synthesize. Must not be empty.
    pub text: String,
    /// Standard model to synthesize with.
    #[builder(default)]
    pub model: ModelId,
    /// Speaker name of the selected model, or a registered cloned-voice label.
    pub voice: String,
    /// Emotion intensity in `[0, 1]`. Used only by multi-emotion models.
    #[builder(default = "0.5")]
    pub emotion: f32,
    /// Pitch shift in semitones, `[-12, 12]`. Ignored for cloned voices.
    #[builder(default)]
    pub pitch_semitones: i32,
    /// Playback rate in `[0.5, 2.0]`; values above 1.0 speed up. Ignored for cloned voices.
    #[builder(default = "1.0")]
    pub speed: f32,
}

impl SynthesisRequest {
    pub fn builder() -> SynthesisRequestBuilder {
        SynthesisRequestBuilder::default()
    }
}

impl SynthesisRequestBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(text) = &self.text {
            if text.trim().is_empty() {
                return Err("text must not be empty".to_string());
            }
        }
        if let Some(emotion) = self.emotion {
            if !(0.0..=1.0).contains(&emotion) {
                return Err(format!("emotion must be in [0, 1], got {emotion}"));
            }
        }
        if let Some(pitch) = self.pitch_semitones {
            if !(-12..=12).contains(&pitch) {
                return Err(format!("pitch must be in [-12, 12] semitones, got {pitch}"));
            }
        }
        if let Some(speed) = self.speed {
            if !(0.5..=2.0).contains(&speed) {
                return Err(format!("speed must be in [0.5, 2.0], got {speed}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_round_trip() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("tone.wav");

        let wave = Waveform {
            samples: (0..2205).map(|i| (i as f32 * 0.01).sin() * 0.4).collect(),
            sample_rate: 22050,
        };
        wave.write_wav(&path).expect("write should succeed");

        let back = Waveform::read_wav(&path).expect("read should succeed");
        assert_eq!(back.sample_rate, 22050);
        assert_eq!(back.samples, wave.samples);
    }

    #[test]
    fn duration_reflects_sample_count() {
        let wave = Waveform::silence(3, 22050);
        assert_eq!(wave.samples.len(), 66150);
        assert!((wave.duration_secs() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn builder_fills_defaults() {
        let request = SynthesisRequest::builder()
            .text("hello")
            .voice("p225")
            .build()
            .expect("request should build");
        assert_eq!(request.model, ModelId::VitsVctk);
        assert_eq!(request.emotion, 0.5);
        assert_eq!(request.pitch_semitones, 0);
        assert_eq!(request.speed, 1.0);
    }

    #[test]
    fn builder_rejects_out_of_range_fields() {
        assert!(SynthesisRequest::builder()
            .text("  ")
            .voice("p225")
            .build()
            .is_err());
        assert!(SynthesisRequest::builder()
            .text("hi")
            .voice("p225")
            .emotion(1.5)
            .build()
            .is_err());
        assert!(SynthesisRequest::builder()
            .text("hi")
            .voice("p225")
            .pitch_semitones(13)
            .build()
            .is_err());
        assert!(SynthesisRequest::builder()
            .text("hi")
            .voice("p225")
            .speed(0.25)
            .build()
            .is_err());
    }

    #[test]
    fn model_labels_round_trip() {
        for model in ModelId::ALL {
            assert_eq!(ModelId::from_label(model.label()), Some(model));
        }
        assert_eq!(ModelId::from_label("nonexistent"), None);
    }
}
