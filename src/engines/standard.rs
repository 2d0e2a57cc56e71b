//! Standard text-to-speech model capability.
//!
//! A loaded model is a read-only handle behind the [`StandardModel`]
//! trait. Capability differences between models (speaker roster, emotion
//! support) are boolean flags fixed at load time, checked with ordinary
//! conditionals by the caller.

use crate::error::StudioError;
use crate::{ModelId, Waveform};

/// A loaded standard text-to-speech model.
///
/// Inference takes `&self`: a handle is immutable once loaded and may be
/// shared across concurrent synthesis calls.
pub trait StandardModel: Send + Sync {
    /// Whether this model offers a roster of named speakers.
    fn is_multi_speaker(&self) -> bool;

    /// Whether this model accepts an emotion-intensity conditioning value.
    fn is_multi_emotion(&self) -> bool;

    /// Named speakers, in roster order. Meaningful only when
    /// [`is_multi_speaker`](Self::is_multi_speaker) is true.
    fn speakers(&self) -> Vec<String>;

    /// Synthesize speech at the model's native sample rate.
    ///
    /// `speaker` is passed only for multi-speaker models and `emotion`
    /// only for multi-emotion models; implementations may ignore
    /// arguments outside their capabilities.
    fn synthesize(
        &self,
        text: &str,
        speaker: Option<&str>,
        emotion: Option<f32>,
    ) -> Result<Waveform, StudioError>;
}

/// Loads standard models by id.
///
/// Implementations map a [`ModelId`] to whatever storage holds the model
/// weights. A failed load must leave no observable state behind.
pub trait ModelLoader: Send + Sync {
    fn load(&self, model: ModelId) -> Result<Box<dyn StandardModel>, StudioError>;
}
