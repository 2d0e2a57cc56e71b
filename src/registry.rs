//! Loaded-model lifecycle.
//!
//! Exactly one standard model is loaded at a time. [`ModelRegistry`] owns
//! that state behind a lock and is its single mutation point: a switch
//! loads the replacement fully before swapping it in, so a failed load
//! leaves the previous model active. Readers get `Arc` snapshots and are
//! never exposed to a half-replaced handle.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::engines::standard::{ModelLoader, StandardModel};
use crate::error::StudioError;
use crate::voice::ClonedVoices;
use crate::ModelId;

/// The currently loaded model and its enumerated speaker list.
pub struct LoadedModel {
    pub model_id: ModelId,
    pub handle: Box<dyn StandardModel>,
    /// Model speakers (or `"default"`) followed by every clone label.
    pub speakers: Vec<String>,
}

/// Tracks the loaded standard model and reloads it on selection change.
pub struct ModelRegistry {
    loader: Box<dyn ModelLoader>,
    clones: Arc<ClonedVoices>,
    state: RwLock<Arc<LoadedModel>>,
}

impl ModelRegistry {
    /// Create a registry with `default_model` loaded eagerly.
    pub fn new(
        loader: Box<dyn ModelLoader>,
        clones: Arc<ClonedVoices>,
        default_model: ModelId,
    ) -> Result<Self, StudioError> {
        let handle = loader.load(default_model)?;
        let speakers = enumerate_speakers(handle.as_ref(), &clones);
        log::info!("loaded default model {default_model} ({} voices)", speakers.len());
        Ok(Self {
            loader,
            clones,
            state: RwLock::new(Arc::new(LoadedModel {
                model_id: default_model,
                handle,
                speakers,
            })),
        })
    }

    /// Ensure `model` is the loaded model, returning its speaker list.
    ///
    /// Requesting the already-loaded model is a no-op that returns the
    /// cached list — every synthesis call comes through here, and loads
    /// are expensive. A switch happens under the write lock, so only one
    /// load proceeds at a time; on failure the previous model stays
    /// active and the error surfaces unchanged.
    pub fn ensure_loaded(&self, model: ModelId) -> Result<Vec<String>, StudioError> {
        {
            let current = self.state.read();
            if current.model_id == model {
                log::debug!("model {model} already loaded");
                return Ok(current.speakers.clone());
            }
        }

        let mut state = self.state.write();
        // A racing caller may have completed the same switch.
        if state.model_id == model {
            return Ok(state.speakers.clone());
        }

        log::info!("switching model: {} -> {model}", state.model_id);
        let handle = self.loader.load(model)?;
        let speakers = enumerate_speakers(handle.as_ref(), &self.clones);
        *state = Arc::new(LoadedModel {
            model_id: model,
            handle,
            speakers: speakers.clone(),
        });
        Ok(speakers)
    }

    /// Snapshot of the loaded model for read-only inference.
    pub fn current(&self) -> Arc<LoadedModel> {
        self.state.read().clone()
    }
}

/// Speaker list for a handle: model roster (or `"default"` for
/// single-speaker models) plus every registered clone label.
fn enumerate_speakers(handle: &dyn StandardModel, clones: &ClonedVoices) -> Vec<String> {
    let mut speakers = if handle.is_multi_speaker() {
        handle.speakers()
    } else {
        vec!["default".to_string()]
    };
    speakers.extend(clones.labels());
    speakers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::standard::fakes::CountingLoader;
    use std::sync::atomic::Ordering;

    fn clones() -> Arc<ClonedVoices> {
        let mut clones = ClonedVoices::new();
        clones.register("Clone: Laura", "clones/laura.wav");
        clones.register("Clone: Mark", "clones/mark.wav");
        Arc::new(clones)
    }

    #[test]
    fn ensure_loaded_is_idempotent() {
        let (loader, loads) = CountingLoader::new();
        let registry =
            ModelRegistry::new(Box::new(loader), clones(), ModelId::VitsVctk).unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        let first = registry.ensure_loaded(ModelId::VitsVctk).unwrap();
        let second = registry.ensure_loaded(ModelId::VitsVctk).unwrap();

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn switching_models_reloads_and_swaps() {
        let (loader, loads) = CountingLoader::new();
        let registry =
            ModelRegistry::new(Box::new(loader), clones(), ModelId::VitsVctk).unwrap();

        let speakers = registry.ensure_loaded(ModelId::Jenny).unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert_eq!(registry.current().model_id, ModelId::Jenny);
        assert!(speakers.contains(&"default".to_string()));
    }

    #[test]
    fn failed_switch_preserves_previous_state() {
        let (mut loader, _loads) = CountingLoader::new();
        loader.fail_for = Some(ModelId::Jenny);
        let registry =
            ModelRegistry::new(Box::new(loader), clones(), ModelId::VitsVctk).unwrap();
        let before = registry.ensure_loaded(ModelId::VitsVctk).unwrap();

        let err = registry.ensure_loaded(ModelId::Jenny).unwrap_err();
        assert!(matches!(
            err,
            StudioError::ModelLoad {
                model: ModelId::Jenny,
                ..
            }
        ));

        assert_eq!(registry.current().model_id, ModelId::VitsVctk);
        assert_eq!(registry.ensure_loaded(ModelId::VitsVctk).unwrap(), before);
    }

    #[test]
    fn clone_labels_present_for_every_model() {
        let (loader, _loads) = CountingLoader::new();
        let registry =
            ModelRegistry::new(Box::new(loader), clones(), ModelId::VitsVctk).unwrap();

        for model in ModelId::ALL {
            let speakers = registry.ensure_loaded(model).unwrap();
            assert!(speakers.contains(&"Clone: Laura".to_string()));
            assert!(speakers.contains(&"Clone: Mark".to_string()));
        }
    }

    #[test]
    fn single_speaker_model_enumerates_default() {
        let (loader, _loads) = CountingLoader::new();
        let registry = ModelRegistry::new(Box::new(loader), clones(), ModelId::Jenny).unwrap();

        let speakers = registry.ensure_loaded(ModelId::Jenny).unwrap();
        assert_eq!(
            speakers,
            vec!["default", "Clone: Laura", "Clone: Mark"]
        );
    }
}
