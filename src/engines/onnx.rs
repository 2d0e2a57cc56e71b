//! ONNX-backed standard models.
//!
//! Loads a VITS-family text-to-speech model exported to ONNX. A model
//! directory contains:
//!
//! ```text
//! models/vits-vctk/
//! ├── model.onnx      # exported graph (any *.onnx name is accepted)
//! └── config.json     # sample_rate, character vocab, speaker roster
//! ```
//!
//! Capability flags are fixed at load time by inspecting the graph's
//! input signature: a `sid` input makes the model multi-speaker, an
//! `emotion` input makes it multi-emotion.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use ort::execution_providers::CPUExecutionProvider;
use ort::inputs;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;
use parking_lot::Mutex;
use serde::Deserialize;

use crate::engines::standard::{ModelLoader, StandardModel};
use crate::error::StudioError;
use crate::{ModelId, Waveform};

/// Parameters for configuring ONNX model loading.
#[derive(Debug, Clone, Default)]
pub struct OnnxModelParams {
    /// Number of CPU threads to use for inference.
    /// `None` uses the ORT default (typically all available cores).
    pub num_threads: Option<usize>,
    /// Directory for caching Level3-optimized graphs.
    ///
    /// - First load of a model: ORT runs Level3 optimization and
    ///   serialises the result here.
    /// - Subsequent loads: the pre-built graph is loaded at `Disable`
    ///   optimization, skipping the expensive re-optimization step.
    ///
    /// Must be writable; leave `None` for read-only deployments.
    pub optimized_cache_dir: Option<PathBuf>,
}

/// Loads ONNX standard models from subdirectories of a models root.
pub struct OnnxModelLoader {
    models_root: PathBuf,
    params: OnnxModelParams,
}

impl OnnxModelLoader {
    /// Loader over `<models_root>/<model dir name>` with default parameters.
    pub fn new(models_root: impl Into<PathBuf>) -> Self {
        Self {
            models_root: models_root.into(),
            params: OnnxModelParams::default(),
        }
    }

    pub fn with_params(models_root: impl Into<PathBuf>, params: OnnxModelParams) -> Self {
        Self {
            models_root: models_root.into(),
            params,
        }
    }
}

impl ModelLoader for OnnxModelLoader {
    fn load(&self, model: ModelId) -> Result<Box<dyn StandardModel>, StudioError> {
        let dir = self.models_root.join(model.dir_name());
        let loaded = OnnxStandardModel::load(&dir, &self.params).map_err(|e| {
            StudioError::ModelLoad {
                model,
                reason: e.to_string(),
            }
        })?;
        Ok(Box::new(loaded))
    }
}

#[derive(Debug, Deserialize)]
struct ModelConfig {
    sample_rate: u32,
    vocab: HashMap<String, i64>,
    #[serde(default)]
    speakers: Vec<String>,
}

/// A loaded ONNX standard model.
pub struct OnnxStandardModel {
    // ort sessions need exclusive access per run
    session: Mutex<Session>,
    tokens_input_name: String,
    vocab: HashMap<char, i64>,
    speakers: Vec<String>,
    multi_speaker: bool,
    multi_emotion: bool,
    sample_rate: u32,
}

impl OnnxStandardModel {
    /// Load a model from a directory holding an `.onnx` file and a
    /// `config.json`.
    pub fn load(model_dir: &Path, params: &OnnxModelParams) -> Result<Self, StudioError> {
        let onnx_path = find_onnx_file(model_dir)?;
        log::info!("loading ONNX model from {}", onnx_path.display());

        let session = init_session(&onnx_path, params)?;

        let tokens_input_name = detect_tokens_input(&session);
        let multi_speaker = has_input(&session, "sid");
        let multi_emotion = has_input(&session, "emotion");
        log::info!(
            "detected: tokens_input={tokens_input_name:?}, multi_speaker={multi_speaker}, \
             multi_emotion={multi_emotion}"
        );

        let config = load_config(&model_dir.join("config.json"))?;
        let vocab = char_vocab(config.vocab)?;
        if multi_speaker && config.speakers.is_empty() {
            return Err(StudioError::Io(std::io::Error::other(
                "model has a 'sid' input but config.json lists no speakers",
            )));
        }

        Ok(Self {
            session: Mutex::new(session),
            tokens_input_name,
            vocab,
            speakers: config.speakers,
            multi_speaker,
            multi_emotion,
            sample_rate: config.sample_rate,
        })
    }
}

impl StandardModel for OnnxStandardModel {
    fn is_multi_speaker(&self) -> bool {
        self.multi_speaker
    }

    fn is_multi_emotion(&self) -> bool {
        self.multi_emotion
    }

    fn speakers(&self) -> Vec<String> {
        self.speakers.clone()
    }

    fn synthesize(
        &self,
        text: &str,
        speaker: Option<&str>,
        emotion: Option<f32>,
    ) -> Result<Waveform, StudioError> {
        let ids = tokenize(text, &self.vocab);
        if ids.is_empty() {
            log::warn!("no tokens produced for text: {text:?}");
            return Ok(Waveform {
                samples: vec![],
                sample_rate: self.sample_rate,
            });
        }

        let seq_len = ids.len();
        let tokens = Array2::from_shape_vec((1, seq_len), ids)
            .map_err(|e| StudioError::Synthesis(format!("token tensor shape: {e}")))?;
        let lengths = ndarray::arr1(&[seq_len as i64]);

        let sid = match speaker {
            Some(name) if self.multi_speaker => {
                let index = self
                    .speakers
                    .iter()
                    .position(|s| s == name)
                    .ok_or_else(|| {
                        StudioError::Synthesis(format!("speaker {name:?} not in roster"))
                    })?;
                ndarray::arr1(&[index as i64])
            }
            _ => ndarray::arr1(&[0i64]),
        };
        let emotion = ndarray::arr1(&[emotion.unwrap_or(0.5)]);

        let mut session = self.session.lock();
        let run_err = |e: ort::Error| StudioError::Synthesis(e.to_string());
        let output = match (self.multi_speaker, self.multi_emotion) {
            (true, true) => {
                let inputs = inputs![
                    self.tokens_input_name.as_str() => TensorRef::from_array_view(tokens.view()).map_err(run_err)?,
                    "input_lengths" => TensorRef::from_array_view(lengths.view()).map_err(run_err)?,
                    "sid" => TensorRef::from_array_view(sid.view()).map_err(run_err)?,
                    "emotion" => TensorRef::from_array_view(emotion.view()).map_err(run_err)?,
                ];
                session.run(inputs).map_err(run_err)?
            }
            (true, false) => {
                let inputs = inputs![
                    self.tokens_input_name.as_str() => TensorRef::from_array_view(tokens.view()).map_err(run_err)?,
                    "input_lengths" => TensorRef::from_array_view(lengths.view()).map_err(run_err)?,
                    "sid" => TensorRef::from_array_view(sid.view()).map_err(run_err)?,
                ];
                session.run(inputs).map_err(run_err)?
            }
            (false, true) => {
                let inputs = inputs![
                    self.tokens_input_name.as_str() => TensorRef::from_array_view(tokens.view()).map_err(run_err)?,
                    "input_lengths" => TensorRef::from_array_view(lengths.view()).map_err(run_err)?,
                    "emotion" => TensorRef::from_array_view(emotion.view()).map_err(run_err)?,
                ];
                session.run(inputs).map_err(run_err)?
            }
            (false, false) => {
                let inputs = inputs![
                    self.tokens_input_name.as_str() => TensorRef::from_array_view(tokens.view()).map_err(run_err)?,
                    "input_lengths" => TensorRef::from_array_view(lengths.view()).map_err(run_err)?,
                ];
                session.run(inputs).map_err(run_err)?
            }
        };

        let first_output = output
            .iter()
            .next()
            .ok_or_else(|| StudioError::Synthesis("no output from model".to_string()))?;
        let waveform = first_output
            .1
            .try_extract_array::<f32>()
            .map_err(run_err)?;

        Ok(Waveform {
            samples: waveform.as_slice().unwrap_or(&[]).to_vec(),
            sample_rate: self.sample_rate,
        })
    }
}

/// Find the ONNX model file in the given directory.
///
/// Prefers `model.onnx`, then falls back to the first `.onnx` file found.
fn find_onnx_file(model_dir: &Path) -> Result<PathBuf, StudioError> {
    let preferred = model_dir.join("model.onnx");
    if preferred.exists() {
        return Ok(preferred);
    }

    for entry in std::fs::read_dir(model_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("onnx") {
            log::info!("using ONNX file: {}", path.display());
            return Ok(path);
        }
    }

    Err(StudioError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("no .onnx file found in {}", model_dir.display()),
    )))
}

/// Initialize an ONNX session with optional on-disk graph caching.
///
/// With a cache dir configured, the first load runs Level3 optimization
/// and serialises the optimized graph; later loads read it back directly
/// at `Disable` level, cutting cold-start time substantially.
fn init_session(onnx_path: &Path, params: &OnnxModelParams) -> Result<Session, StudioError> {
    let providers = vec![CPUExecutionProvider::default().build()];
    let cache_path = params.optimized_cache_dir.as_ref().map(|dir| {
        let stem = onnx_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("model");
        dir.join(format!("{stem}-optimized.onnx"))
    });

    let (load_path, opt_level, write_cache) = match cache_path.as_deref() {
        Some(cache) if cache.exists() => {
            log::info!("loading pre-optimized graph from {}", cache.display());
            (cache, GraphOptimizationLevel::Disable, None)
        }
        Some(cache) => {
            log::info!("first load: optimizing graph, caching to {}", cache.display());
            (onnx_path, GraphOptimizationLevel::Level3, Some(cache))
        }
        None => (onnx_path, GraphOptimizationLevel::Level3, None),
    };

    let load_err = |e: ort::Error| {
        StudioError::Io(std::io::Error::other(format!("ONNX session init: {e}")))
    };

    let mut builder = Session::builder()
        .map_err(load_err)?
        .with_optimization_level(opt_level)
        .map_err(load_err)?
        .with_execution_providers(providers)
        .map_err(load_err)?
        .with_parallel_execution(true)
        .map_err(load_err)?;

    if let Some(cache) = write_cache {
        builder = builder.with_optimized_model_path(cache).map_err(load_err)?;
    }

    if let Some(threads) = params.num_threads {
        builder = builder
            .with_intra_threads(threads)
            .map_err(load_err)?
            .with_inter_threads(threads)
            .map_err(load_err)?;
    }

    builder.commit_from_file(load_path).map_err(load_err)
}

/// Detect the token input name ("input" or "tokens") from session inputs.
fn detect_tokens_input(session: &Session) -> String {
    for input in session.inputs() {
        if input.name() == "input" || input.name() == "tokens" {
            return input.name().to_string();
        }
    }
    "input".to_string()
}

fn has_input(session: &Session, name: &str) -> bool {
    for input in session.inputs() {
        if input.name() == name {
            return true;
        }
    }
    false
}

fn load_config(config_path: &Path) -> Result<ModelConfig, StudioError> {
    let content = std::fs::read_to_string(config_path)?;
    serde_json::from_str(&content).map_err(|e| {
        StudioError::Io(std::io::Error::other(format!(
            "invalid config.json at {}: {e}",
            config_path.display()
        )))
    })
}

/// Convert the string-keyed vocab from config.json to a char map.
fn char_vocab(raw: HashMap<String, i64>) -> Result<HashMap<char, i64>, StudioError> {
    let mut map = HashMap::with_capacity(raw.len());
    for (key, id) in raw {
        let ch = key.chars().next().ok_or_else(|| {
            StudioError::Io(std::io::Error::other("empty key in config.json vocab"))
        })?;
        map.insert(ch, id);
    }
    Ok(map)
}

/// Map text to token IDs by character lookup. Characters not in the vocab
/// are silently dropped.
fn tokenize(text: &str, vocab: &HashMap<char, i64>) -> Vec<i64> {
    text.chars().filter_map(|ch| vocab.get(&ch).copied()).collect()
}

#[cfg(test)]
mod tests {
    use super::{char_vocab, tokenize};
    use std::collections::HashMap;

    fn vocab() -> HashMap<char, i64> {
        let raw: HashMap<String, i64> = [("h", 1), ("i", 2), (" ", 3)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        char_vocab(raw).expect("vocab should convert")
    }

    #[test]
    fn tokenize_maps_known_characters() {
        assert_eq!(tokenize("hi hi", &vocab()), vec![1, 2, 3, 1, 2]);
    }

    #[test]
    fn tokenize_drops_unknown_characters() {
        assert_eq!(tokenize("high", &vocab()), vec![1, 2, 1]);
        assert!(tokenize("xyz", &vocab()).is_empty());
    }

    #[test]
    fn empty_vocab_key_is_rejected() {
        let raw: HashMap<String, i64> = [(String::new(), 1)].into_iter().collect();
        assert!(char_vocab(raw).is_err());
    }
}
