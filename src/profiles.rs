//! Named parameter presets, persisted as a single JSON file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StudioError;

/// A saved combination of voice selection and audio-tuning parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub speaker_id: String,
    pub emotion: f32,
    pub pitch: i32,
    pub speed: f32,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            speaker_id: String::new(),
            emotion: 0.5,
            pitch: 0,
            speed: 1.0,
        }
    }
}

/// Store of profiles keyed by name, backed by one JSON file.
///
/// Every save rewrites the file synchronously, so a crash after a save
/// never loses the last write. Loading an unknown name returns defaults
/// rather than failing; the caller cannot distinguish "never saved" from
/// "saved as defaults", which is the intended soft fallback.
#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    profiles: BTreeMap<String, Profile>,
}

impl ProfileStore {
    /// Open the store at `path`, creating an empty file if none exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StudioError> {
        let path = path.into();
        if !path.exists() {
            fs::write(&path, "{}")?;
            return Ok(Self {
                path,
                profiles: BTreeMap::new(),
            });
        }

        let content = fs::read_to_string(&path)?;
        let profiles: BTreeMap<String, Profile> = serde_json::from_str(&content)
            .map_err(|e| StudioError::Io(std::io::Error::other(format!(
                "malformed profiles file {}: {e}",
                path.display()
            ))))?;
        log::info!("loaded {} profiles from {}", profiles.len(), path.display());
        Ok(Self { path, profiles })
    }

    /// Upsert a profile under `name`, silently overwriting, and persist.
    pub fn save(&mut self, name: impl Into<String>, profile: Profile) -> Result<(), StudioError> {
        self.profiles.insert(name.into(), profile);
        self.persist()
    }

    /// Profile saved under `name`, or defaults `("", 0.5, 0, 1.0)` if absent.
    pub fn load(&self, name: &str) -> Profile {
        self.profiles.get(name).cloned().unwrap_or_default()
    }

    /// All saved profile names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StudioError> {
        let json = serde_json::to_string_pretty(&self.profiles)
            .map_err(|e| StudioError::Io(std::io::Error::other(e)))?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_empty_file_when_absent() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("profiles.json");

        let store = ProfileStore::open(&path).expect("open should succeed");
        assert!(path.exists());
        assert!(store.names().is_empty());
    }

    #[test]
    fn save_then_load_returns_exact_values() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let mut store = ProfileStore::open(dir.path().join("profiles.json")).unwrap();

        store
            .save(
                "default",
                Profile {
                    speaker_id: "p225".to_string(),
                    emotion: 0.7,
                    pitch: 2,
                    speed: 1.1,
                },
            )
            .expect("save should succeed");

        let loaded = store.load("default");
        assert_eq!(loaded.speaker_id, "p225");
        assert_eq!(loaded.emotion, 0.7);
        assert_eq!(loaded.pitch, 2);
        assert_eq!(loaded.speed, 1.1);
    }

    #[test]
    fn missing_profile_loads_defaults() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = ProfileStore::open(dir.path().join("profiles.json")).unwrap();

        let loaded = store.load("missing");
        assert_eq!(loaded, Profile::default());
        assert_eq!(loaded.speaker_id, "");
        assert_eq!(loaded.emotion, 0.5);
        assert_eq!(loaded.pitch, 0);
        assert_eq!(loaded.speed, 1.0);
    }

    #[test]
    fn save_overwrites_existing_name() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let mut store = ProfileStore::open(dir.path().join("profiles.json")).unwrap();

        store
            .save(
                "voice",
                Profile {
                    speaker_id: "p225".to_string(),
                    ..Profile::default()
                },
            )
            .unwrap();
        store
            .save(
                "voice",
                Profile {
                    speaker_id: "p300".to_string(),
                    ..Profile::default()
                },
            )
            .unwrap();

        assert_eq!(store.load("voice").speaker_id, "p300");
        assert_eq!(store.names(), vec!["voice"]);
    }

    #[test]
    fn profiles_survive_reopen() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("profiles.json");

        {
            let mut store = ProfileStore::open(&path).unwrap();
            store
                .save(
                    "narrator",
                    Profile {
                        speaker_id: "Clone: Laura".to_string(),
                        emotion: 0.9,
                        pitch: -3,
                        speed: 0.8,
                    },
                )
                .unwrap();
        }

        let reopened = ProfileStore::open(&path).unwrap();
        let loaded = reopened.load("narrator");
        assert_eq!(loaded.speaker_id, "Clone: Laura");
        assert_eq!(loaded.pitch, -3);
    }

    #[test]
    fn names_are_sorted() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let mut store = ProfileStore::open(dir.path().join("profiles.json")).unwrap();

        store.save("zeta", Profile::default()).unwrap();
        store.save("alpha", Profile::default()).unwrap();
        assert_eq!(store.names(), vec!["alpha", "zeta"]);
    }
}
