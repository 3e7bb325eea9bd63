use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::SamplerError;
use crate::source::EpisodeLengths;
use crate::types::StepCount;

/// On-disk description of an episode store's length index.
///
/// Serialized as JSON: `{"lengths": [10, 100, 5]}`, where position `i` is the
/// length of episode `i`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeManifest {
    /// Episode lengths in episode-id order.
    pub lengths: Vec<StepCount>,
}

impl EpisodeManifest {
    /// Parse a manifest from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, SamplerError> {
        serde_json::from_str(text).map_err(|err| SamplerError::Manifest(err.to_string()))
    }

    /// Read and parse a manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SamplerError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text).map_err(|err| match err {
            SamplerError::Manifest(reason) => {
                SamplerError::Manifest(format!("{}: {reason}", path.display()))
            }
            other => other,
        })
    }

    /// Write the manifest as JSON, creating parent directories when needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SamplerError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let text =
            serde_json::to_string(self).map_err(|err| SamplerError::Manifest(err.to_string()))?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Convert into an in-memory index.
    pub fn into_index(self) -> EpisodeLengths {
        EpisodeLengths::new(self.lengths)
    }
}

impl EpisodeLengths {
    /// Load an index from a JSON manifest file.
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, SamplerError> {
        EpisodeManifest::load(path).map(EpisodeManifest::into_index)
    }
}
