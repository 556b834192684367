//! Engine configuration.
//!
//! Defaults are compile-time constants; binaries override them through CLI
//! arguments or an optional JSON file read with [`EngineConfig::from_json_file`].

use crate::error::Result;
use crate::persist::DataPaths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Words shorter than this never get a prefix-proximity score.
pub const DEFAULT_MIN_LEN: usize = 1;

/// Maximum length difference between a token and a lexicon candidate.
pub const DEFAULT_MAX_LEN_DIFF: usize = 12;

/// Minimum prefix proximity (percent) for a lexicon candidate to be kept.
pub const DEFAULT_PROXIMITY_THRESHOLD: f64 = 54.0;

/// Separator between surface form and lemma in the lexicon file.
pub const LEXICON_SEPARATOR: char = '→';

pub const INDEX_FILE: &str = "index_inverse.txt";
pub const LEXICON_FILE: &str = "lexicon.txt";
pub const SNAPSHOT_FILE: &str = "index.snapshot.bin";
pub const META_FILE: &str = "meta.json";

/// Default directory holding the index and lexicon files.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Thresholds of the spelling corrector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionParams {
    pub min_len: usize,
    pub max_len_diff: usize,
    pub proximity_threshold: f64,
}

impl Default for CorrectionParams {
    fn default() -> Self {
        Self {
            min_len: DEFAULT_MIN_LEN,
            max_len_diff: DEFAULT_MAX_LEN_DIFF,
            proximity_threshold: DEFAULT_PROXIMITY_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub data_dir: PathBuf,
    pub correction: CorrectionParams,
    /// Load the bincode snapshot when it is at least as new as the text index.
    pub use_snapshot: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            correction: CorrectionParams::default(),
            use_snapshot: true,
        }
    }
}

impl EngineConfig {
    pub fn with_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self { data_dir: data_dir.as_ref().to_path_buf(), ..Self::default() }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn paths(&self) -> DataPaths {
        DataPaths::new(&self.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{"data_dir": "/tmp/adit", "correction": {"min_len": 3}}"#).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/adit"));
        assert_eq!(cfg.correction.min_len, 3);
        assert_eq!(cfg.correction.max_len_diff, DEFAULT_MAX_LEN_DIFF);
        assert!(cfg.use_snapshot);
    }
}
