//! Tool configuration, persisted as TOML.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration. CLI flags override individual values.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vision::{HashResult, PerceptualHasher};

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "glyph58.toml";

/// Errors from configuration loading and saving.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(glyph58::config::read),
        help("Ensure the config file exists and is readable. Create one with `glyph58 init-config`.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(glyph58::config::parse),
        help("Check the TOML syntax in the config file. Unknown keys are rejected.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(glyph58::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Paths and tuning knobs for the codec and the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Glyph58Config {
    /// Mapping used by default (distinct strategy).
    #[serde(default = "default_distinct_mapping")]
    pub distinct_mapping: PathBuf,
    /// Mapping used with `--stego`.
    #[serde(default = "default_stego_mapping")]
    pub stego_mapping: PathBuf,
    /// Emoji-test metadata (JSON array).
    #[serde(default = "default_metadata_file")]
    pub metadata_file: PathBuf,
    /// Directory of cached glyph PNGs.
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,
    /// Ranked candidates written by `analyze`, read by `build`.
    #[serde(default = "default_top_candidates_file")]
    pub top_candidates_file: PathBuf,
    /// Confusable-pair report written by `analyze`.
    #[serde(default = "default_confusable_pairs_file")]
    pub confusable_pairs_file: PathBuf,
    /// Composite distance below which two glyphs are confusable.
    #[serde(default = "default_confusable_threshold")]
    pub confusable_threshold: f64,
    /// Hash grid side; each family yields `hash_size²` bits.
    #[serde(default = "default_hash_size")]
    pub hash_size: u32,
    /// Side of the normalized square image.
    #[serde(default = "default_image_size")]
    pub image_size: u32,
    /// Ranked candidates kept by `analyze`.
    #[serde(default = "default_candidate_count")]
    pub candidate_count: usize,
    /// Minimum glyphs that must survive fingerprinting.
    #[serde(default = "default_min_pool_size")]
    pub min_pool_size: usize,
    /// Confusable pairs listed in the `analyze` summary. The saved report
    /// always holds every pair.
    #[serde(default = "default_confusable_report_len")]
    pub confusable_report_len: usize,
    /// Progress log granularity for the pairwise batch, in percent.
    #[serde(default = "default_progress_step_percent")]
    pub progress_step_percent: usize,
}

fn default_distinct_mapping() -> PathBuf {
    PathBuf::from("data/base58_emoji_mapping.json")
}

fn default_stego_mapping() -> PathBuf {
    PathBuf::from("data/base58_emoji_mapping_stego.json")
}

fn default_metadata_file() -> PathBuf {
    PathBuf::from("data/emoji_metadata.json")
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("data/emoji_images")
}

fn default_top_candidates_file() -> PathBuf {
    PathBuf::from("data/top_candidates.json")
}

fn default_confusable_pairs_file() -> PathBuf {
    PathBuf::from("data/confusable_pairs.json")
}

fn default_confusable_threshold() -> f64 {
    0.15
}

fn default_hash_size() -> u32 {
    8
}

fn default_image_size() -> u32 {
    64
}

fn default_candidate_count() -> usize {
    150
}

fn default_min_pool_size() -> usize {
    100
}

fn default_confusable_report_len() -> usize {
    50
}

fn default_progress_step_percent() -> usize {
    10
}

impl Default for Glyph58Config {
    fn default() -> Self {
        Self {
            distinct_mapping: default_distinct_mapping(),
            stego_mapping: default_stego_mapping(),
            metadata_file: default_metadata_file(),
            images_dir: default_images_dir(),
            top_candidates_file: default_top_candidates_file(),
            confusable_pairs_file: default_confusable_pairs_file(),
            confusable_threshold: default_confusable_threshold(),
            hash_size: default_hash_size(),
            image_size: default_image_size(),
            candidate_count: default_candidate_count(),
            min_pool_size: default_min_pool_size(),
            confusable_report_len: default_confusable_report_len(),
            progress_step_percent: default_progress_step_percent(),
        }
    }
}

impl Glyph58Config {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load `path` if given, else `glyph58.toml` in the working directory if
    /// present, else the defaults.
    pub fn discover(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.exists() {
                    Self::load(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Mapping file for the chosen strategy.
    pub fn mapping_path(&self, stego: bool) -> &Path {
        if stego {
            &self.stego_mapping
        } else {
            &self.distinct_mapping
        }
    }

    /// Hasher with the configured geometry.
    pub fn hasher(&self) -> HashResult<PerceptualHasher> {
        PerceptualHasher::new(self.hash_size, self.image_size)
    }
}
