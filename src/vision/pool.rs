//! Candidate glyph pool: metadata, filtering and image loading.
//!
//! Metadata comes from the Unicode emoji-test listing as a JSON array of
//! `{emoji, name, codepoint, status}` objects. Images are pre-fetched PNGs
//! named `<codepoints>_<name>.png` (codepoints lowercase and dash-joined,
//! name with `/` → `-` and spaces → `_`). A missing or unreadable image is a
//! per-item skip; the pool as a whole only fails when too few glyphs survive.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::hash::{Fingerprint, PerceptualHasher};
use super::{HashError, HashResult, SimilarityError, SimilarityResult};

/// Status marking a complete, standalone emoji in the emoji-test listing.
pub const FULLY_QUALIFIED: &str = "fully-qualified";

const SKIN_TONE_CODEPOINTS: [&str; 5] = ["1F3FB", "1F3FC", "1F3FD", "1F3FE", "1F3FF"];

fn default_status() -> String {
    FULLY_QUALIFIED.to_string()
}

/// One entry of the candidate metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateGlyph {
    #[serde(rename = "emoji", alias = "glyph")]
    pub glyph: String,
    pub name: String,
    /// Space-separated uppercase hex code points, e.g. `"2764 FE0F"`.
    pub codepoint: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl CandidateGlyph {
    pub fn new(glyph: impl Into<String>, name: impl Into<String>) -> Self {
        let glyph = glyph.into();
        let codepoint = glyph
            .chars()
            .map(|c| format!("{:04X}", c as u32))
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            glyph,
            name: name.into(),
            codepoint,
            status: default_status(),
            version: None,
        }
    }

    pub fn is_fully_qualified(&self) -> bool {
        self.status == FULLY_QUALIFIED
    }

    /// Skin-tone variants, flags, joiner sequences and keycaps.
    pub fn is_problematic(&self) -> bool {
        let name = self.name.to_lowercase();
        let cp = self.codepoint.to_uppercase();
        SKIN_TONE_CODEPOINTS.iter().any(|tone| cp.contains(tone))
            || name.contains("flag")
            || cp.starts_with("1F1")
            || cp.contains("200D")
            || name.contains("keycap")
            || cp.contains("20E3")
    }

    /// Cached image file name for this glyph.
    pub fn image_file_name(&self) -> String {
        let codepoints = self.codepoint.replace(' ', "-").to_lowercase();
        let safe_name = self.name.replace('/', "-").replace(' ', "_");
        format!("{codepoints}_{safe_name}.png")
    }

    pub fn image_path(&self, images_dir: &Path) -> PathBuf {
        images_dir.join(self.image_file_name())
    }
}

/// Read candidate metadata from a JSON array.
pub fn load_candidates(path: &Path) -> SimilarityResult<Vec<CandidateGlyph>> {
    let content = std::fs::read_to_string(path).map_err(|e| SimilarityError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let candidates: Vec<CandidateGlyph> =
        serde_json::from_str(&content).map_err(|e| SimilarityError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    tracing::info!(count = candidates.len(), path = %path.display(), "loaded candidate metadata");
    Ok(candidates)
}

/// Keep fully-qualified, non-problematic candidates, in input order.
pub fn filter_problematic(candidates: &[CandidateGlyph]) -> Vec<CandidateGlyph> {
    let kept: Vec<CandidateGlyph> = candidates
        .iter()
        .filter(|c| c.is_fully_qualified() && !c.is_problematic())
        .cloned()
        .collect();
    tracing::info!(
        input = candidates.len(),
        kept = kept.len(),
        "filtered problematic candidates"
    );
    kept
}

/// Load a candidate's cached image and normalize it.
///
/// # Errors
/// - `MissingImage` if the file does not exist.
/// - `Decode` if it cannot be read as an image.
pub fn load_normalized(
    hasher: &PerceptualHasher,
    images_dir: &Path,
    candidate: &CandidateGlyph,
) -> HashResult<RgbaImage> {
    let path = candidate.image_path(images_dir);
    if !path.exists() {
        return Err(HashError::MissingImage {
            path: path.display().to_string(),
        });
    }
    let image = image::open(&path).map_err(|e| HashError::Decode {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(hasher.normalize(&image))
}

/// A candidate together with its fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintedGlyph {
    pub candidate: CandidateGlyph,
    pub fingerprint: Fingerprint,
}

/// A candidate skipped during fingerprinting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolFailure {
    pub glyph: String,
    pub reason: String,
}

/// Outcome of fingerprinting a candidate list.
#[derive(Debug, Clone)]
pub struct FingerprintedPool {
    /// Survivors in input order.
    pub glyphs: Vec<FingerprintedGlyph>,
    pub failures: Vec<PoolFailure>,
}

/// Fingerprint every candidate in parallel. Failures are collected and
/// logged, not raised.
///
/// # Errors
/// - `TooFewSurvivors` if fewer than `min_survivors` glyphs were hashed.
pub fn fingerprint_pool(
    hasher: &PerceptualHasher,
    images_dir: &Path,
    candidates: &[CandidateGlyph],
    min_survivors: usize,
) -> SimilarityResult<FingerprintedPool> {
    let results: Vec<(&CandidateGlyph, HashResult<Fingerprint>)> = candidates
        .par_iter()
        .map(|c| {
            let fp = load_normalized(hasher, images_dir, c).map(|img| hasher.fingerprint(&img));
            (c, fp)
        })
        .collect();

    let mut glyphs = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (candidate, result) in results {
        match result {
            Ok(fingerprint) => glyphs.push(FingerprintedGlyph {
                candidate: candidate.clone(),
                fingerprint,
            }),
            Err(e) => {
                tracing::warn!(glyph = %candidate.glyph, error = %e, "skipping candidate");
                failures.push(PoolFailure {
                    glyph: candidate.glyph.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        hashed = glyphs.len(),
        failed = failures.len(),
        "fingerprinted candidate pool"
    );

    if glyphs.len() < min_survivors {
        return Err(SimilarityError::TooFewSurvivors {
            survived: glyphs.len(),
            required: min_survivors,
        });
    }
    Ok(FingerprintedPool { glyphs, failures })
}
