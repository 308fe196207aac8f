//! Perceptual-hash distinctiveness analysis.
//!
//! Offline pipeline that ranks candidate glyphs by how visually unique they
//! are:
//!
//! 1. [`pool`]: read candidate metadata, drop problematic entries, load and
//!    normalize cached glyph images.
//! 2. [`hash`]: fingerprint each image with four perceptual-hash families.
//! 3. [`similarity`]: pairwise composite distances, confusable pairs and
//!    per-glyph distinctiveness scores, computed in parallel with rayon.

pub mod hash;
pub mod pool;
pub mod similarity;

use miette::Diagnostic;
use thiserror::Error;

pub use hash::{Fingerprint, HashBits, HashFamily, PerceptualHasher};
pub use pool::{CandidateGlyph, FingerprintedGlyph};
pub use similarity::{
    ConfusablePair, LogProgress, PoolAnalysis, ProgressSink, RankedCandidate, SimilarityEngine,
};

// ── Errors ──────────────────────────────────────────────────────────────

/// Errors from image loading and fingerprinting.
#[derive(Debug, Error, Diagnostic)]
pub enum HashError {
    #[error("glyph image not found: {path}")]
    #[diagnostic(
        code(glyph58::hash::missing_image),
        help("Images are expected as <codepoints>_<name>.png under the images directory.")
    )]
    MissingImage { path: String },

    #[error("failed to decode glyph image {path}: {message}")]
    #[diagnostic(
        code(glyph58::hash::decode),
        help("The file exists but is not a readable PNG.")
    )]
    Decode { path: String, message: String },

    #[error("invalid hasher geometry: hash size {hash_size}, image size {image_size}")]
    #[diagnostic(
        code(glyph58::hash::geometry),
        help("The hash size must be at least 2 and no larger than the normalized image size.")
    )]
    Geometry { hash_size: u32, image_size: u32 },
}

/// Errors from the similarity pipeline as a whole.
#[derive(Debug, Error, Diagnostic)]
pub enum SimilarityError {
    #[error("only {survived} glyph(s) fingerprinted, need at least {required}")]
    #[diagnostic(
        code(glyph58::similarity::too_few_survivors),
        help(
            "Too many images were missing or unreadable. Fetch the glyph images \
             into the images directory, or lower `min_pool_size` in the config."
        )
    )]
    TooFewSurvivors { survived: usize, required: usize },

    #[error("failed to read {path}")]
    #[diagnostic(code(glyph58::similarity::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    #[diagnostic(
        code(glyph58::similarity::parse),
        help("Candidate metadata must be a JSON array of {{emoji, name, codepoint, status}} objects.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write report {path}: {message}")]
    #[diagnostic(code(glyph58::similarity::write))]
    Write { path: String, message: String },
}

/// Result type for similarity operations.
pub type SimilarityResult<T> = std::result::Result<T, SimilarityError>;

/// Result type for hashing operations.
pub type HashResult<T> = std::result::Result<T, HashError>;
