// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # glyph58
//!
//! Reversible substitution of Base58Check addresses with emoji glyphs, plus
//! the offline perceptual-hash analysis that picks which glyphs to use.
//!
//! ## Architecture
//!
//! - **Numeral codec** (`numeral`): radix-58 conversion and the double-SHA-256 checksum
//! - **Glyphs** (`glyph`): cluster segmentation, free-text extraction, bundled catalog
//! - **Mappings** (`mapping`): persisted JSON document and the validated bijection
//! - **Codec** (`codec`): encode / decode / validate / scan over one bijection
//! - **Vision** (`vision`): perceptual hashes, confusable pairs, distinctiveness
//! - **Builder** (`builder`): ranked candidates → mapping, with cluster thinning and backfill
//!
//! ## Library usage
//!
//! ```no_run
//! use std::path::Path;
//! use glyph58::codec::SubstitutionCodec;
//!
//! let codec = SubstitutionCodec::load(Path::new("data/base58_emoji_mapping.json")).unwrap();
//! let encoded = codec.encode("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa");
//! let report = codec.scan(&encoded.glyphs);
//! assert!(report.checksum_valid);
//! ```

pub mod builder;
pub mod codec;
pub mod config;
pub mod error;
pub mod glyph;
pub mod mapping;
pub mod numeral;
pub mod vision;
