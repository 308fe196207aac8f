//! Symbol ↔ glyph mappings.
//!
//! Two layers:
//!
//! - [`MappingDocument`]: the persisted JSON record. It may be partial (a
//!   builder that ran short of candidates still writes what it assigned).
//! - [`Bijection`]: the validated, immutable runtime table loaded from a
//!   document. Forward lookups are an array indexed by numeral value; the
//!   reverse table is a hash map keyed by glyph bytes, derived at load time
//!   and never persisted.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::glyph::segment::{cluster_count, is_standalone};
use crate::glyph::{PLACEHOLDER_GLYPH, segment};
use crate::numeral::{NumeralAlphabet, RADIX};

// ── Errors ──────────────────────────────────────────────────────────────

/// Errors raised while loading, validating, storing or building mappings.
#[derive(Debug, Error, Diagnostic)]
pub enum MappingError {
    #[error("failed to read mapping file: {path}")]
    #[diagnostic(
        code(glyph58::mapping::io),
        help("Ensure the mapping file exists and is readable. Build one with `glyph58 build`.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse mapping file {path}: {message}")]
    #[diagnostic(
        code(glyph58::mapping::parse),
        help(
            "The file must be a JSON object with `base58_alphabet`, `mapping_strategy` \
             and a `mapping` table of {{glyph, name, priority}} entries."
        )
    )]
    Parse { path: String, message: String },

    #[error("failed to serialize mapping: {message}")]
    #[diagnostic(code(glyph58::mapping::serialize))]
    Serialize { message: String },

    #[error("mapping key '{symbol}' is not in the numeral alphabet")]
    #[diagnostic(
        code(glyph58::mapping::unknown_symbol),
        help("Every key of the mapping table must be one symbol of `base58_alphabet`.")
    )]
    UnknownSymbol { symbol: char },

    #[error("mapping is incomplete: {count} symbol(s) unassigned ({missing})")]
    #[diagnostic(
        code(glyph58::mapping::incomplete),
        help(
            "A codec needs a glyph for all 58 symbols. Rebuild with a larger candidate \
             pool or backfill from a secondary pool."
        )
    )]
    Incomplete { count: usize, missing: String },

    #[error("glyph {glyph} is assigned to both '{first}' and '{second}'")]
    #[diagnostic(
        code(glyph58::mapping::duplicate_glyph),
        help("Each glyph may stand for at most one symbol, otherwise decoding is ambiguous.")
    )]
    DuplicateGlyph {
        glyph: String,
        first: char,
        second: char,
    },

    #[error("glyph for '{symbol}' spans {clusters} clusters: {glyph:?}")]
    #[diagnostic(
        code(glyph58::mapping::not_single_glyph),
        help(
            "Mapped glyphs must segment to exactly one cluster, otherwise decoding \
             cannot split them back apart."
        )
    )]
    NotSingleGlyph {
        symbol: char,
        glyph: String,
        clusters: usize,
    },

    #[error("glyph for '{symbol}' would merge with its neighbours: {glyph:?}")]
    #[diagnostic(
        code(glyph58::mapping::fusing_glyph),
        help(
            "A mapped glyph may not start with a variation selector, skin-tone modifier \
             or zero-width joiner, and may not end with a joiner."
        )
    )]
    FusingGlyph { symbol: char, glyph: String },

    #[error("glyph for '{symbol}' is the reserved placeholder {}", PLACEHOLDER_GLYPH)]
    #[diagnostic(
        code(glyph58::mapping::reserved_glyph),
        help("The placeholder marks unmapped symbols and cannot be assigned.")
    )]
    ReservedGlyph { symbol: char },

    #[error("insufficient candidates: need {needed}, only {available} survived filtering")]
    #[diagnostic(
        code(glyph58::mapping::insufficient_candidates),
        help(
            "Widen the candidate pool or backfill from a secondary ranked pool."
        )
    )]
    InsufficientCandidates { needed: usize, available: usize },
}

/// Result type for mapping operations.
pub type MappingResult<T> = std::result::Result<T, MappingError>;

// ── Persisted document ──────────────────────────────────────────────────

/// Which policy produced a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingStrategy {
    /// Most common symbols get the most visually distinct glyphs.
    #[default]
    Distinct,
    /// Most common symbols get the most commonly used glyphs.
    Steganographic,
}

impl fmt::Display for MappingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingStrategy::Distinct => write!(f, "distinct"),
            MappingStrategy::Steganographic => write!(f, "steganographic"),
        }
    }
}

/// Ranking signal recorded with an assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rank {
    /// Mean composite score against the rest of the pool (lower ranks first).
    Distinctiveness(f64),
    /// Usage tier (1 = most common).
    UsageTier(u8),
}

/// One assignment in a mapping table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    #[serde(alias = "emoji")]
    pub glyph: String,
    /// Display name of the glyph.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinctiveness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_tier: Option<u8>,
    /// 1-based rank in the assignment order.
    pub priority: u32,
}

impl MappingEntry {
    pub fn new(
        glyph: impl Into<String>,
        name: impl Into<String>,
        rank: Rank,
        priority: u32,
    ) -> Self {
        let (distinctiveness, usage_tier) = match rank {
            Rank::Distinctiveness(d) => (Some(d), None),
            Rank::UsageTier(t) => (None, Some(t)),
        };
        Self {
            glyph: glyph.into(),
            name: name.into(),
            distinctiveness,
            usage_tier,
            priority,
        }
    }

    /// The recorded ranking signal, usage tier first when both are present.
    pub fn rank(&self) -> Option<Rank> {
        self.usage_tier
            .map(Rank::UsageTier)
            .or(self.distinctiveness.map(Rank::Distinctiveness))
    }
}

/// The persisted mapping record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingDocument {
    /// Order defines numeral value.
    #[serde(rename = "base58_alphabet")]
    pub alphabet: NumeralAlphabet,
    #[serde(default)]
    pub mapping_strategy: MappingStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Symbol → assignment. Single source of truth for both directions.
    pub mapping: BTreeMap<char, MappingEntry>,
    /// Assignment order used by the builder (informational).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub priority_order: Vec<char>,
}

impl MappingDocument {
    /// An empty document over `alphabet`.
    pub fn new(alphabet: NumeralAlphabet, strategy: MappingStrategy) -> Self {
        Self {
            alphabet,
            mapping_strategy: strategy,
            description: None,
            mapping: BTreeMap::new(),
            priority_order: Vec::new(),
        }
    }

    /// Alphabet symbols without an assignment, in numeral order.
    pub fn missing_symbols(&self) -> Vec<char> {
        self.alphabet
            .symbols()
            .filter(|c| !self.mapping.contains_key(c))
            .collect()
    }

    /// Whether every alphabet symbol has an assignment.
    pub fn is_complete(&self) -> bool {
        self.missing_symbols().is_empty()
    }

    /// Parse a document from JSON text. `origin` names the source in errors.
    pub fn from_json(text: &str, origin: &str) -> MappingResult<Self> {
        serde_json::from_str(text).map_err(|e| MappingError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Pretty JSON with glyphs written as UTF-8.
    pub fn to_json(&self) -> MappingResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| MappingError::Serialize {
            message: e.to_string(),
        })
    }

    /// Load from a JSON file.
    pub fn load(path: &Path) -> MappingResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| MappingError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json(&content, &path.display().to_string())
    }

    /// Save to a JSON file, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> MappingResult<()> {
        let content = self.to_json()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| MappingError::Io {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| MappingError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }
}

// ── Runtime bijection ───────────────────────────────────────────────────

/// A complete, validated symbol ↔ glyph table. Immutable once built.
#[derive(Debug, Clone)]
pub struct Bijection {
    alphabet: NumeralAlphabet,
    strategy: MappingStrategy,
    /// Indexed by numeral value.
    forward: Vec<MappingEntry>,
    /// Glyph bytes → numeral value.
    reverse: HashMap<String, u8>,
}

impl Bijection {
    /// Validate a document and build both lookup directions.
    ///
    /// # Errors
    /// - `UnknownSymbol`: a key outside the alphabet.
    /// - `Incomplete`: some alphabet symbol has no entry.
    /// - `ReservedGlyph` / `NotSingleGlyph` / `FusingGlyph`: a glyph that could
    ///   not round-trip.
    /// - `DuplicateGlyph`: two symbols share a glyph.
    pub fn from_document(doc: MappingDocument) -> MappingResult<Self> {
        if let Some(&symbol) = doc.mapping.keys().find(|&&c| !doc.alphabet.contains(c)) {
            return Err(MappingError::UnknownSymbol { symbol });
        }
        let missing = doc.missing_symbols();
        if !missing.is_empty() {
            return Err(MappingError::Incomplete {
                count: missing.len(),
                missing: missing.into_iter().collect(),
            });
        }

        let MappingDocument {
            alphabet,
            mapping_strategy,
            mut mapping,
            ..
        } = doc;

        let mut forward = Vec::with_capacity(RADIX);
        let mut reverse = HashMap::with_capacity(RADIX);
        for (value, symbol) in (0u8..).zip(alphabet.symbols()) {
            let Some(entry) = mapping.remove(&symbol) else {
                // Completeness was checked above.
                return Err(MappingError::Incomplete {
                    count: 1,
                    missing: symbol.to_string(),
                });
            };
            if entry.glyph == PLACEHOLDER_GLYPH {
                return Err(MappingError::ReservedGlyph { symbol });
            }
            let clusters = cluster_count(&entry.glyph);
            if clusters != 1 {
                return Err(MappingError::NotSingleGlyph {
                    symbol,
                    glyph: entry.glyph,
                    clusters,
                });
            }
            if !is_standalone(&entry.glyph) {
                return Err(MappingError::FusingGlyph {
                    symbol,
                    glyph: entry.glyph,
                });
            }
            if let Some(previous) = reverse.insert(entry.glyph.clone(), value) {
                return Err(MappingError::DuplicateGlyph {
                    glyph: entry.glyph,
                    first: alphabet.symbol(previous),
                    second: symbol,
                });
            }
            forward.push(entry);
        }

        tracing::debug!(
            strategy = %mapping_strategy,
            glyphs = reverse.len(),
            "loaded glyph bijection"
        );

        Ok(Self {
            alphabet,
            strategy: mapping_strategy,
            forward,
            reverse,
        })
    }

    /// Load and validate a mapping file.
    pub fn load(path: &Path) -> MappingResult<Self> {
        Self::from_document(MappingDocument::load(path)?)
    }

    pub fn alphabet(&self) -> &NumeralAlphabet {
        &self.alphabet
    }

    pub fn strategy(&self) -> MappingStrategy {
        self.strategy
    }

    /// Entry for `symbol`, if it is an alphabet symbol.
    pub fn entry(&self, symbol: char) -> Option<&MappingEntry> {
        let value = self.alphabet.value_of(symbol)?;
        self.forward.get(value as usize)
    }

    /// Glyph for `symbol`.
    pub fn glyph_for(&self, symbol: char) -> Option<&str> {
        self.entry(symbol).map(|e| e.glyph.as_str())
    }

    /// Symbol for a single glyph cluster.
    pub fn symbol_for(&self, glyph: &str) -> Option<char> {
        self.reverse
            .get(glyph)
            .map(|&value| self.alphabet.symbol(value))
    }

    /// `(symbol, entry)` pairs in numeral order.
    pub fn entries(&self) -> impl Iterator<Item = (char, &MappingEntry)> {
        self.alphabet.symbols().zip(self.forward.iter())
    }

    /// Number of entries (always 58).
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Whether every cluster of `text` is a mapped glyph.
    pub fn covers(&self, text: &str) -> bool {
        segment(text).all(|c| self.reverse.contains_key(c))
    }

    /// Back to the persisted form.
    pub fn to_document(&self) -> MappingDocument {
        let mut doc = MappingDocument::new(self.alphabet.clone(), self.strategy);
        doc.mapping = self
            .entries()
            .map(|(symbol, entry)| (symbol, entry.clone()))
            .collect();
        doc
    }
}

impl TryFrom<MappingDocument> for Bijection {
    type Error = MappingError;

    fn try_from(doc: MappingDocument) -> Result<Self, Self::Error> {
        Self::from_document(doc)
    }
}
