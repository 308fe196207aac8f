//! Mapping builder: assign ranked glyphs to prioritized symbols.
//!
//! The candidate pool is sorted by its rank key (distinctiveness score or
//! usage tier, ascending). The sort is stable, so equal keys keep their input
//! order and that order is part of the contract. Confusable clusters are then
//! thinned to their first-seen member, and the i-th prioritized symbol takes
//! the i-th survivor. A pool that runs dry is topped up from a secondary
//! pool; whatever is still unassigned is reported, never panicked on.

use std::collections::{HashMap, HashSet};

use crate::glyph::catalog::{
    BACKFILL_TIER, CommonGlyph, SAMPLE_ADDRESSES, priority_from_samples, stego_priority,
};
use crate::glyph::segment::is_standalone;
use crate::glyph::PLACEHOLDER_GLYPH;
use crate::mapping::{
    Bijection, MappingDocument, MappingEntry, MappingError, MappingResult, MappingStrategy, Rank,
};
use crate::numeral::{NumeralAlphabet, RADIX};
use crate::vision::{ConfusablePair, RankedCandidate};

/// Name fragments whose glyphs render as near-duplicates of each other.
pub const CONFUSABLE_NAME_PATTERNS: [&str; 1] = ["heart"];

/// What the builder optimizes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Important symbols get the most visually distinct glyphs.
    MaximizeDistinctiveness,
    /// Important symbols get the most commonly used glyphs.
    MaximizeCommonness,
}

impl Policy {
    pub fn strategy(self) -> MappingStrategy {
        match self {
            Policy::MaximizeDistinctiveness => MappingStrategy::Distinct,
            Policy::MaximizeCommonness => MappingStrategy::Steganographic,
        }
    }
}

/// A glyph offered to the builder.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub glyph: String,
    pub name: String,
    pub rank: Rank,
}

impl Candidate {
    pub fn new(glyph: impl Into<String>, name: impl Into<String>, rank: Rank) -> Self {
        Self {
            glyph: glyph.into(),
            name: name.into(),
            rank,
        }
    }

    /// Ascending sort key: lower is better under either policy.
    fn sort_key(&self) -> f64 {
        match self.rank {
            Rank::Distinctiveness(d) => d,
            Rank::UsageTier(t) => f64::from(t),
        }
    }
}

impl From<&RankedCandidate> for Candidate {
    fn from(c: &RankedCandidate) -> Self {
        Candidate::new(c.glyph.clone(), c.name.clone(), Rank::Distinctiveness(c.distinctiveness))
    }
}

impl From<&CommonGlyph> for Candidate {
    fn from(g: &CommonGlyph) -> Self {
        Candidate::new(g.glyph, g.name, Rank::UsageTier(g.tier))
    }
}

// ---------------------------------------------------------------------------
// Confusable clusters
// ---------------------------------------------------------------------------

/// Disjoint sets of mutually confusable glyphs (union-find over glyph text).
#[derive(Debug, Clone, Default)]
pub struct ConfusableClusters {
    index: HashMap<String, usize>,
    parent: Vec<usize>,
}

impl ConfusableClusters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connected components of the confusable-pair graph.
    pub fn from_pairs(pairs: &[ConfusablePair]) -> Self {
        let mut clusters = Self::new();
        clusters.add_pairs(pairs);
        clusters
    }

    fn intern(&mut self, glyph: &str) -> usize {
        if let Some(&i) = self.index.get(glyph) {
            return i;
        }
        let i = self.parent.len();
        self.parent.push(i);
        self.index.insert(glyph.to_string(), i);
        i
    }

    fn find(&self, mut i: usize) -> usize {
        while self.parent[i] != i {
            i = self.parent[i];
        }
        i
    }

    /// Merge the clusters of `a` and `b`.
    pub fn union(&mut self, a: &str, b: &str) {
        let ra = {
            let i = self.intern(a);
            self.find(i)
        };
        let rb = {
            let i = self.intern(b);
            self.find(i)
        };
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }

    pub fn add_pairs(&mut self, pairs: &[ConfusablePair]) {
        for p in pairs {
            self.union(&p.first, &p.second);
        }
    }

    /// Put every candidate whose name contains `pattern` (case-insensitive)
    /// into one cluster.
    pub fn add_name_pattern(&mut self, pattern: &str, candidates: &[Candidate]) {
        let pattern = pattern.to_lowercase();
        let mut members = candidates
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&pattern))
            .map(|c| c.glyph.as_str());
        if let Some(first) = members.next() {
            let first = first.to_string();
            self.intern(&first);
            for other in members {
                self.union(&first, other);
            }
        }
    }

    /// Cluster id of `glyph`, if it belongs to any cluster.
    pub fn cluster_of(&self, glyph: &str) -> Option<usize> {
        self.index.get(glyph).map(|&i| self.find(i))
    }

    /// Whether `a` and `b` share a cluster.
    pub fn same_cluster(&self, a: &str, b: &str) -> bool {
        match (self.cluster_of(a), self.cluster_of(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Result of [`MappingBuilder::build`]; possibly partial.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub document: MappingDocument,
    /// Entries taken from the primary pool.
    pub assigned: usize,
    /// Entries taken from the secondary pool.
    pub backfilled: usize,
    /// Symbols left without a glyph, in priority order.
    pub missing: Vec<char>,
}

impl BuildOutcome {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Validate the document as a full bijection.
    ///
    /// # Errors
    /// - `InsufficientCandidates` if any symbol is unassigned.
    /// - Any [`Bijection::from_document`] integrity error.
    pub fn into_bijection(self) -> MappingResult<Bijection> {
        if !self.missing.is_empty() {
            return Err(MappingError::InsufficientCandidates {
                needed: self.document.alphabet.symbols().count(),
                available: self.assigned + self.backfilled,
            });
        }
        Bijection::from_document(self.document)
    }
}

/// Assigns candidate glyphs to symbols in priority order.
#[derive(Debug, Clone)]
pub struct MappingBuilder {
    alphabet: NumeralAlphabet,
    policy: Policy,
    priority: Vec<char>,
    clusters: ConfusableClusters,
    description: Option<String>,
}

impl MappingBuilder {
    /// `priority` is normalized: non-alphabet symbols and repeats are dropped,
    /// then missing alphabet symbols are appended in alphabet order.
    pub fn new(alphabet: NumeralAlphabet, policy: Policy, priority: &[char]) -> Self {
        let mut seen = HashSet::new();
        let mut order: Vec<char> = priority
            .iter()
            .copied()
            .filter(|&c| alphabet.contains(c) && seen.insert(c))
            .collect();
        order.extend(alphabet.symbols().filter(|c| !seen.contains(c)));
        Self {
            alphabet,
            policy,
            priority: order,
            clusters: ConfusableClusters::new(),
            description: None,
        }
    }

    /// Distinct-mode builder, prioritized by the bundled sample addresses.
    pub fn distinct(alphabet: NumeralAlphabet) -> Self {
        let priority = priority_from_samples(&alphabet, SAMPLE_ADDRESSES);
        Self::new(alphabet, Policy::MaximizeDistinctiveness, &priority)
            .with_description("Most frequent symbols mapped to the most visually distinct glyphs")
    }

    /// Steganographic-mode builder with the fixed steganographic priority.
    pub fn steganographic(alphabet: NumeralAlphabet) -> Self {
        Self::new(alphabet, Policy::MaximizeCommonness, &stego_priority()).with_description(
            "Common symbols mapped to common glyphs for hiding addresses in text",
        )
    }

    pub fn with_clusters(mut self, clusters: ConfusableClusters) -> Self {
        self.clusters = clusters;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn priority(&self) -> &[char] {
        &self.priority
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Build a mapping from `primary`, topping up from `secondary`.
    pub fn build(&self, primary: &[Candidate], secondary: &[Candidate]) -> BuildOutcome {
        let needed = self.priority.len().min(RADIX);
        let mut picker = Picker::new(&self.clusters);

        let mut chosen: Vec<Candidate> = Vec::with_capacity(needed);
        for c in sorted(primary) {
            if chosen.len() == needed {
                break;
            }
            if picker.accept(c) {
                chosen.push(c.clone());
            }
        }
        let assigned = chosen.len();

        for c in sorted(secondary) {
            if chosen.len() == needed {
                break;
            }
            if picker.accept(c) {
                let mut c = c.clone();
                if self.policy == Policy::MaximizeCommonness {
                    c.rank = Rank::UsageTier(BACKFILL_TIER);
                }
                chosen.push(c);
            }
        }
        let backfilled = chosen.len() - assigned;

        let mut document = MappingDocument::new(self.alphabet.clone(), self.policy.strategy());
        document.description = self.description.clone();
        document.priority_order = self.priority.iter().copied().take(needed).collect();
        for ((symbol, candidate), priority) in self.priority.iter().zip(&chosen).zip(1u32..) {
            document.mapping.insert(
                *symbol,
                MappingEntry::new(
                    candidate.glyph.clone(),
                    candidate.name.clone(),
                    candidate.rank,
                    priority,
                ),
            );
        }
        let missing: Vec<char> = self.priority.iter().copied().skip(chosen.len()).collect();

        tracing::info!(
            strategy = %self.policy.strategy(),
            assigned,
            backfilled,
            skipped = picker.skipped,
            missing = missing.len(),
            "built glyph mapping"
        );
        if !missing.is_empty() {
            tracing::warn!(
                missing = %missing.iter().collect::<String>(),
                "not enough candidates to cover every symbol"
            );
        }

        BuildOutcome {
            document,
            assigned,
            backfilled,
            missing,
        }
    }
}

/// Steganographic candidates from the bundled catalog, plus name-pattern
/// clusters over them.
pub fn catalog_candidates(catalog: &[CommonGlyph]) -> (Vec<Candidate>, ConfusableClusters) {
    let candidates: Vec<Candidate> = catalog.iter().map(Candidate::from).collect();
    let mut clusters = ConfusableClusters::new();
    for pattern in CONFUSABLE_NAME_PATTERNS {
        clusters.add_name_pattern(pattern, &candidates);
    }
    (candidates, clusters)
}

fn sorted(pool: &[Candidate]) -> Vec<&Candidate> {
    let mut out: Vec<&Candidate> = pool.iter().collect();
    out.sort_by(|a, b| a.sort_key().total_cmp(&b.sort_key()));
    out
}

/// Tracks used glyphs and clusters while walking the pools.
struct Picker<'a> {
    clusters: &'a ConfusableClusters,
    used_glyphs: HashSet<String>,
    used_clusters: HashSet<usize>,
    skipped: usize,
}

impl<'a> Picker<'a> {
    fn new(clusters: &'a ConfusableClusters) -> Self {
        Self {
            clusters,
            used_glyphs: HashSet::new(),
            used_clusters: HashSet::new(),
            skipped: 0,
        }
    }

    fn accept(&mut self, c: &Candidate) -> bool {
        if c.glyph == PLACEHOLDER_GLYPH || !is_standalone(&c.glyph) {
            tracing::warn!(glyph = %c.glyph, name = %c.name, "candidate is not a standalone glyph");
            self.skipped += 1;
            return false;
        }
        if self.used_glyphs.contains(&c.glyph) {
            self.skipped += 1;
            return false;
        }
        if let Some(cluster) = self.clusters.cluster_of(&c.glyph) {
            if !self.used_clusters.insert(cluster) {
                tracing::debug!(glyph = %c.glyph, "dropping confusable candidate");
                self.skipped += 1;
                return false;
            }
        }
        self.used_glyphs.insert(c.glyph.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::catalog::common_glyphs;

    /// `n` distinct glyphs from U+1F400 with rising scores.
    fn ranked_pool(n: u32, offset: u32) -> Vec<Candidate> {
        (0..n)
            .map(|i| {
                let glyph = char::from_u32(0x1F400 + offset + i).unwrap().to_string();
                Candidate::new(
                    glyph,
                    format!("glyph {i}"),
                    Rank::Distinctiveness(0.1 + f64::from(i) / 100.0),
                )
            })
            .collect()
    }

    fn pair(a: &Candidate, b: &Candidate) -> ConfusablePair {
        ConfusablePair {
            first: a.glyph.clone(),
            second: b.glyph.clone(),
            score: 0.01,
        }
    }

    #[test]
    fn priority_is_normalized() {
        let b = MappingBuilder::new(
            NumeralAlphabet::BITCOIN,
            Policy::MaximizeDistinctiveness,
            &['z', '0', 'z', '1'],
        );
        assert_eq!(b.priority().len(), 58);
        assert_eq!(&b.priority()[..3], &['z', '1', '2']);
    }

    #[test]
    fn most_important_symbol_gets_best_candidate() {
        let mut pool = ranked_pool(60, 0);
        pool.reverse();
        let outcome = MappingBuilder::distinct(NumeralAlphabet::BITCOIN).build(&pool, &[]);
        assert!(outcome.is_complete());
        assert_eq!(outcome.assigned, 58);
        let first = &outcome.document.mapping[&'1'];
        assert_eq!(first.glyph, "\u{1F400}");
        assert_eq!(first.priority, 1);
        assert_eq!(outcome.document.mapping[&'3'].priority, 2);
        assert_eq!(outcome.document.mapping_strategy, MappingStrategy::Distinct);
        assert!(outcome.into_bijection().is_ok());
    }

    #[test]
    fn confusable_cluster_keeps_first_seen() {
        let pool = ranked_pool(61, 0);
        let clusters =
            ConfusableClusters::from_pairs(&[pair(&pool[0], &pool[1]), pair(&pool[1], &pool[2])]);
        let outcome = MappingBuilder::distinct(NumeralAlphabet::BITCOIN)
            .with_clusters(clusters)
            .build(&pool, &[]);
        let glyphs: HashSet<&str> = outcome
            .document
            .mapping
            .values()
            .map(|e| e.glyph.as_str())
            .collect();
        assert!(glyphs.contains(pool[0].glyph.as_str()));
        assert!(!glyphs.contains(pool[1].glyph.as_str()));
        assert!(!glyphs.contains(pool[2].glyph.as_str()));
        assert!(outcome.is_complete());
    }

    #[test]
    fn candidates_that_merge_with_neighbours_are_skipped() {
        let mut pool = vec![
            Candidate::new("\u{1F3FB}", "skin tone", Rank::Distinctiveness(0.0)),
            Candidate::new("🐱\u{200D}", "trailing joiner", Rank::Distinctiveness(0.0)),
        ];
        pool.extend(ranked_pool(58, 0));
        let outcome = MappingBuilder::distinct(NumeralAlphabet::BITCOIN).build(&pool, &[]);
        assert!(outcome.is_complete());
        assert_eq!(outcome.document.mapping[&'1'].glyph, "\u{1F400}");
        assert!(outcome.into_bijection().is_ok());
    }

    #[test]
    fn clusters_are_transitive() {
        let mut c = ConfusableClusters::new();
        c.union("a", "b");
        c.union("c", "d");
        assert!(!c.same_cluster("a", "c"));
        c.union("b", "d");
        assert!(c.same_cluster("a", "c"));
        assert_eq!(c.cluster_of("zz"), None);
    }

    #[test]
    fn short_pool_reports_missing_symbols() {
        let outcome =
            MappingBuilder::distinct(NumeralAlphabet::BITCOIN).build(&ranked_pool(50, 0), &[]);
        assert_eq!(outcome.assigned, 50);
        assert_eq!(outcome.missing.len(), 8);
        assert_eq!(outcome.document.mapping.len(), 50);
        assert!(matches!(
            outcome.into_bijection(),
            Err(MappingError::InsufficientCandidates {
                needed: 58,
                available: 50
            })
        ));
    }

    #[test]
    fn catalog_alone_is_short_after_heart_clustering() {
        let (candidates, clusters) = catalog_candidates(common_glyphs());
        let outcome = MappingBuilder::steganographic(NumeralAlphabet::BITCOIN)
            .with_clusters(clusters)
            .build(&candidates, &[]);
        assert_eq!(outcome.assigned, 55);
        assert_eq!(outcome.missing.len(), 3);
        let hearts = outcome
            .document
            .mapping
            .values()
            .filter(|e| e.name.contains("heart"))
            .count();
        assert_eq!(hearts, 1);
        assert_eq!(outcome.document.mapping[&'1'].glyph, "\u{1F602}");
        assert_eq!(outcome.document.mapping[&'3'].glyph, "\u{2764}\u{FE0F}");
    }

    #[test]
    fn backfill_completes_stego_mapping() {
        let (candidates, clusters) = catalog_candidates(common_glyphs());
        // Secondary pool repeats a catalog glyph first; it must be skipped.
        let mut secondary = vec![Candidate::new(
            "\u{1F602}",
            "face with tears of joy",
            Rank::Distinctiveness(0.0),
        )];
        secondary.extend(ranked_pool(5, 0x100));
        let outcome = MappingBuilder::steganographic(NumeralAlphabet::BITCOIN)
            .with_clusters(clusters)
            .build(&candidates, &secondary);
        assert!(outcome.is_complete());
        assert_eq!(outcome.backfilled, 3);
        let last = outcome.document.mapping.values().max_by_key(|e| e.priority).unwrap();
        assert_eq!(last.priority, 58);
        assert_eq!(last.usage_tier, Some(BACKFILL_TIER));
        let bij = outcome.into_bijection().unwrap();
        assert_eq!(bij.strategy(), MappingStrategy::Steganographic);
    }

    #[test]
    fn build_is_deterministic() {
        let pool = ranked_pool(70, 0);
        let b = MappingBuilder::distinct(NumeralAlphabet::BITCOIN);
        assert_eq!(b.build(&pool, &[]).document, b.build(&pool, &[]).document);
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let pool = vec![
            Candidate::new("\u{1F431}", "cat", Rank::UsageTier(1)),
            Candidate::new("\u{1F355}", "pizza", Rank::UsageTier(1)),
        ];
        let outcome = MappingBuilder::steganographic(NumeralAlphabet::BITCOIN).build(&pool, &[]);
        assert_eq!(outcome.document.mapping[&'1'].glyph, "\u{1F431}");
        assert_eq!(outcome.document.mapping[&'3'].glyph, "\u{1F355}");
    }

    #[test]
    fn multi_cluster_candidates_are_skipped() {
        let mut pool = vec![Candidate::new("🐱🐶", "two glyphs", Rank::Distinctiveness(0.0))];
        pool.extend(ranked_pool(58, 0));
        let outcome = MappingBuilder::distinct(NumeralAlphabet::BITCOIN).build(&pool, &[]);
        assert!(outcome.is_complete());
        assert_eq!(outcome.document.mapping[&'1'].glyph, "\u{1F400}");
    }
}
