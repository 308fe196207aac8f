//! Similarity engine: composite distances, confusable pairs, distinctiveness.
//!
//! The composite distance of two glyphs is the mean, across hash families, of
//! the normalized Hamming distance of their hashes (0 = identical,
//! 1 = every bit differs). Pair evaluation is quadratic and runs on the rayon
//! pool, one row of the upper triangle per task.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::hash::{Fingerprint, HashBits};
use super::pool::{CandidateGlyph, FingerprintedGlyph};
use super::{SimilarityError, SimilarityResult};

/// Pairs scoring below this are confusable.
pub const DEFAULT_CONFUSABLE_THRESHOLD: f64 = 0.15;

/// Normalized Hamming distance of two same-width hashes, in `[0, 1]`.
pub fn distance(a: &HashBits, b: &HashBits) -> f64 {
    let bits = a.bits().max(b.bits());
    if bits == 0 {
        return 0.0;
    }
    f64::from(a.hamming(b)) / bits as f64
}

/// Mean [`distance`] across all hash families.
pub fn pairwise_similarity(a: &Fingerprint, b: &Fingerprint) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for ((_, ha), (_, hb)) in a.iter().zip(b.iter()) {
        sum += distance(ha, hb);
        count += 1;
    }
    if count == 0 { 0.0 } else { sum / count as f64 }
}

// ---------------------------------------------------------------------------
// Scoring seam
// ---------------------------------------------------------------------------

/// Anything that can score pairs of labelled glyphs.
///
/// `score(i, j)` must equal `score(j, i)`.
pub trait PairScorer: Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn label(&self, index: usize) -> &str;

    /// Composite distance of glyphs `i` and `j`.
    fn score(&self, i: usize, j: usize) -> f64;
}

impl PairScorer for [FingerprintedGlyph] {
    fn len(&self) -> usize {
        <[FingerprintedGlyph]>::len(self)
    }

    fn label(&self, index: usize) -> &str {
        &self[index].candidate.glyph
    }

    fn score(&self, i: usize, j: usize) -> f64 {
        pairwise_similarity(&self[i].fingerprint, &self[j].fingerprint)
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Receives coarse progress from long batch computations. Called from worker
/// threads.
pub trait ProgressSink: Send + Sync {
    fn report(&self, stage: &str, done: usize, total: usize);
}

/// Logs progress with `tracing` each time another `step_percent` completes.
#[derive(Debug)]
pub struct LogProgress {
    step_percent: usize,
    last_bucket: AtomicUsize,
}

impl LogProgress {
    pub fn new(step_percent: usize) -> Self {
        Self {
            step_percent: step_percent.clamp(1, 100),
            last_bucket: AtomicUsize::new(0),
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ProgressSink for LogProgress {
    fn report(&self, stage: &str, done: usize, total: usize) {
        if total == 0 {
            return;
        }
        let percent = done * 100 / total;
        let bucket = percent / self.step_percent;
        if bucket > self.last_bucket.fetch_max(bucket, Ordering::Relaxed) {
            tracing::info!(stage, done, total, percent, "progress");
        }
    }
}

/// Discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _stage: &str, _done: usize, _total: usize) {}
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Two glyphs whose composite distance is below the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusablePair {
    #[serde(rename = "emoji1")]
    pub first: String,
    #[serde(rename = "emoji2")]
    pub second: String,
    #[serde(rename = "similarity")]
    pub score: f64,
}

/// A candidate with its distinctiveness score, as written to the
/// top-candidates report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    #[serde(rename = "emoji", alias = "glyph")]
    pub glyph: String,
    pub name: String,
    #[serde(default)]
    pub codepoint: String,
    pub distinctiveness: f64,
}

/// Output of [`SimilarityEngine::analyze`].
#[derive(Debug, Clone)]
pub struct PoolAnalysis {
    /// Every confusable pair, most confusable first. Never truncated, since
    /// mapping builds derive their confusable clusters from it.
    pub pairs: Vec<ConfusablePair>,
    pub scores: HashMap<String, f64>,
    /// Best `keep` candidates by ascending score.
    pub top: Vec<RankedCandidate>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Pairwise analysis over a candidate pool.
#[derive(Clone)]
pub struct SimilarityEngine {
    threshold: f64,
    progress: Arc<dyn ProgressSink>,
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CONFUSABLE_THRESHOLD)
    }
}

impl std::fmt::Debug for SimilarityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityEngine")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl SimilarityEngine {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            progress: Arc::new(LogProgress::default()),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Every unordered pair scoring strictly below the threshold, most
    /// confusable first. Ties are ordered by label bytes.
    pub fn find_confusable_pairs<S: PairScorer + ?Sized>(&self, pool: &S) -> Vec<ConfusablePair> {
        let n = pool.len();
        let total = n * n.saturating_sub(1) / 2;
        let done = AtomicUsize::new(0);

        let mut pairs: Vec<ConfusablePair> = (0..n)
            .into_par_iter()
            .flat_map_iter(|i| {
                let row: Vec<ConfusablePair> = (i + 1..n)
                    .filter_map(|j| {
                        let score = pool.score(i, j);
                        (score < self.threshold).then(|| ConfusablePair {
                            first: pool.label(i).to_string(),
                            second: pool.label(j).to_string(),
                            score,
                        })
                    })
                    .collect();
                let now = done.fetch_add(n - i - 1, Ordering::Relaxed) + (n - i - 1);
                self.progress.report("pairwise", now, total);
                row
            })
            .collect();

        pairs.sort_by(|a, b| {
            a.score
                .total_cmp(&b.score)
                .then_with(|| a.first.as_bytes().cmp(b.first.as_bytes()))
                .then_with(|| a.second.as_bytes().cmp(b.second.as_bytes()))
        });

        tracing::info!(
            glyphs = n,
            comparisons = total,
            confusable = pairs.len(),
            threshold = self.threshold,
            "confusable pair search complete"
        );
        pairs
    }

    /// Per glyph, the mean composite score ([`pairwise_similarity`]) to every
    /// other glyph. Candidates are ranked on it in ascending order. A glyph
    /// with no neighbours scores 0.
    pub fn distinctiveness_scores<S: PairScorer + ?Sized>(&self, pool: &S) -> HashMap<String, f64> {
        let n = pool.len();
        let done = AtomicUsize::new(0);

        let scores: HashMap<String, f64> = (0..n)
            .into_par_iter()
            .map(|i| {
                let others = n - 1;
                let mean = if others == 0 {
                    0.0
                } else {
                    let sum: f64 = (0..n)
                        .filter(|&j| j != i)
                        .map(|j| pool.score(i, j))
                        .sum();
                    sum / others as f64
                };
                let now = done.fetch_add(1, Ordering::Relaxed) + 1;
                self.progress.report("distinctiveness", now, n);
                (pool.label(i).to_string(), mean)
            })
            .collect();

        tracing::info!(glyphs = scores.len(), "distinctiveness scores computed");
        scores
    }
}

impl SimilarityEngine {
    /// Confusable pairs, distinctiveness scores and the `keep` best
    /// candidates of a fingerprinted pool.
    pub fn analyze(&self, pool: &[FingerprintedGlyph], keep: usize) -> PoolAnalysis {
        let pairs = self.find_confusable_pairs(pool);
        let scores = self.distinctiveness_scores(pool);
        let survivors: Vec<CandidateGlyph> = pool.iter().map(|g| g.candidate.clone()).collect();
        let top = select_top_candidates(&survivors, &scores, keep);
        PoolAnalysis { pairs, scores, top }
    }
}

/// Keep the `n` candidates with the lowest distinctiveness score. Equal
/// scores are ordered by glyph bytes. Candidates without a score are dropped.
pub fn select_top_candidates(
    candidates: &[CandidateGlyph],
    scores: &HashMap<String, f64>,
    n: usize,
) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = candidates
        .iter()
        .filter_map(|c| {
            scores.get(&c.glyph).map(|&distinctiveness| RankedCandidate {
                glyph: c.glyph.clone(),
                name: c.name.clone(),
                codepoint: c.codepoint.clone(),
                distinctiveness,
            })
        })
        .collect();
    ranked.sort_by(|a, b| {
        a.distinctiveness
            .total_cmp(&b.distinctiveness)
            .then_with(|| a.glyph.as_bytes().cmp(b.glyph.as_bytes()))
    });
    ranked.truncate(n);

    if let (Some(first), Some(last)) = (ranked.first(), ranked.last()) {
        tracing::info!(
            selected = ranked.len(),
            best = %first.glyph,
            best_score = first.distinctiveness,
            worst = %last.glyph,
            worst_score = last.distinctiveness,
            "selected top candidates"
        );
    }
    ranked
}

/// Write any serializable report as pretty UTF-8 JSON.
pub fn save_report<T: Serialize + ?Sized>(path: &Path, report: &T) -> SimilarityResult<()> {
    let write_err = |message: String| SimilarityError::Write {
        path: path.display().to_string(),
        message,
    };
    let json = serde_json::to_string_pretty(report).map_err(|e| write_err(e.to_string()))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
    }
    std::fs::write(path, json).map_err(|e| write_err(e.to_string()))
}

/// Read a JSON report written by [`save_report`].
pub fn load_report<T: DeserializeOwned>(path: &Path) -> SimilarityResult<T> {
    let content = std::fs::read_to_string(path).map_err(|e| SimilarityError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| SimilarityError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
