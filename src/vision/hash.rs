//! Perceptual hashing.
//!
//! Each glyph image is normalized (RGBA, fixed square size, Lanczos3), turned
//! to grayscale, and hashed with four families. Every family yields
//! `hash_size²` bits (64 by default):
//!
//! | family | grid | bit set when |
//! |---|---|---|
//! | difference | (n+1)×n | pixel brighter than its left neighbour |
//! | perceptual | 4n×4n → DCT-II, top-left n×n | coefficient above the median |
//! | average | n×n | pixel above the mean |
//! | wavelet | Haar low-pass down to n×n | coefficient above the median |
//!
//! Hashing is deterministic for identical pixels. Two renderings of the same
//! glyph from different vendors can still hash apart.

use std::f64::consts::PI;
use std::fmt;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, RgbaImage};
use serde::{Deserialize, Serialize};

use super::{HashError, HashResult};

// ---------------------------------------------------------------------------
// Bit vectors
// ---------------------------------------------------------------------------

/// Fixed-width bit vector, packed MSB-first into bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HashBits {
    data: Vec<u8>,
    bits: usize,
}

impl HashBits {
    /// All-zero vector of `bits` bits.
    pub fn zeros(bits: usize) -> Self {
        Self {
            data: vec![0u8; bits.div_ceil(8)],
            bits,
        }
    }

    /// Build from a bit predicate evaluated for every index.
    pub fn from_fn(bits: usize, mut f: impl FnMut(usize) -> bool) -> Self {
        let mut out = Self::zeros(bits);
        for i in 0..bits {
            if f(i) {
                out.set_bit(i, true);
            }
        }
        out
    }

    /// Width in bits.
    pub fn bits(&self) -> usize {
        self.bits
    }

    pub fn get_bit(&self, index: usize) -> bool {
        debug_assert!(index < self.bits);
        (self.data[index / 8] >> (7 - index % 8)) & 1 == 1
    }

    pub fn set_bit(&mut self, index: usize, value: bool) {
        debug_assert!(index < self.bits);
        let mask = 1u8 << (7 - index % 8);
        if value {
            self.data[index / 8] |= mask;
        } else {
            self.data[index / 8] &= !mask;
        }
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> u32 {
        self.data.iter().map(|b| b.count_ones()).sum()
    }

    /// Number of differing bits. Both vectors must have the same width.
    pub fn hamming(&self, other: &HashBits) -> u32 {
        debug_assert_eq!(self.bits, other.bits);
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| (a ^ b).count_ones())
            .sum()
    }

    /// Lowercase hex of the packed bytes.
    pub fn to_hex(&self) -> String {
        crate::error::hex(&self.data)
    }
}

impl fmt::Display for HashBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Families and fingerprints
// ---------------------------------------------------------------------------

/// A perceptual-hash family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashFamily {
    Difference,
    Perceptual,
    Average,
    Wavelet,
}

impl HashFamily {
    pub const ALL: [HashFamily; 4] = [
        HashFamily::Difference,
        HashFamily::Perceptual,
        HashFamily::Average,
        HashFamily::Wavelet,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Short conventional name (`dhash`, `phash`, ...).
    pub fn short_name(self) -> &'static str {
        match self {
            HashFamily::Difference => "dhash",
            HashFamily::Perceptual => "phash",
            HashFamily::Average => "ahash",
            HashFamily::Wavelet => "whash",
        }
    }
}

impl fmt::Display for HashFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// One hash per family for a single image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    hashes: [HashBits; 4],
}

impl Fingerprint {
    /// Hashes in [`HashFamily::ALL`] order.
    pub fn new(hashes: [HashBits; 4]) -> Self {
        Self { hashes }
    }

    pub fn get(&self, family: HashFamily) -> &HashBits {
        &self.hashes[family.index()]
    }

    /// `(family, hash)` pairs in [`HashFamily::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (HashFamily, &HashBits)> {
        HashFamily::ALL.into_iter().zip(self.hashes.iter())
    }
}

// ---------------------------------------------------------------------------
// Hasher
// ---------------------------------------------------------------------------

/// Normalizes images and computes fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerceptualHasher {
    hash_size: u32,
    image_size: u32,
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self {
            hash_size: 8,
            image_size: 64,
        }
    }
}

impl PerceptualHasher {
    /// # Errors
    /// - `Geometry` if `hash_size < 2` or `hash_size > image_size`.
    pub fn new(hash_size: u32, image_size: u32) -> HashResult<Self> {
        if hash_size < 2 || hash_size > image_size {
            return Err(HashError::Geometry {
                hash_size,
                image_size,
            });
        }
        Ok(Self {
            hash_size,
            image_size,
        })
    }

    pub fn hash_size(&self) -> u32 {
        self.hash_size
    }

    pub fn image_size(&self) -> u32 {
        self.image_size
    }

    /// Bits per family hash.
    pub fn bits(&self) -> usize {
        (self.hash_size * self.hash_size) as usize
    }

    /// Convert to RGBA and resize to the normalized square.
    pub fn normalize(&self, image: &DynamicImage) -> RgbaImage {
        let rgba = image.to_rgba8();
        if rgba.dimensions() == (self.image_size, self.image_size) {
            return rgba;
        }
        imageops::resize(&rgba, self.image_size, self.image_size, FilterType::Lanczos3)
    }

    /// Fingerprint an already-normalized image.
    pub fn fingerprint(&self, normalized: &RgbaImage) -> Fingerprint {
        let gray = imageops::grayscale(normalized);
        Fingerprint::new(HashFamily::ALL.map(|family| self.hash_gray(family, &gray)))
    }

    /// Normalize then fingerprint.
    pub fn fingerprint_image(&self, image: &DynamicImage) -> Fingerprint {
        self.fingerprint(&self.normalize(image))
    }

    /// One family's hash of a grayscale image.
    pub fn hash_gray(&self, family: HashFamily, gray: &GrayImage) -> HashBits {
        match family {
            HashFamily::Difference => self.difference_hash(gray),
            HashFamily::Perceptual => self.perceptual_hash(gray),
            HashFamily::Average => self.average_hash(gray),
            HashFamily::Wavelet => self.wavelet_hash(gray),
        }
    }

    fn difference_hash(&self, gray: &GrayImage) -> HashBits {
        let n = self.hash_size as usize;
        let grid = sample(gray, self.hash_size + 1, self.hash_size);
        let width = n + 1;
        HashBits::from_fn(n * n, |i| {
            let (row, col) = (i / n, i % n);
            grid[row * width + col + 1] > grid[row * width + col]
        })
    }

    fn average_hash(&self, gray: &GrayImage) -> HashBits {
        let grid = sample(gray, self.hash_size, self.hash_size);
        let mean = grid.iter().sum::<f64>() / grid.len() as f64;
        HashBits::from_fn(grid.len(), |i| grid[i] > mean)
    }

    fn perceptual_hash(&self, gray: &GrayImage) -> HashBits {
        let n = self.hash_size as usize;
        let side = self.hash_size * 4;
        let grid = sample(gray, side, side);
        let low = dct_low_frequencies(&grid, side as usize, n);
        let med = median(&low);
        HashBits::from_fn(low.len(), |i| low[i] > med)
    }

    fn wavelet_hash(&self, gray: &GrayImage) -> HashBits {
        let mut side = self.hash_size;
        while side * 2 <= self.image_size {
            side *= 2;
        }
        let mut grid = sample(gray, side, side);
        let mut n = side as usize;
        while n > self.hash_size as usize {
            grid = haar_low_pass(&grid, n);
            n /= 2;
        }
        let med = median(&grid);
        HashBits::from_fn(grid.len(), |i| grid[i] > med)
    }
}

/// Resize to `width × height` (Lanczos3) and read row-major intensities.
fn sample(gray: &GrayImage, width: u32, height: u32) -> Vec<f64> {
    let resized;
    let source = if gray.dimensions() == (width, height) {
        gray
    } else {
        resized = imageops::resize(gray, width, height, FilterType::Lanczos3);
        &resized
    };
    source.pixels().map(|p| f64::from(p.0[0])).collect()
}

/// Unnormalized 2-D DCT-II of an `n × n` grid, keeping the top-left
/// `keep × keep` coefficients. Row-major output.
fn dct_low_frequencies(grid: &[f64], n: usize, keep: usize) -> Vec<f64> {
    let cos: Vec<f64> = (0..keep)
        .flat_map(|k| {
            (0..n).map(move |i| (PI * k as f64 * (2 * i + 1) as f64 / (2 * n) as f64).cos())
        })
        .collect();

    // Along columns: cols[k][x] = Σ_y grid[y][x]·cos[k][y]
    let mut cols = vec![0.0f64; keep * n];
    for k in 0..keep {
        for y in 0..n {
            let c = cos[k * n + y];
            for x in 0..n {
                cols[k * n + x] += c * grid[y * n + x];
            }
        }
    }

    // Along rows.
    let mut out = vec![0.0f64; keep * keep];
    for k in 0..keep {
        for l in 0..keep {
            out[k * keep + l] = (0..n).map(|x| cols[k * n + x] * cos[l * n + x]).sum();
        }
    }
    out
}

/// One Haar level: average each 2×2 block of an `n × n` grid.
fn haar_low_pass(grid: &[f64], n: usize) -> Vec<f64> {
    let half = n / 2;
    let mut out = Vec::with_capacity(half * half);
    for row in 0..half {
        for col in 0..half {
            let (y, x) = (row * 2, col * 2);
            let sum = grid[y * n + x]
                + grid[y * n + x + 1]
                + grid[(y + 1) * n + x]
                + grid[(y + 1) * n + x + 1];
            out.push(sum / 4.0);
        }
    }
    out
}

/// Median; the mean of the two middle values for even lengths.
fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
