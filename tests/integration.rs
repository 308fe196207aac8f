//! End-to-end tests for glyph58.
//!
//! These exercise the persisted mapping, the substitution codec and the
//! analysis pipeline together, from synthetic glyph images through to a
//! built mapping file.

use std::sync::Arc;

use hex_literal::hex;
use image::{Rgba, RgbaImage};
use rand::{Rng, SeedableRng};

use glyph58::builder::{Candidate, ConfusableClusters, MappingBuilder, catalog_candidates};
use glyph58::codec::{ExtractOutcome, ScanOutcome, SubstitutionCodec};
use glyph58::error::NumeralError;
use glyph58::glyph::catalog::common_glyphs;
use glyph58::glyph::{EmojiRangeExtractor, PLACEHOLDER_GLYPH};
use glyph58::mapping::{Bijection, MappingDocument, MappingEntry, MappingStrategy, Rank};
use glyph58::numeral::{self, NumeralAlphabet};
use glyph58::vision::pool::{filter_problematic, fingerprint_pool, load_candidates};
use glyph58::vision::similarity::{NoProgress, load_report, save_report, select_top_candidates};
use glyph58::vision::{CandidateGlyph, PerceptualHasher, RankedCandidate, SimilarityEngine};

const SATOSHI: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";

fn animal_glyph(i: u32) -> String {
    char::from_u32(0x1F400 + i).unwrap().to_string()
}

fn distinct_codec() -> SubstitutionCodec {
    let pool: Vec<Candidate> = (0..58)
        .map(|i| {
            Candidate::new(
                animal_glyph(i),
                format!("animal {i}"),
                Rank::Distinctiveness(0.2 + f64::from(i) / 1000.0),
            )
        })
        .collect();
    let bijection = MappingBuilder::distinct(NumeralAlphabet::BITCOIN)
        .build(&pool, &[])
        .into_bijection()
        .unwrap();
    SubstitutionCodec::new(bijection)
}

fn stego_codec() -> SubstitutionCodec {
    let (common, clusters) = catalog_candidates(common_glyphs());
    let backfill: Vec<Candidate> = (0..8)
        .map(|i| Candidate::new(animal_glyph(i), format!("animal {i}"), Rank::Distinctiveness(0.5)))
        .collect();
    let bijection = MappingBuilder::steganographic(NumeralAlphabet::BITCOIN)
        .with_clusters(clusters)
        .build(&common, &backfill)
        .into_bijection()
        .unwrap();
    SubstitutionCodec::new(bijection)
}

#[test]
fn satoshi_payload_encodes_to_known_address() {
    let payload = hex!("0062e907b15cbf27d5425399ebf6f0fb50ebb88f18");
    assert_eq!(numeral::encode_check(&payload), SATOSHI);
    assert_eq!(numeral::decode_check(SATOSHI).unwrap(), payload.to_vec());
}

#[test]
fn known_address_is_valid_and_last_symbol_change_is_not() {
    let codec = distinct_codec();
    assert!(codec.validate(SATOSHI).is_ok());

    let alphabet = NumeralAlphabet::BITCOIN;
    let head = &SATOSHI[..SATOSHI.len() - 1];
    for symbol in alphabet.symbols().filter(|&c| c != 'a') {
        let altered = format!("{head}{symbol}");
        assert!(
            matches!(codec.validate(&altered), Err(NumeralError::ChecksumMismatch { .. })),
            "{altered} should fail the checksum"
        );
    }
}

#[test]
fn excluded_lookalikes_are_invalid_symbols() {
    let codec = distinct_codec();
    for bad in ['0', 'O', 'I', 'l'] {
        let address = format!("1{bad}1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa");
        assert_eq!(
            codec.validate(&address),
            Err(NumeralError::InvalidSymbol {
                symbol: bad,
                position: 1
            })
        );
    }
}

#[test]
fn validation_does_not_depend_on_mapping() {
    let distinct = distinct_codec();
    let stego = stego_codec();
    let inputs = [
        SATOSHI,
        "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNb",
        "1BitcoinEaterAddressDontSendf59kuE",
        "3J98t1WpEZ73CNmYviecrnyiWrnqRhWNLy",
        "0OIl",
        "2g",
        "",
    ];
    for input in inputs {
        assert_eq!(distinct.validate(input), stego.validate(input), "{input}");
    }
}

#[test]
fn random_addresses_round_trip_through_both_mappings() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(58);
    let codecs = [distinct_codec(), stego_codec()];
    for _ in 0..200 {
        let len = rng.gen_range(1..=40);
        let mut payload: Vec<u8> = (0..len).map(|_| rng.r#gen()).collect();
        if rng.gen_bool(0.3) {
            payload[0] = 0;
        }
        let address = numeral::encode_check(&payload);
        for codec in &codecs {
            let encoded = codec.encode(&address);
            assert!(encoded.all_mapped());
            let decoded = codec.decode(&encoded.glyphs);
            assert!(decoded.all_mapped());
            assert_eq!(decoded.address, address);
            assert_eq!(codec.scan(&encoded.glyphs).outcome, ScanOutcome::Valid);
        }
    }
}

#[test]
fn placeholder_in_glyphs_skips_validation() {
    let codec = stego_codec();
    let glyphs = codec.encode("1A1zP1eP5QGefi2DMPTfTL5SLmv7Div0Na").glyphs;
    assert!(glyphs.contains(PLACEHOLDER_GLYPH));
    let report = codec.scan(&glyphs);
    assert!(!report.decode_succeeded);
    assert!(!report.checksum_valid);
    assert_eq!(report.outcome, ScanOutcome::Undecodable);
    assert!(report.address.contains('?'));
}

#[test]
fn stego_address_hidden_in_a_message() {
    let codec = stego_codec();
    assert_eq!(codec.strategy(), MappingStrategy::Steganographic);
    let glyphs = codec.encode(SATOSHI).glyphs;
    let message = format!("happy birthday!! {glyphs} see you saturday");
    match codec.extract_and_scan(&message, &EmojiRangeExtractor) {
        ExtractOutcome::Scanned(report) => {
            assert!(report.checksum_valid);
            assert_eq!(report.address, SATOSHI);
        }
        ExtractOutcome::NothingFound => panic!("glyphs were not found"),
    }
    assert_eq!(
        codec.extract_and_scan("no glyphs at all", &EmojiRangeExtractor),
        ExtractOutcome::NothingFound
    );
}

#[test]
fn mapping_file_round_trip() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("data/base58_emoji_mapping_stego.json");

    let codec = stego_codec();
    let doc = codec.bijection().to_document();
    doc.save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"mapping_strategy\": \"steganographic\""));
    assert!(text.contains("😂"), "glyphs are written unescaped");

    let reloaded = SubstitutionCodec::load(&path).unwrap();
    assert_eq!(reloaded.encode(SATOSHI), codec.encode(SATOSHI));
}

#[test]
fn hand_edited_duplicate_is_rejected_on_load() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("mapping.json");

    let mut doc: MappingDocument = distinct_codec().bijection().to_document();
    let glyph = doc.mapping[&'1'].glyph.clone();
    doc.mapping.insert('z', MappingEntry::new(glyph, "dup", Rank::UsageTier(1), 58));
    doc.save(&path).unwrap();

    let err = Bijection::load(&path).unwrap_err();
    assert!(err.to_string().contains("assigned to both"));
}

/// Solid-color tile with a shape that depends on `variant`.
fn tile(variant: u32) -> RgbaImage {
    RgbaImage::from_fn(72, 72, |x, y| {
        let on = match variant % 6 {
            0 => x < 36,
            1 => y < 36,
            2 => (x / 12 + y / 12) % 2 == 0,
            3 => (x as i32 - 36).pow(2) + (y as i32 - 36).pow(2) < 400,
            4 => x > y,
            _ => (x / 6) % 2 == 0,
        };
        let v = if on { 20 } else { 235 };
        Rgba([v, v, v, 255])
    })
}

#[test]
fn analysis_pipeline_to_mapping() {
    let dir = tempfile::TempDir::new().unwrap();
    let images = dir.path().join("images");
    std::fs::create_dir_all(&images).unwrap();

    // Six shapes; candidate 6 reuses shape 0 so the two are confusable.
    let mut metadata: Vec<CandidateGlyph> = (0..7)
        .map(|i| CandidateGlyph::new(animal_glyph(i), format!("animal {i}")))
        .collect();
    metadata.push(CandidateGlyph::new("\u{1F1FA}\u{1F1F8}", "flag: United States"));
    for (i, candidate) in metadata.iter().take(7).enumerate() {
        tile(i as u32 % 6).save(candidate.image_path(&images)).unwrap();
    }
    let metadata_path = dir.path().join("emoji_metadata.json");
    save_report(&metadata_path, &metadata).unwrap();

    let loaded = load_candidates(&metadata_path).unwrap();
    let filtered = filter_problematic(&loaded);
    assert_eq!(filtered.len(), 7);

    let hasher = PerceptualHasher::default();
    let pool = fingerprint_pool(&hasher, &images, &filtered, 5).unwrap();
    assert_eq!(pool.glyphs.len(), 7);
    assert!(pool.failures.is_empty());

    let engine = SimilarityEngine::default().with_progress(Arc::new(NoProgress));
    let pairs = engine.find_confusable_pairs(pool.glyphs.as_slice());
    assert_eq!(pairs[0].first, animal_glyph(0));
    assert_eq!(pairs[0].second, animal_glyph(6));
    assert_eq!(pairs[0].score, 0.0);

    let scores = engine.distinctiveness_scores(pool.glyphs.as_slice());
    assert_eq!(scores.len(), 7);
    let top = select_top_candidates(&filtered, &scores, 150);
    assert_eq!(top.len(), 7);

    let top_path = dir.path().join("top_candidates.json");
    save_report(&top_path, &top).unwrap();
    let ranked: Vec<RankedCandidate> = load_report(&top_path).unwrap();
    let ranked: Vec<Candidate> = ranked.iter().map(Candidate::from).collect();

    let outcome = MappingBuilder::distinct(NumeralAlphabet::BITCOIN)
        .with_clusters(ConfusableClusters::from_pairs(&pairs))
        .build(&ranked, &[]);
    assert!(!outcome.is_complete());
    let used: Vec<&str> = outcome.document.mapping.values().map(|e| e.glyph.as_str()).collect();
    let twins = used
        .iter()
        .filter(|g| **g == animal_glyph(0) || **g == animal_glyph(6))
        .count();
    assert_eq!(twins, 1, "only one of two identical glyphs may be used");
    assert!(outcome.into_bijection().is_err());
}
