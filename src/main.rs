//! glyph58 CLI: emoji glyph codec for Base58Check addresses.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use glyph58::builder::{Candidate, ConfusableClusters, MappingBuilder, catalog_candidates};
use glyph58::codec::{ExtractOutcome, ScanReport, SubstitutionCodec};
use glyph58::config::{DEFAULT_CONFIG_FILE, Glyph58Config};
use glyph58::glyph::catalog::common_glyphs;
use glyph58::glyph::{EmojiRangeExtractor, segment};
use glyph58::numeral::{self, NumeralAlphabet};
use glyph58::vision::pool;
use glyph58::vision::similarity::{self, LogProgress, SimilarityEngine};
use glyph58::vision::{ConfusablePair, RankedCandidate};

/// Symbols shown in the per-character table printed by `encode`.
const MAPPING_PREVIEW_LEN: usize = 20;

#[derive(Parser)]
#[command(name = "glyph58", version, about = "Emoji glyph codec for Base58Check addresses")]
struct Cli {
    /// Config file (defaults to ./glyph58.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Mapping selection shared by the codec subcommands.
#[derive(clap::Args)]
struct MappingArgs {
    /// Use the steganographic mapping.
    #[arg(long)]
    stego: bool,

    /// Mapping file, overriding the configured one.
    #[arg(long)]
    mapping: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a Base58 address as glyphs.
    Encode {
        address: String,
        #[command(flatten)]
        mapping: MappingArgs,
    },

    /// Decode glyphs back to a Base58 address.
    Decode {
        glyphs: String,
        #[command(flatten)]
        mapping: MappingArgs,
    },

    /// Decode glyphs and verify the Base58Check checksum.
    Scan {
        glyphs: String,
        #[command(flatten)]
        mapping: MappingArgs,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Verify the Base58Check checksum of an address.
    Validate { address: String },

    /// Find glyphs hidden in free text and scan them.
    Extract {
        text: String,
        #[command(flatten)]
        mapping: MappingArgs,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Fingerprint candidate glyph images and rank them by distinctiveness.
    Analyze {
        /// Emoji metadata JSON.
        #[arg(long)]
        metadata: Option<PathBuf>,
        /// Directory of cached glyph images.
        #[arg(long)]
        images_dir: Option<PathBuf>,
        /// Confusable threshold.
        #[arg(long)]
        threshold: Option<f64>,
        /// Number of ranked candidates to keep.
        #[arg(long)]
        candidates: Option<usize>,
    },

    /// Build a mapping file from ranked candidates (or the bundled catalog
    /// with `--stego`).
    Build {
        /// Build the steganographic mapping.
        #[arg(long)]
        stego: bool,
        /// Ranked candidates JSON written by `analyze`.
        #[arg(long)]
        candidates: Option<PathBuf>,
        /// Output mapping file.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Write a config file with every default spelled out.
    InitConfig {
        /// Destination.
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Glyph58Config::discover(cli.config.as_deref())?;

    match cli.command {
        Commands::Encode { address, mapping } => {
            let codec = load_codec(&config, &mapping)?;
            println!("Encoding Base58 address ({} mapping)", codec.strategy());
            if let Err(e) = codec.validate(&address) {
                println!("  warning: not a valid Base58Check address: {e}");
            }

            let encoded = codec.encode(&address);
            if encoded.all_mapped() {
                println!("  Encoding successful");
            } else {
                let unmapped: String = encoded.unmapped.iter().collect();
                println!("  Encoding completed with unmapped symbols: {unmapped}");
            }
            println!();
            println!("  Base58: {address}");
            println!("  Glyphs: {}", encoded.glyphs);
            println!();
            println!("  Symbol mapping:");
            let preview = address.chars().zip(segment(&encoded.glyphs));
            for (symbol, glyph) in preview.take(MAPPING_PREVIEW_LEN) {
                match codec.bijection().entry(symbol) {
                    Some(entry) => println!("    {symbol} → {glyph}  ({})", entry.name),
                    None => println!("    {symbol} → {glyph}  (unknown)"),
                }
            }
            let total = address.chars().count();
            if total > MAPPING_PREVIEW_LEN {
                println!("    ... ({} more)", total - MAPPING_PREVIEW_LEN);
            }
        }

        Commands::Decode { glyphs, mapping } => {
            let codec = load_codec(&config, &mapping)?;
            let decoded = codec.decode(&glyphs);
            if decoded.all_mapped() {
                println!("Decoding successful");
            } else {
                println!(
                    "Decoding completed with {} unmapped glyph(s): {}",
                    decoded.unmapped.len(),
                    decoded.unmapped.concat()
                );
            }
            println!("  Glyphs: {glyphs}");
            println!("  Base58: {}", decoded.address);
        }

        Commands::Scan {
            glyphs,
            mapping,
            json,
        } => {
            let codec = load_codec(&config, &mapping)?;
            let report = codec.scan(&glyphs);
            print_report(&report, json)?;
        }

        Commands::Validate { address } => {
            let bytes = numeral::decode(&address)?;
            numeral::verify_checksum(&bytes)?;
            println!("Valid Base58Check address");
            println!("  Address: {address}");
            println!("  Version: 0x{:02x}", bytes[0]);
            println!("  Bytes:   {}", bytes.len());
        }

        Commands::Extract {
            text,
            mapping,
            json,
        } => {
            let codec = load_codec(&config, &mapping)?;
            match codec.extract_and_scan(&text, &EmojiRangeExtractor) {
                ExtractOutcome::NothingFound => println!("No glyphs found in text"),
                ExtractOutcome::Scanned(report) => print_report(&report, json)?,
            }
        }

        Commands::Analyze {
            metadata,
            images_dir,
            threshold,
            candidates,
        } => {
            let metadata = metadata.unwrap_or_else(|| config.metadata_file.clone());
            let images_dir = images_dir.unwrap_or_else(|| config.images_dir.clone());
            let threshold = threshold.unwrap_or(config.confusable_threshold);
            let keep = candidates.unwrap_or(config.candidate_count);
            analyze(&config, &metadata, &images_dir, threshold, keep)?;
        }

        Commands::Build {
            stego,
            candidates,
            output,
        } => {
            let candidates = candidates.unwrap_or_else(|| config.top_candidates_file.clone());
            let output = output.unwrap_or_else(|| config.mapping_path(stego).to_path_buf());
            build(&config, stego, &candidates, &output)?;
        }

        Commands::InitConfig { path } => {
            Glyph58Config::default().save(&path)?;
            println!("Wrote default config to {}", path.display());
        }
    }

    Ok(())
}

fn load_codec(config: &Glyph58Config, args: &MappingArgs) -> Result<SubstitutionCodec> {
    let path = args
        .mapping
        .clone()
        .unwrap_or_else(|| config.mapping_path(args.stego).to_path_buf());
    Ok(SubstitutionCodec::load(&path)?)
}

fn print_report(report: &ScanReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report).into_diagnostic()?);
        return Ok(());
    }
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    println!("Glyphs:         {}", report.glyphs);
    println!("Base58 address: {}", report.address);
    println!("Decoded:        {}", yes_no(report.decode_succeeded));
    println!("Checksum valid: {}", yes_no(report.checksum_valid));
    for message in &report.messages {
        println!("  {message}");
    }
    Ok(())
}

fn analyze(
    config: &Glyph58Config,
    metadata: &Path,
    images_dir: &Path,
    threshold: f64,
    keep: usize,
) -> Result<()> {
    let all = pool::load_candidates(metadata)?;
    let filtered = pool::filter_problematic(&all);

    let hasher = config.hasher()?;
    let fingerprinted =
        pool::fingerprint_pool(&hasher, images_dir, &filtered, config.min_pool_size)?;

    let engine = SimilarityEngine::new(threshold)
        .with_progress(Arc::new(LogProgress::new(config.progress_step_percent)));
    let glyphs = fingerprinted.glyphs.as_slice();
    let analysis = engine.analyze(glyphs, keep);
    let (pairs, top) = (&analysis.pairs, &analysis.top);

    similarity::save_report(&config.confusable_pairs_file, pairs)?;
    similarity::save_report(&config.top_candidates_file, top)?;

    println!("Analysis complete");
    println!("  Candidates in metadata: {}", all.len());
    println!("  After filtering:        {}", filtered.len());
    println!("  Fingerprinted:          {}", glyphs.len());
    println!("  Skipped:                {}", fingerprinted.failures.len());
    println!("  Confusable pairs:       {}", pairs.len());
    println!("  Top candidates:         {}", top.len());
    println!();
    println!("Most confusable:");
    for p in pairs.iter().take(config.confusable_report_len) {
        println!("  {} ~ {}  ({:.3})", p.first, p.second, p.score);
    }
    println!("Most distinct:");
    for c in top.iter().take(10) {
        println!("  {} {}  ({:.3})", c.glyph, c.name, c.distinctiveness);
    }
    println!();
    println!("Wrote {}", config.confusable_pairs_file.display());
    println!("Wrote {}", config.top_candidates_file.display());
    Ok(())
}

fn build(config: &Glyph58Config, stego: bool, candidates: &Path, output: &Path) -> Result<()> {
    let alphabet = NumeralAlphabet::BITCOIN;
    let ranked: Vec<RankedCandidate> = if stego && !candidates.exists() {
        tracing::warn!(path = %candidates.display(), "no ranked candidates; backfill disabled");
        Vec::new()
    } else {
        similarity::load_report(candidates)?
    };
    let ranked: Vec<Candidate> = ranked.iter().map(Candidate::from).collect();

    let pairs: Vec<ConfusablePair> = if config.confusable_pairs_file.exists() {
        similarity::load_report(&config.confusable_pairs_file)?
    } else {
        Vec::new()
    };

    let outcome = if stego {
        let (common, mut clusters) = catalog_candidates(common_glyphs());
        clusters.add_pairs(&pairs);
        MappingBuilder::steganographic(alphabet)
            .with_clusters(clusters)
            .build(&common, &ranked)
    } else {
        MappingBuilder::distinct(alphabet)
            .with_clusters(ConfusableClusters::from_pairs(&pairs))
            .build(&ranked, &[])
    };

    outcome.document.save(output)?;
    println!("Wrote {} mapping to {}", outcome.document.mapping_strategy, output.display());
    println!("  From primary pool: {}", outcome.assigned);
    println!("  Backfilled:        {}", outcome.backfilled);
    println!("  Unassigned:        {}", outcome.missing.len());

    outcome.into_bijection()?;
    Ok(())
}
