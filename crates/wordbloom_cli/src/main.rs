use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use wordbloom_core::{
    config::expected_false_positive_rate,
    consts::{CORPUS_ELEMENTS, DISTRIBUTION_BUCKETS},
    evaluate, BloomFilter, FilterConfig, Origin, Preset, WordList,
};

#[derive(Parser)]
#[command(name = "wordbloom", about = "Bloom filter builder and accuracy checker for word lists")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(ValueEnum, Clone, Copy)]
enum CliPreset {
    Five,
    One,
    Half,
    Tenth,
}

impl From<CliPreset> for Preset {
    fn from(p: CliPreset) -> Self {
        match p {
            CliPreset::Five => Preset::FivePercent,
            CliPreset::One => Preset::OnePercent,
            CliPreset::Half => Preset::HalfPercent,
            CliPreset::Tenth => Preset::TenthPercent,
        }
    }
}

#[derive(Args, Clone)]
struct FilterArgs {
    /// Size for a target false-positive rate
    #[arg(long, value_enum, conflicts_with_all = ["bits", "hashes", "algorithms"])]
    preset: Option<CliPreset>,
    /// Bit count (M)
    #[arg(long)]
    bits: Option<u64>,
    /// Hash count (K); takes the first K default algorithms
    #[arg(long)]
    hashes: Option<usize>,
    /// Explicit algorithm list, e.g. md5,sha3_224
    #[arg(long, value_delimiter = ',')]
    algorithms: Vec<String>,
    /// Size the preset by formula for this many elements instead of using
    /// the published filter sizes
    #[arg(long)]
    elements: Option<u64>,
}

impl FilterArgs {
    fn resolve(&self) -> Result<FilterConfig> {
        if let Some(p) = self.preset {
            return Ok(preset_config(Preset::from(p), self.elements)?);
        }
        let bits = self.bits.ok_or_else(|| anyhow!("either --preset or --bits is required"))?;
        if !self.algorithms.is_empty() {
            if let Some(k) = self.hashes {
                if k != self.algorithms.len() {
                    bail!("--hashes {k} disagrees with {} --algorithms", self.algorithms.len());
                }
            }
            return Ok(FilterConfig::from_names(bits, &self.algorithms)?);
        }
        let k = self.hashes.ok_or_else(|| anyhow!("--bits needs --hashes or --algorithms"))?;
        Ok(FilterConfig::with_hash_count(bits, k)?)
    }
}

#[derive(Args, Clone)]
struct StoreArgs {
    /// Directory holding bitarray_{K}_{M}.bin files
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Hash the corpus on all cores when a build is needed
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

#[derive(Subcommand)]
enum Cmd {
    /// Load the filter file or build it from the corpus
    Build {
        #[arg(long)]
        corpus: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Membership queries
    Query {
        #[arg(long)]
        corpus: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        store: StoreArgs,
        /// Words are hex-encoded bytes
        #[arg(long = "hex", default_value_t = false)]
        raw_hex: bool,
        #[arg(required = true)]
        words: Vec<String>,
    },

    /// Classify a test word list against the corpus
    Evaluate {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long)]
        test_words: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Evaluate every preset in turn
    Run {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long)]
        test_words: PathBuf,
        #[command(flatten)]
        store: StoreArgs,
        /// Size presets by formula for this many elements instead of using
        /// the published filter sizes
        #[arg(long)]
        elements: Option<u64>,
    },

    /// Print preset sizes
    Presets {
        /// Size by formula for this many elements
        #[arg(long)]
        elements: Option<u64>,
    },

    /// Report on an existing filter file
    Inspect {
        #[arg(long)]
        file: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
    },
}

/// Published sizes unless an explicit element count asks for formula sizing.
fn preset_config(preset: Preset, elements: Option<u64>) -> wordbloom_core::Result<FilterConfig> {
    match elements {
        Some(n) => preset.config(n),
        None => preset.reference(),
    }
}

fn open_list(path: &Path) -> Result<WordList> {
    WordList::open(path).with_context(|| format!("reading {}", path.display()))
}

fn load_or_build(
    cfg: FilterConfig,
    corpus: &WordList,
    store: &StoreArgs,
) -> Result<BloomFilter> {
    let path = store.out_dir.join(cfg.file_name());
    let (filter, origin) = if store.parallel {
        BloomFilter::load_or_build_parallel(cfg, &path, || Ok(corpus.to_vec()))?
    } else {
        BloomFilter::load_or_build(cfg, &path, || Ok(corpus.iter()))?
    };
    match origin {
        Origin::Loaded => println!("{} loaded successfully", path.display()),
        Origin::Built => println!("{} built", path.display()),
        Origin::Rebuilt(reason) => println!("{} rebuilt ({reason})", path.display()),
    }
    Ok(filter)
}

fn print_filter(filter: &BloomFilter, elements: Option<u64>) {
    println!("filter: {}", filter.config());
    println!("total values: {} of {}", filter.count_set(), filter.bit_count());
    println!("fill ratio: {:.4}", filter.fill_ratio());
    if let Some(n) = elements {
        println!("expected fp rate: {:.6}", filter.estimated_false_positive_rate(n));
    }
    println!("distribution:");
    for (i, b) in filter.distribution(DISTRIBUTION_BUCKETS).iter().enumerate() {
        println!("{i:>2}: {} of {} [{}..{}): {:.4}", b.set, filter.bit_count(), b.start, b.end, b.fraction);
    }
}

fn evaluate_with(
    filter: &BloomFilter,
    corpus: &WordList,
    tests: &WordList,
    json: bool,
) -> Result<()> {
    let truth = corpus.to_set();
    let queries = tests.to_vec();
    let counts = evaluate(filter, &queries, &truth).counts();
    if json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
    } else {
        println!("{counts}");
        println!("observed fp rate: {:.6}", counts.observed_false_positive_rate());
    }
    if counts.false_negatives > 0 {
        tracing::warn!(
            false_negatives = counts.false_negatives,
            "ground truth words reported absent; ground truth differs from the build corpus"
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Build { corpus, filter, store } => {
            let words = open_list(&corpus)?;
            let n = words.word_count() as u64;
            let cfg = filter.resolve()?;
            let bf = load_or_build(cfg, &words, &store)?;
            print_filter(&bf, Some(n));
        }
        Cmd::Query { corpus, filter, store, raw_hex, words } => {
            let list = open_list(&corpus)?;
            let cfg = filter.resolve()?;
            let bf = load_or_build(cfg, &list, &store)?;
            for w in words {
                let bytes = if raw_hex {
                    hex::decode(&w).with_context(|| format!("bad hex word {w}"))?
                } else {
                    w.as_bytes().to_vec()
                };
                let verdict = if bf.may_contain(&bytes) { "maybe present" } else { "absent" };
                println!("{w}\t{verdict}");
            }
        }
        Cmd::Evaluate { corpus, test_words, filter, store, json } => {
            let words = open_list(&corpus)?;
            let tests = open_list(&test_words)?;
            let cfg = filter.resolve()?;
            let bf = load_or_build(cfg, &words, &store)?;
            evaluate_with(&bf, &words, &tests, json)?;
        }
        Cmd::Run { corpus, test_words, store, elements } => {
            let words = open_list(&corpus)?;
            let tests = open_list(&test_words)?;
            let n = words.word_count() as u64;
            println!("bloom filter length: {}", words.word_count());
            println!("test_words length: {}", tests.word_count());
            let mut failed = Vec::new();
            for preset in Preset::ALL {
                println!("{preset}");
                let outcome = preset_config(preset, elements)
                    .map_err(anyhow::Error::from)
                    .and_then(|cfg| load_or_build(cfg, &words, &store))
                    .and_then(|bf| {
                        print_filter(&bf, Some(n));
                        evaluate_with(&bf, &words, &tests, false)
                    });
                if let Err(e) = outcome {
                    eprintln!("{preset}: {e:#}");
                    failed.push(preset.label());
                }
            }
            if !failed.is_empty() {
                bail!("presets failed: {}", failed.join(", "));
            }
        }
        Cmd::Presets { elements } => {
            println!("{:<18} {:>7} {:>3} {:>12} {:>11} {:>10}", "preset", "p", "k", "m", "bytes", "expected");
            let n = elements.unwrap_or(CORPUS_ELEMENTS);
            for preset in Preset::ALL {
                let cfg = preset_config(preset, elements)?;
                let p = expected_false_positive_rate(cfg.bit_count(), cfg.hash_count(), n);
                println!(
                    "{:<18} {:>7} {:>3} {:>12} {:>11} {:>10.6}",
                    preset.label(),
                    preset.false_positive_rate(),
                    cfg.hash_count(),
                    cfg.bit_count(),
                    cfg.byte_len(),
                    p
                );
            }
        }
        Cmd::Inspect { file, filter } => {
            let cfg = filter.resolve()?;
            let bf = BloomFilter::load(cfg, &file)
                .with_context(|| format!("loading {}", file.display()))?;
            print_filter(&bf, filter.elements);
        }
    }
    Ok(())
}
