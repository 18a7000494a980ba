use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;

use bwt_index::index::fm::IndexMeta;
use bwt_index::index::{FmIndex, IndexOpt, RankIndex, DEFAULT_OCC_INTERVAL, DEFAULT_SA_STRIDE};
use bwt_index::io::fasta::{self, FastaReader};
use bwt_index::util::dna;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "bwt-index", author, version, about = "BWA-style BWT/FM index for DNA references", arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the BWT, sampled suffix array and metadata for a reference
    Index {
        /// Reference FASTA file
        reference: String,
        /// Output prefix for index files
        #[arg(short, long, default_value = "ref")]
        output: String,
        /// Symbols between occurrence checkpoints (16, 32, 64 or 128)
        #[arg(long = "occ-interval", default_value_t = DEFAULT_OCC_INTERVAL)]
        occ_interval: u32,
        /// Suffix array sampling stride
        #[arg(long = "sa-stride", default_value_t = DEFAULT_SA_STRIDE)]
        sa_stride: u32,
    },
    /// Count exact matches of one or more patterns
    Search {
        /// Index prefix
        #[arg(short = 'i', long = "index")]
        index: String,
        /// Patterns given on the command line
        patterns: Vec<String>,
        /// Read additional patterns from a FASTA file
        #[arg(long)]
        fasta: Option<String>,
        /// Also search the reverse complement of each pattern
        #[arg(long = "both-strands")]
        both_strands: bool,
        #[arg(short = 't', long = "threads", default_value_t = 1)]
        threads: usize,
    },
    /// Report every reference position of an exact match
    Locate {
        #[arg(short = 'i', long = "index")]
        index: String,
        pattern: String,
        #[arg(long = "both-strands")]
        both_strands: bool,
    },
    /// Print index layout and build information
    Stats {
        #[arg(short = 'i', long = "index")]
        index: String,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Index { reference, output, occ_interval, sa_stride } => {
            run_index(&reference, &output, IndexOpt { occ_interval, sa_stride })
        }
        Commands::Search { index, patterns, fasta, both_strands, threads } => {
            run_search(&index, patterns, fasta.as_deref(), both_strands, threads)
        }
        Commands::Locate { index, pattern, both_strands } => run_locate(&index, &pattern, both_strands),
        Commands::Stats { index } => run_stats(&index),
    }
}

fn load_index(prefix: &str) -> Result<FmIndex> {
    FmIndex::load(prefix).with_context(|| format!("cannot load index '{}'", prefix))
}

fn run_index(reference: &str, output: &str, opt: IndexOpt) -> Result<()> {
    opt.validate()?;
    let fh = std::fs::File::open(reference).with_context(|| format!("cannot open reference FASTA '{}'", reference))?;
    let refs = fasta::load_reference(std::io::BufReader::new(fh))
        .with_context(|| format!("cannot read reference FASTA '{}'", reference))?;

    log::info!("reference: {}", reference);
    log::info!("sequences: {}, total length: {}", refs.contigs.len(), refs.text.len());
    if refs.n_ambiguous > 0 {
        log::warn!("{} ambiguous bases replaced with random ACGT", refs.n_ambiguous);
    }

    let mut fm = FmIndex::build(&refs.text, opt)?;
    fm.set_meta(IndexMeta {
        reference_file: Some(reference.to_string()),
        build_args: Some(std::env::args().collect::<Vec<_>>().join(" ")),
        build_timestamp: Some(chrono::Utc::now().to_rfc3339()),
        n_ambiguous: refs.n_ambiguous,
        contigs: refs.contigs,
    });

    fm.save(output).with_context(|| format!("cannot write index with prefix '{}'", output))?;
    log::info!("index saved: {}.bwt, {}.sa, {}.meta", output, output, output);
    Ok(())
}

struct Query {
    name: String,
    seq: Vec<u8>,
}

/// 单条查询在正链（和可选的反链）上的命中数
fn count_hits(fm: &FmIndex, seq: &[u8], both_strands: bool) -> u64 {
    let count = |codes: &[u8]| -> u64 {
        if codes.iter().any(|&c| c > 3) {
            // 索引中不存在 N
            return 0;
        }
        fm.count(codes).map_or(0, u64::from)
    };
    let mut n = count(&dna::encode(seq));
    if both_strands {
        n += count(&dna::encode(&dna::revcomp(seq)));
    }
    n
}

fn run_search(prefix: &str, patterns: Vec<String>, fasta_path: Option<&str>, both_strands: bool, threads: usize) -> Result<()> {
    let fm = load_index(prefix)?;

    let mut queries: Vec<Query> =
        patterns.into_iter().map(|p| Query { seq: p.clone().into_bytes(), name: p }).collect();
    if let Some(path) = fasta_path {
        let fh = std::fs::File::open(path).with_context(|| format!("cannot open query FASTA '{}'", path))?;
        let mut reader = FastaReader::new(std::io::BufReader::new(fh));
        while let Some(rec) = reader.next_record()? {
            queries.push(Query { name: rec.id, seq: rec.seq });
        }
    }
    if queries.is_empty() {
        anyhow::bail!("no patterns given");
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .context("cannot create thread pool")?;
    let counts: Vec<u64> = pool.install(|| queries.par_iter().map(|q| count_hits(&fm, &q.seq, both_strands)).collect());
    log::debug!("searched {} patterns with {} threads", queries.len(), threads.max(1));

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for (q, n) in queries.iter().zip(counts) {
        writeln!(out, "{}\t{}", q.name, n)?;
    }
    out.flush()?;
    Ok(())
}

fn run_locate(prefix: &str, pattern: &str, both_strands: bool) -> Result<()> {
    let fm = load_index(prefix)?;
    let fwd = pattern.as_bytes().to_vec();
    let mut strands = vec![('+', fwd.clone())];
    if both_strands {
        strands.push(('-', dna::revcomp(&fwd)));
    }

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for (strand, seq) in strands {
        let codes = dna::encode(&seq);
        if codes.iter().any(|&c| c > 3) {
            log::warn!("pattern contains non-ACGT bases; no exact match possible");
            continue;
        }
        for pos in fm.locate(&codes)? {
            match fm.map_text_pos(pos) {
                Some((ci, off)) => writeln!(out, "{}\t{}\t{}", fm.meta().contigs[ci].name, off + 1, strand)?,
                None => writeln!(out, "*\t{}\t{}", pos + 1, strand)?,
            }
        }
    }
    out.flush()?;
    Ok(())
}

fn run_stats(prefix: &str) -> Result<()> {
    let fm = load_index(prefix)?;
    let bwt = fm.bwt();
    let meta = fm.meta();
    let l2 = bwt.cumulative();

    println!("prefix: {}", prefix);
    println!("seq_len: {}", bwt.seq_len());
    println!("primary: {}", bwt.primary());
    println!("occ_interval: {}", fm.opt().occ_interval);
    println!("sa_stride: {}", fm.opt().sa_stride);
    println!(
        "composition: A={} C={} G={} T={}",
        l2[1] - l2[0],
        l2[2] - l2[1],
        l2[3] - l2[2],
        l2[4] - l2[3]
    );
    println!("bwt_bytes: {}", bwt.store().size_in_bytes());
    println!("sa_samples: {}", fm.sampled_sa().values().len());
    println!("contigs: {}", meta.contigs.len());
    for c in &meta.contigs {
        println!("  {}\t{}\t{}", c.name, c.len, c.offset);
    }
    println!("ambiguous_replaced: {}", meta.n_ambiguous);
    if let Some(f) = &meta.reference_file {
        println!("reference_file: {}", f);
    }
    if let Some(args) = &meta.build_args {
        println!("build_args: {}", args);
    }
    if let Some(ts) = &meta.build_timestamp {
        println!("build_timestamp: {}", ts);
    }
    Ok(())
}
