use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use regionpile::genomics::{write_candidates, ReadFilter};
use regionpile::pipeline::{load_intervals, CandidateJob};
use regionpile::store::{DEFAULT_BLOCK_SIZE, DEFAULT_MIN_BASE_QUALITY};
use regionpile::StoreConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "regionpile", about = "Streaming per-base evidence and candidate variants from aligned reads")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Stream an indexed BAM and write candidate variants per chromosome.
    Candidates {
        /// Coordinate-sorted, indexed BAM.
        bam: PathBuf,
        /// faidx-indexed reference FASTA.
        reference: PathBuf,
        /// Chromosomes processed concurrently.
        #[arg(long, default_value_t = 1)]
        threads: usize,
        /// Positions per evidence block.
        #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: u32,
        /// Bases below this quality are counted as N.
        #[arg(long, default_value_t = DEFAULT_MIN_BASE_QUALITY)]
        min_base_quality: u8,
        /// Reads below this mapping quality are skipped.
        #[arg(long, default_value_t = 0)]
        min_mapq: u8,
        /// Longest run of adjacent mismatches phased into one MNV.
        #[arg(long, default_value_t = 3)]
        max_mnv_length: usize,
        /// Emit a reference observation for every covered position.
        #[arg(long)]
        include_reference: bool,
        /// BED file restricting where candidates are reported.
        #[arg(long)]
        intervals: Option<PathBuf>,
        /// Keep left-truncated candidates instead of folding them across block boundaries.
        #[arg(long)]
        no_collapse: bool,
        /// Output table (default: stdout).
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Candidates {
            bam,
            reference,
            threads,
            block_size,
            min_base_quality,
            min_mapq,
            max_mnv_length,
            include_reference,
            intervals,
            no_collapse,
            output,
        } => {
            let intervals = match intervals {
                Some(path) => load_intervals(&path)?,
                None => HashMap::new(),
            };
            let store = StoreConfig::default()
                .with_block_size(block_size)
                .with_min_base_quality(min_base_quality)
                .with_ref_alleles(include_reference)
                .with_open_ended_tracking(!no_collapse);
            store.validate().context("invalid store settings")?;

            let job = CandidateJob {
                bam,
                reference,
                store,
                intervals,
                read_filter: ReadFilter { min_mapq },
                max_mnv_length,
            };
            run_candidates(&job, threads, output)?
        }
    }

    Ok(())
}

fn run_candidates(job: &CandidateJob, threads: usize, output: Option<PathBuf>) -> Result<()> {
    let results = job.run(threads)?;

    let mut writer: Box<dyn Write> = match &output {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("failed to create output file {}", path.display())
        })?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let candidates: Vec<_> = results.into_iter().flat_map(|r| r.candidates).collect();
    write_candidates(&mut writer, &candidates).context("failed to write candidate table")?;
    info!(candidates = candidates.len(), "wrote candidate table");

    Ok(())
}
