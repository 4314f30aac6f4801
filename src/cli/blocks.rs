
use anyhow::ensure;
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::block_solver::DEFAULT_DPRIME_CUTOFF;
use crate::cli::core::{check_required_filename, AFTER_HELP, FULL_VERSION};

#[derive(Args, Clone, Debug, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct BlockSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    hapblock_version: String,

    /// Folder containing the per-gene LD files
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "ld-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub ld_folder: PathBuf,

    /// File suffix of the LD files, files are named <GENE>.<SUFFIX>
    #[clap(long = "ld-suffix")]
    #[clap(value_name = "SUFFIX")]
    #[clap(help_heading = Some("Input/Output"))]
    #[clap(default_value = "LD")]
    pub ld_suffix: String,

    /// Restrict processing to these genes [default: all genes found]
    #[clap(short = 'g')]
    #[clap(long = "gene")]
    #[clap(value_name = "GENE")]
    #[clap(help_heading = Some("Input/Output"))]
    pub genes: Vec<String>,

    /// Output block catalog file
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-catalog")]
    #[clap(value_name = "FILE")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_catalog: PathBuf,

    /// Output per-gene summary file (CSV/TSV)
    #[clap(long = "output-summary")]
    #[clap(value_name = "TSV")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_summary_filename: Option<PathBuf>,

    /// Optional output debug folder
    #[clap(long = "output-debug")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub debug_folder: Option<PathBuf>,

    /// Minimum D-prime for two sites to be considered linked (inclusive)
    #[clap(short = 'd')]
    #[clap(long = "dprime-cutoff")]
    #[clap(value_name = "FLOAT")]
    #[clap(help_heading = Some("Block parameters"))]
    #[clap(default_value_t = DEFAULT_DPRIME_CUTOFF)]
    pub dprime_cutoff: f64,

    /// Number of threads to use for processing genes
    #[clap(long = "threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    pub threads: usize,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

pub fn check_block_settings(mut settings: BlockSettings) -> anyhow::Result<BlockSettings> {
    // hard code the version in
    settings.hapblock_version = FULL_VERSION.clone();
    info!("hapblock version: {:?}", &settings.hapblock_version);
    info!("Sub-command: blocks");
    info!("Inputs:");

    check_required_filename(&settings.ld_folder, "LD folder")?;
    ensure!(settings.ld_folder.is_dir(), "LD folder is not a directory: {:?}", settings.ld_folder);
    info!("\tLD folder: {:?}", &settings.ld_folder);
    ensure!(!settings.ld_suffix.is_empty(), "--ld-suffix must not be empty");
    info!("\tLD suffix: {:?}", &settings.ld_suffix);
    if settings.genes.is_empty() {
        info!("\tGenes: ALL");
    } else {
        info!("\tGenes: {:?}", &settings.genes);
    }

    info!("Outputs:");
    info!("\tBlock catalog: {:?}", &settings.output_catalog);
    info!("\tSummary: {:?}", &settings.output_summary_filename);
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        info!("\tDebug folder: {debug_folder:?}");
    }

    info!("Block parameters:");
    ensure!(
        (0.0..=1.0).contains(&settings.dprime_cutoff),
        "--dprime-cutoff must be in [0, 1]"
    );
    info!("\tD-prime cutoff: {}", settings.dprime_cutoff);

    // 0 is just a sentinel for single-threaded
    if settings.threads == 0 {
        settings.threads = 1;
    }
    info!("Processing threads: {}", settings.threads);

    Ok(settings)
}
