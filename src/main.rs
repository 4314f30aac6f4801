
use log::{LevelFilter, error, info, warn};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;

use hapblock::block_solver::{BlockConfigBuilder, solve_all_genes};
use hapblock::cli::blocks::{BlockSettings, check_block_settings};
use hapblock::cli::core::{Commands, get_cli};
use hapblock::data_types::gene_blocks::GeneBlocks;
use hapblock::parsing::linkage_loader::find_linkage_files;
use hapblock::util::json_io::save_json;
use hapblock::writers::block_catalog::BlockCatalogWriter;
use hapblock::writers::block_summary::BlockSummaryWriter;

fn run_blocks(settings: BlockSettings) {
    // start the timer
    let start_time = Instant::now();

    // set up logging before we check the other settings
    let filter_level: LevelFilter = match settings.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();

    let settings = match check_block_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    // set up the number of threads for rayon
    match rayon::ThreadPoolBuilder::new().num_threads(settings.threads).build_global() {
        Ok(()) => {},
        Err(e) => {
            error!("Error while building thread pool: {e}");
            std::process::exit(exitcode::OSERR);
        }
    };

    // create a debug folder if specified
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        info!("Creating debug folder at {debug_folder:?}...");
        if let Err(e) = std::fs::create_dir_all(debug_folder) {
            error!("Error while creating debug folder: {e}");
            std::process::exit(exitcode::IOERR);
        }

        // save the CLI options
        let cli_json = debug_folder.join("cli_settings.json");
        info!("Saving CLI options to {cli_json:?}...");
        if let Err(e) = save_json(&settings, &cli_json) {
            error!("Error while saving CLI options: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    }

    // find all the gene files
    info!("Searching for LD files in {:?}...", settings.ld_folder);
    let mut gene_files: Vec<(String, PathBuf)> = match find_linkage_files(&settings.ld_folder, &settings.ld_suffix) {
        Ok(gf) => gf,
        Err(e) => {
            error!("Error while searching for LD files: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };

    if !settings.genes.is_empty() {
        let requested: BTreeSet<&str> = settings.genes.iter().map(|g| g.as_str()).collect();
        gene_files.retain(|(gene, _filename)| requested.contains(gene.as_str()));
        let found: BTreeSet<&str> = gene_files.iter().map(|(g, _f)| g.as_str()).collect();
        for missing in requested.difference(&found) {
            warn!("No LD file found for requested gene {missing:?}");
        }
    }
    info!("Found {} gene LD files.", gene_files.len());
    if gene_files.is_empty() {
        warn!("No LD files to process, the block catalog will be empty.");
    }

    let block_config = match BlockConfigBuilder::default()
        .dprime_cutoff(settings.dprime_cutoff)
        .build() {
        Ok(bc) => bc,
        Err(e) => {
            error!("Error while building block config: {e:?}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    // each gene is independent; a failing gene is skipped
    info!("Identifying haplotype blocks...");
    let all_results = solve_all_genes(gene_files, block_config);
    info!("Block identification complete, saving all outputs...");

    let mut catalog_writer = match BlockCatalogWriter::new(&settings.output_catalog) {
        Ok(cw) => cw,
        Err(e) => {
            error!("Error while creating block catalog: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };

    let mut summary_writer = if settings.output_summary_filename.is_some() {
        Some(BlockSummaryWriter::default())
    } else {
        None
    };

    let mut solved_genes = 0;
    let mut error_genes = 0;
    let mut empty_genes = 0;
    let mut debug_results: Vec<&GeneBlocks> = vec![];
    for (_gene, opt_blocks) in all_results.iter() {
        let Some(gene_blocks) = opt_blocks.as_ref() else {
            error_genes += 1;
            continue;
        };

        if let Err(e) = catalog_writer.write_gene(gene_blocks) {
            error!("Error while writing block catalog: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
        if let Some(writer) = summary_writer.as_mut() {
            writer.add_gene_blocks(gene_blocks);
        }
        if gene_blocks.blocks().is_empty() {
            empty_genes += 1;
        }
        debug_results.push(gene_blocks);
        solved_genes += 1;
    }

    let blocks_written = catalog_writer.blocks_written();
    if let Err(e) = catalog_writer.finish() {
        error!("Error while saving block catalog: {e:#}");
        std::process::exit(exitcode::IOERR);
    }
    info!("Saved {blocks_written} blocks to {:?}", settings.output_catalog);
    info!("Solved:error genes: {solved_genes} : {error_genes}");
    info!("Genes without blocks: {empty_genes}");

    if let Some(summary_fn) = settings.output_summary_filename.as_deref() {
        info!("Saving output summary to {summary_fn:?}...");
        if let Some(writer) = summary_writer.as_ref() {
            if let Err(e) = writer.write_summary(summary_fn) {
                error!("Error while saving summary file: {e:#}");
                std::process::exit(exitcode::IOERR);
            }
        }
    }

    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        let blocks_json = debug_folder.join("gene_blocks.json");
        info!("Saving per-gene block details to {blocks_json:?}...");
        if let Err(e) = save_json(&debug_results, &blocks_json) {
            error!("Error while saving block details: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    }

    info!("Block identification completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::Blocks(settings) => {
            run_blocks(*settings);
        }
    }

    info!("Process finished successfully.");
}
