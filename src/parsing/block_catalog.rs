
use anyhow::{anyhow, bail, ensure, Context};
use indexmap::IndexMap;
use std::io::Read;
use std::path::Path;

use crate::data_types::haplotype_block::HaplotypeBlock;
use crate::util::file_io::open_text_reader;

/// Marker in the first column of every catalog line
pub const CATALOG_MARKER: &str = "**";

/// Loads a block catalog file, see `read_block_catalog` for details.
/// # Arguments
/// * `filename` - the catalog file path
/// # Errors
/// * if the file cannot be opened or fails to parse
pub fn load_block_catalog(filename: &Path) -> anyhow::Result<IndexMap<String, HaplotypeBlock>> {
    let reader = open_text_reader(filename)?;
    read_block_catalog(reader)
        .with_context(|| format!("Error while parsing {filename:?}:"))
}

/// Parses a tab-delimited block catalog into a lookup from block name to block, in file order.
/// Each row is `**`, the block name, then two or more site identifiers.
/// # Arguments
/// * `reader` - the catalog contents
/// # Errors
/// * if a row does not start with the marker or is missing the block name
/// * if a block has fewer than 2 sites or repeats a site
/// * if a block name is duplicated
pub fn read_block_catalog<R: Read>(reader: R) -> anyhow::Result<IndexMap<String, HaplotypeBlock>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true) // block rows have variable length
        .from_reader(reader);

    let mut blocks: IndexMap<String, HaplotypeBlock> = Default::default();
    for result in csv_reader.records() {
        let row = result.context("Error while reading catalog row")?;
        let marker = row.get(0).unwrap_or_default();
        ensure!(marker == CATALOG_MARKER, "Expected {CATALOG_MARKER:?} at start of row, found {marker:?}");

        let name = row.get(1).ok_or(anyhow!("Missing block name on row: {row:?}"))?;
        if blocks.contains_key(name) {
            bail!("Duplicate block name found: {name}");
        }

        let sites: Vec<String> = row.iter().skip(2)
            .map(|s| s.to_string())
            .collect();
        let block = HaplotypeBlock::new(sites)
            .with_context(|| format!("Invalid block {name:?}"))?;
        blocks.insert(name.to_string(), block);
    }

    Ok(blocks)
}
