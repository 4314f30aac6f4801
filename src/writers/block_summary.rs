
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use crate::data_types::gene_blocks::GeneBlocks;

/// Contains all the data written to each row of the summary file
#[derive(Clone, Debug, PartialEq, Serialize)]
struct BlockSummaryRow {
    /// The gene label
    gene: String,
    /// Number of sites in the LD table
    num_sites: usize,
    /// Number of sites with at least one linked successor
    num_linked_sites: usize,
    /// Number of candidate blocks before merging
    num_candidates: usize,
    /// Number of admitted blocks
    num_blocks: usize,
    /// Number of sites covered by admitted blocks
    num_blocked_sites: usize
}

impl BlockSummaryRow {
    fn new(gene_blocks: &GeneBlocks) -> Self {
        Self {
            gene: gene_blocks.gene().to_string(),
            num_sites: gene_blocks.num_sites(),
            num_linked_sites: gene_blocks.num_linked_sites(),
            num_candidates: gene_blocks.candidates().len(),
            num_blocks: gene_blocks.blocks().len(),
            num_blocked_sites: gene_blocks.num_blocked_sites()
        }
    }
}

/// Accumulates per-gene block statistics and writes them out as a table
#[derive(Default)]
pub struct BlockSummaryWriter {
    /// Rows keyed by gene so output is sorted
    rows: BTreeMap<String, BlockSummaryRow>
}

impl BlockSummaryWriter {
    /// Adds the statistics for one gene, replacing any previous entry for the same gene
    pub fn add_gene_blocks(&mut self, gene_blocks: &GeneBlocks) {
        self.rows.insert(gene_blocks.gene().to_string(), BlockSummaryRow::new(gene_blocks));
    }

    /// Will write the summary out to the given file path
    /// # Arguments
    /// * `filename` - the filename for the output (tsv/csv)
    pub fn write_summary(&self, filename: &Path) -> csv::Result<()> {
        // modify the delimiter to "," if it ends with .csv
        let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
        let delimiter: u8 = if is_csv { b',' } else { b'\t' };
        let mut csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(filename)?;

        for row in self.rows.values() {
            csv_writer.serialize(row)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}
