
use anyhow::Context;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::data_types::gene_blocks::GeneBlocks;
use crate::parsing::block_catalog::CATALOG_MARKER;

/// Writes admitted blocks to the flat catalog, one tab-delimited line per block
pub struct BlockCatalogWriter<W: Write> {
    /// Handle on the output
    csv_writer: csv::Writer<W>,
    /// Number of block lines written so far
    blocks_written: usize
}

impl BlockCatalogWriter<File> {
    /// Creates a new catalog file
    /// # Arguments
    /// * `filename` - the output path
    /// # Errors
    /// * if the file cannot be created
    pub fn new(filename: &Path) -> anyhow::Result<Self> {
        let file = File::create(filename)
            .with_context(|| format!("Error while creating {filename:?}:"))?;
        Ok(Self::from_writer(file))
    }
}

impl<W: Write> BlockCatalogWriter<W> {
    /// Wraps any writer, mostly useful for testing
    pub fn from_writer(writer: W) -> Self {
        let csv_writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(writer);
        Self {
            csv_writer,
            blocks_written: 0
        }
    }

    /// Writes all admitted blocks for a gene. Genes without blocks write nothing.
    /// # Arguments
    /// * `gene_blocks` - the results for the gene
    /// # Errors
    /// * if the underlying writer fails
    pub fn write_gene(&mut self, gene_blocks: &GeneBlocks) -> anyhow::Result<usize> {
        let named_blocks = gene_blocks.named_blocks();
        for (name, block) in named_blocks.iter() {
            let record = [CATALOG_MARKER, name.as_str()].into_iter()
                .chain(block.sites().iter().map(|s| s.as_str()));
            self.csv_writer.write_record(record)
                .with_context(|| format!("Error while writing block {name}"))?;
        }
        self.blocks_written += named_blocks.len();
        Ok(named_blocks.len())
    }

    pub fn blocks_written(&self) -> usize {
        self.blocks_written
    }

    /// Flushes everything and returns the inner writer
    /// # Errors
    /// * if the flush fails
    pub fn finish(self) -> anyhow::Result<W> {
        self.csv_writer.into_inner()
            .map_err(|e| anyhow::anyhow!("Error while flushing catalog: {}", e.error()))
    }
}
