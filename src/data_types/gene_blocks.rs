
use serde::Serialize;

use crate::data_types::haplotype_block::{CandidateBlock, HaplotypeBlock};

/// All block results for a single gene
#[derive(Clone, Debug, Serialize)]
pub struct GeneBlocks {
    /// The gene label, typically from the LD file name
    gene: String,
    /// Number of sites in the linkage table
    num_sites: usize,
    /// Number of sites with at least one linked successor
    num_linked_sites: usize,
    /// Per-site candidates prior to merging
    candidates: Vec<CandidateBlock>,
    /// Final blocks after merging, in position order
    blocks: Vec<HaplotypeBlock>
}

impl GeneBlocks {
    pub fn new(
        gene: String, num_sites: usize, num_linked_sites: usize,
        candidates: Vec<CandidateBlock>, blocks: Vec<HaplotypeBlock>
    ) -> Self {
        Self {
            gene,
            num_sites,
            num_linked_sites,
            candidates,
            blocks
        }
    }

    // getters
    pub fn gene(&self) -> &str {
        &self.gene
    }

    pub fn num_sites(&self) -> usize {
        self.num_sites
    }

    pub fn num_linked_sites(&self) -> usize {
        self.num_linked_sites
    }

    pub fn candidates(&self) -> &[CandidateBlock] {
        &self.candidates
    }

    pub fn blocks(&self) -> &[HaplotypeBlock] {
        &self.blocks
    }

    /// Total number of sites that landed in an admitted block
    pub fn num_blocked_sites(&self) -> usize {
        self.blocks.iter()
            .map(|b| b.num_sites())
            .sum()
    }

    /// Returns the output label for each admitted block.
    /// A single block keeps the gene name; multiple blocks get a 1-based `-#` suffix in position order.
    pub fn named_blocks(&self) -> Vec<(String, &HaplotypeBlock)> {
        if self.blocks.len() == 1 {
            vec![(self.gene.clone(), &self.blocks[0])]
        } else {
            self.blocks.iter().enumerate()
                .map(|(i, block)| (format!("{}-{}", self.gene, i + 1), block))
                .collect()
        }
    }
}
