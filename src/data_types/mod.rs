
/// Contains the per-gene block results
pub mod gene_blocks;
/// Contains haplotype blocks and the candidates they are derived from
pub mod haplotype_block;
/// Contains the pairwise linkage table for a single gene
pub mod linkage_table;
