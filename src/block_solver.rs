/*!
# Block Solver
Contains the logic for turning a gene's pairwise linkage table into haplotype blocks.
Each site with linked successors proposes a candidate block, which is grown left-to-right while every site in it stays linked to the rest.
Candidates that are fully covered by an earlier candidate are then merged away.

## Example usage
```rust
use hapblock::block_solver::{merge_blocks, solve_gene_blocks};
use hapblock::parsing::linkage_loader::read_linkage_table;

let ld_table = "L1\tL2\tD'\n\
    A\tB\t0.98\n\
    A\tC\t0.95\n\
    B\tC\t0.99\n";
let table = read_linkage_table(ld_table.as_bytes(), 0.9).unwrap();

// A proposes [A, B, C] and B proposes [B, C], which is covered by the first
let result = solve_gene_blocks("GENE1", &table);
assert_eq!(result.candidates().len(), 2);
assert_eq!(result.blocks().len(), 1);
assert_eq!(result.blocks()[0].sites(), &["A", "B", "C"]);

// merging the final blocks again does not change them
assert_eq!(merge_blocks(result.blocks()), result.blocks());
```
*/
use derive_builder::Builder;
use indicatif::ParallelProgressIterator;
use log::{debug, error, trace};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::data_types::gene_blocks::GeneBlocks;
use crate::data_types::haplotype_block::{BlockTermination, CandidateBlock, HaplotypeBlock};
use crate::data_types::linkage_table::LinkageTable;
use crate::parsing::linkage_loader::load_linkage_table;
use crate::util::progress_bar::get_progress_style;

/// Default minimum D-prime for two sites to be considered linked
pub const DEFAULT_DPRIME_CUTOFF: f64 = 0.9;

/// Controls how linkage tables are interpreted
#[derive(Builder, Clone, Copy, Debug, Serialize)]
#[builder(default, build_fn(validate = "Self::validate"))]
pub struct BlockConfig {
    /// Minimum D-prime for a pair of sites to be linked, inclusive
    dprime_cutoff: f64
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            dprime_cutoff: DEFAULT_DPRIME_CUTOFF
        }
    }
}

impl BlockConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(cutoff) = self.dprime_cutoff {
            if !(0.0..=1.0).contains(&cutoff) {
                return Err(format!("dprime_cutoff must be in [0, 1], found {cutoff}"));
            }
        }
        Ok(())
    }
}

impl BlockConfig {
    pub fn dprime_cutoff(&self) -> f64 {
        self.dprime_cutoff
    }
}

/// Progress of a single candidate window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WindowState {
    /// The sites before `cursor` are consistent, `cursor` is the next site to check
    Accumulating { cursor: usize },
    /// The full window is a block
    Admitted { termination: BlockTermination },
    /// Only the sites before `end` form a block
    Truncated { end: usize, termination: BlockTermination }
}

/// Returns true if every site in `remaining` is `next_site` or one of its linked successors.
/// Membership is checked as a set, so extra or re-ordered successors still count.
/// # Arguments
/// * `next_site` - the site being checked, which is also the first entry of `remaining`
/// * `next_linked` - the linked successors of `next_site`
/// * `remaining` - the rest of the window, starting at `next_site`
fn is_consistent(next_site: &str, next_linked: &[String], remaining: &[String]) -> bool {
    let exact_match = remaining.len() == next_linked.len() + 1
        && remaining[0] == next_site
        && remaining[1..] == *next_linked;
    exact_match || remaining.iter().all(|s| s == next_site || next_linked.contains(s))
}

/// Checks the site at `cursor` against the remainder of the window.
/// # Arguments
/// * `table` - the linkage table for the gene
/// * `window` - the anchor site followed by all of its linked successors, at least 3 long
/// * `cursor` - index of the site to check, in `1..window.len()-1`
fn step_window(table: &LinkageTable, window: &[String], cursor: usize) -> WindowState {
    let next_site = &window[cursor];
    let Some(next_linked) = table.linked_sites(next_site) else {
        // next site has nothing linked to it, so the block ends there
        return WindowState::Truncated { end: cursor + 1, termination: BlockTermination::MissingLink };
    };

    if !is_consistent(next_site, next_linked, &window[cursor..]) {
        WindowState::Truncated { end: cursor, termination: BlockTermination::Inconsistent }
    } else if cursor == window.len() - 2 {
        WindowState::Admitted { termination: BlockTermination::Exhausted }
    } else {
        WindowState::Accumulating { cursor: cursor + 1 }
    }
}

/// Derives the candidate block anchored at a site.
/// Returns None if the site has no linked successors, or if the window collapses to a single site.
/// # Arguments
/// * `table` - the linkage table for the gene
/// * `site` - the anchor site
pub fn derive_site_block(table: &LinkageTable, site: &str) -> Option<CandidateBlock> {
    let linked = table.linked_sites(site)?;
    let mut window: Vec<String> = Vec::with_capacity(linked.len() + 1);
    window.push(site.to_string());
    window.extend(linked.iter().cloned());

    let mut state = match window.len() {
        0 | 1 => return None,
        2 => WindowState::Admitted { termination: BlockTermination::TrivialPair },
        _ => WindowState::Accumulating { cursor: 1 }
    };

    let termination = loop {
        trace!("{site}: {state:?}");
        match state {
            WindowState::Accumulating { cursor } => {
                state = step_window(table, &window, cursor);
            },
            WindowState::Admitted { termination } => break termination,
            WindowState::Truncated { end, termination } => {
                window.truncate(end);
                break termination;
            }
        }
    };

    match HaplotypeBlock::new(window) {
        Ok(block) => Some(CandidateBlock::new(block, termination)),
        Err(e) => {
            debug!("Dropping candidate anchored at {site} ({termination}): {e}");
            None
        }
    }
}

/// Derives one candidate block for each site with linked successors, in position order.
pub fn derive_candidate_blocks(table: &LinkageTable) -> Vec<CandidateBlock> {
    table.ordered_sites()
        .filter_map(|site| derive_site_block(table, site))
        .collect()
}

/// Removes blocks that are fully covered by the block currently leading the scan.
/// Input is expected in start-position order; the output keeps that order.
/// # Arguments
/// * `blocks` - the candidate blocks for a single gene
pub fn merge_blocks(blocks: &[HaplotypeBlock]) -> Vec<HaplotypeBlock> {
    if blocks.len() <= 1 {
        return blocks.to_vec();
    }

    let mut merged = vec![];
    let mut point = 0;
    let mut mobile = 1;
    loop {
        let leader = &blocks[point];
        match blocks.get(mobile) {
            Some(follower) => {
                if follower.is_subset_of(leader) {
                    mobile += 1;
                } else {
                    merged.push(leader.clone());
                    point = mobile;
                    mobile = point + 1;
                }
            },
            None => {
                // final leader, only skipped if its predecessor already covers it
                let covered = point > 0 && leader.is_subset_of(&blocks[point - 1]);
                if !covered {
                    merged.push(leader.clone());
                }
                break;
            }
        }
    }
    merged
}

/// Runs candidate derivation and merging for a single gene.
/// # Arguments
/// * `gene` - the gene label
/// * `table` - the gene's linkage table
pub fn solve_gene_blocks(gene: &str, table: &LinkageTable) -> GeneBlocks {
    let candidates = derive_candidate_blocks(table);
    let candidate_blocks: Vec<HaplotypeBlock> = candidates.iter()
        .map(|c| c.block().clone())
        .collect();
    let blocks = merge_blocks(&candidate_blocks);
    debug!(
        "{gene}: {} sites, {} linked sites, {} candidates, {} blocks",
        table.num_sites(), table.num_linked_sites(), candidates.len(), blocks.len()
    );

    GeneBlocks::new(
        gene.to_string(), table.num_sites(), table.num_linked_sites(),
        candidates, blocks
    )
}

/// Loads a gene's LD file and solves its blocks.
/// # Arguments
/// * `gene` - the gene label
/// * `filename` - the LD file for the gene
/// * `config` - the block configuration
/// # Errors
/// * if the LD file cannot be opened or read
pub fn load_gene_blocks(gene: &str, filename: &Path, config: BlockConfig) -> anyhow::Result<GeneBlocks> {
    let table = load_linkage_table(filename, config.dprime_cutoff())?;
    Ok(solve_gene_blocks(gene, &table))
}

/// Solves every gene on the current rayon pool.
/// A gene whose LD file fails to load is logged and reported as None; the other genes are unaffected.
/// Results are sorted by gene name.
/// # Arguments
/// * `gene_files` - the gene labels and their LD files
/// * `config` - the block configuration
pub fn solve_all_genes(gene_files: Vec<(String, PathBuf)>, config: BlockConfig) -> Vec<(String, Option<GeneBlocks>)> {
    let style = get_progress_style();
    let mut all_results: Vec<(String, Option<GeneBlocks>)> = gene_files.into_par_iter()
        .map(|(gene, filename)| {
            debug!("{gene} => {filename:?}");
            let result = match load_gene_blocks(&gene, &filename, config) {
                Ok(gb) => Some(gb),
                Err(e) => {
                    error!("Error while solving gene {gene}, skipping: {e:#}");
                    None
                }
            };
            (gene, result)
        })
        .progress_with_style(style)
        .collect();

    // sort them by gene for a deterministic output
    all_results.sort_by(|a, b| a.0.cmp(&b.0));
    all_results
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn block(v: &[&str]) -> HaplotypeBlock {
        HaplotypeBlock::new(strings(v)).unwrap()
    }

    /// Builds a table from explicit successor lists
    fn build_table(sites: &[&str], links: &[(&str, &[&str])]) -> LinkageTable {
        let linked: IndexMap<String, Vec<String>> = links.iter()
            .map(|(site, successors)| (site.to_string(), strings(successors)))
            .collect();
        LinkageTable::new(strings(sites), linked)
    }

    fn block_sites(gene_blocks: &GeneBlocks) -> Vec<Vec<String>> {
        gene_blocks.blocks().iter()
            .map(|b| b.sites().to_vec())
            .collect()
    }

    /// Checks order, size, and containment rules on the final blocks
    fn check_block_rules(table: &LinkageTable, gene_blocks: &GeneBlocks) {
        for b in gene_blocks.blocks().iter() {
            assert!(b.num_sites() >= 2);
            let indices: Vec<usize> = b.sites().iter()
                .map(|s| table.site_index(s).unwrap())
                .collect();
            assert!(indices.windows(2).all(|w| w[0] < w[1]));
        }
        for (i, b1) in gene_blocks.blocks().iter().enumerate() {
            for (j, b2) in gene_blocks.blocks().iter().enumerate() {
                if i != j {
                    assert!(!b1.is_subset_of(b2), "{b1:?} is contained in {b2:?}");
                }
            }
        }
    }

    #[test]
    fn test_config() {
        assert_eq!(BlockConfig::default().dprime_cutoff(), DEFAULT_DPRIME_CUTOFF);
        let config = BlockConfigBuilder::default().build().unwrap();
        assert_eq!(config.dprime_cutoff(), 0.9);
        let config = BlockConfigBuilder::default().dprime_cutoff(0.8).build().unwrap();
        assert_eq!(config.dprime_cutoff(), 0.8);
        assert!(BlockConfigBuilder::default().dprime_cutoff(1.5).build().is_err());
        assert!(BlockConfigBuilder::default().dprime_cutoff(-0.1).build().is_err());
    }

    #[test]
    fn test_trivial_pair() {
        let table = build_table(&["A", "B"], &[("A", &["B"])]);
        let candidate = derive_site_block(&table, "A").unwrap();
        assert_eq!(candidate.termination(), BlockTermination::TrivialPair);
        assert_eq!(candidate.block(), &block(&["A", "B"]));
        assert!(derive_site_block(&table, "B").is_none());

        let result = solve_gene_blocks("G", &table);
        assert_eq!(block_sites(&result), vec![strings(&["A", "B"])]);
        check_block_rules(&table, &result);
    }

    #[test]
    fn test_full_chain() {
        let table = build_table(
            &["A", "B", "C", "D"],
            &[("A", &["B", "C", "D"]), ("B", &["C", "D"]), ("C", &["D"])]
        );
        let candidates = derive_candidate_blocks(&table);
        let terminations: Vec<BlockTermination> = candidates.iter().map(|c| c.termination()).collect();
        assert_eq!(terminations, vec![
            BlockTermination::Exhausted, BlockTermination::Exhausted, BlockTermination::TrivialPair
        ]);

        let result = solve_gene_blocks("G", &table);
        assert_eq!(block_sites(&result), vec![strings(&["A", "B", "C", "D"])]);
        check_block_rules(&table, &result);
    }

    #[test]
    fn test_missing_link() {
        let table = build_table(
            &["A", "B", "C", "D"],
            &[("A", &["B", "C", "D"]), ("C", &["D"])]
        );
        let candidate = derive_site_block(&table, "A").unwrap();
        assert_eq!(candidate.termination(), BlockTermination::MissingLink);
        assert_eq!(candidate.block(), &block(&["A", "B"]));

        let candidate = derive_site_block(&table, "C").unwrap();
        assert_eq!(candidate.block(), &block(&["C", "D"]));

        let result = solve_gene_blocks("G", &table);
        assert_eq!(block_sites(&result), vec![strings(&["A", "B"]), strings(&["C", "D"])]);
        let names: Vec<String> = result.named_blocks().into_iter().map(|(n, _b)| n).collect();
        assert_eq!(names, vec!["G-1".to_string(), "G-2".to_string()]);
        check_block_rules(&table, &result);
    }

    #[test]
    fn test_inconsistent_window() {
        // C is not linked to E, so A's window breaks before C
        let table = build_table(
            &["A", "B", "C", "D", "E"],
            &[("A", &["B", "C", "D", "E"]), ("B", &["C", "D", "E"]), ("C", &["D"]), ("D", &["E"])]
        );
        let candidate = derive_site_block(&table, "A").unwrap();
        assert_eq!(candidate.termination(), BlockTermination::Inconsistent);
        assert_eq!(candidate.block(), &block(&["A", "B"]));

        // B's window breaks at its first step, leaving a single site
        assert!(derive_site_block(&table, "B").is_none());

        let result = solve_gene_blocks("G", &table);
        assert_eq!(result.candidates().len(), 3);
        assert_eq!(block_sites(&result), vec![
            strings(&["A", "B"]), strings(&["C", "D"]), strings(&["D", "E"])
        ]);
        check_block_rules(&table, &result);
    }

    #[test]
    fn test_inconsistent_at_first_step() {
        // B is linked only to C, not D, so A's window collapses to A alone and is dropped
        let table = build_table(
            &["A", "B", "C", "D"],
            &[("A", &["B", "C", "D"]), ("B", &["C"]), ("C", &["D"])]
        );
        assert!(derive_site_block(&table, "A").is_none());

        let result = solve_gene_blocks("G", &table);
        assert_eq!(block_sites(&result), vec![strings(&["B", "C"]), strings(&["C", "D"])]);
        check_block_rules(&table, &result);
    }

    #[test]
    fn test_set_containment_tolerance() {
        // B's successors go beyond A's window, which still counts as consistent
        let table = build_table(
            &["A", "B", "C", "D"],
            &[("A", &["B", "C"]), ("B", &["C", "D"]), ("C", &["D"])]
        );
        let candidate = derive_site_block(&table, "A").unwrap();
        assert_eq!(candidate.termination(), BlockTermination::Exhausted);
        assert_eq!(candidate.block(), &block(&["A", "B", "C"]));

        let result = solve_gene_blocks("G", &table);
        assert_eq!(block_sites(&result), vec![strings(&["A", "B", "C"]), strings(&["B", "C", "D"])]);
        check_block_rules(&table, &result);
    }

    #[test]
    fn test_is_consistent() {
        let remaining = strings(&["B", "C", "D"]);
        assert!(is_consistent("B", &strings(&["C", "D"]), &remaining));
        assert!(is_consistent("B", &strings(&["D", "C"]), &remaining));
        assert!(is_consistent("B", &strings(&["C", "D", "E"]), &remaining));
        assert!(!is_consistent("B", &strings(&["C"]), &remaining));
        assert!(!is_consistent("B", &strings(&["D", "E"]), &remaining));

        // the checked site counts as part of its own candidate set
        let repeated = strings(&["B", "C", "B"]);
        assert!(is_consistent("B", &strings(&["C"]), &repeated));
    }

    #[test]
    fn test_merge_contained() {
        let merged = merge_blocks(&[block(&["A", "B", "C"]), block(&["B", "C"])]);
        assert_eq!(merged, vec![block(&["A", "B", "C"])]);
    }

    #[test]
    fn test_merge_trailing_block() {
        // the last block is not covered and must survive even after a skipped follower
        let blocks = vec![block(&["A", "B", "C"]), block(&["B", "C"]), block(&["C", "D"])];
        let merged = merge_blocks(&blocks);
        assert_eq!(merged, vec![block(&["A", "B", "C"]), block(&["C", "D"])]);
        assert_eq!(merge_blocks(&merged), merged);
    }

    #[test]
    fn test_merge_all_covered() {
        let blocks = vec![
            block(&["A", "B", "C", "D"]), block(&["B", "C", "D"]), block(&["C", "D"])
        ];
        assert_eq!(merge_blocks(&blocks), vec![block(&["A", "B", "C", "D"])]);
    }

    #[test]
    fn test_merge_edge_sizes() {
        assert!(merge_blocks(&[]).is_empty());
        let single = vec![block(&["A", "B"])];
        assert_eq!(merge_blocks(&single), single);
    }

    #[test]
    fn test_merge_idempotent() {
        let blocks = vec![
            block(&["A", "B", "C"]), block(&["B", "C"]), block(&["C", "D", "E"]),
            block(&["D", "E"]), block(&["E", "F"])
        ];
        let merged = merge_blocks(&blocks);
        assert_eq!(merged, vec![block(&["A", "B", "C"]), block(&["C", "D", "E"]), block(&["E", "F"])]);
        assert_eq!(merge_blocks(&merged), merged);
    }

    #[test]
    fn test_empty_table() {
        let table = LinkageTable::default();
        let result = solve_gene_blocks("G", &table);
        assert!(result.candidates().is_empty());
        assert!(result.blocks().is_empty());
        assert!(result.named_blocks().is_empty());
    }

    #[test]
    fn test_load_gene_blocks() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let ld_fn = tmp_dir.path().join("GENE1.LD");
        std::fs::write(&ld_fn, "L1\tL2\tD'\nA\tB\t0.9\nA\tC\t0.85\nB\tC\t0.95\n").unwrap();

        let result = load_gene_blocks("GENE1", &ld_fn, BlockConfig::default()).unwrap();
        assert_eq!(block_sites(&result), vec![strings(&["A", "B"]), strings(&["B", "C"])]);

        let config = BlockConfigBuilder::default().dprime_cutoff(0.8).build().unwrap();
        let result = load_gene_blocks("GENE1", &ld_fn, config).unwrap();
        assert_eq!(block_sites(&result), vec![strings(&["A", "B", "C"])]);

        assert!(load_gene_blocks("GENE2", &tmp_dir.path().join("GENE2.LD"), config).is_err());
    }

    #[test]
    fn test_duplicate_row_keeps_block() {
        let ld_table = "L1\tL2\tD'\nA\tB\t0.95\nA\tB\t0.95\nA\tC\t0.95\nB\tC\t0.95\n";
        let table = crate::parsing::linkage_loader::read_linkage_table(ld_table.as_bytes(), 0.9).unwrap();
        let result = solve_gene_blocks("G", &table);
        assert_eq!(block_sites(&result), vec![strings(&["A", "B", "C"])]);
    }

    #[test]
    fn test_solve_all_genes() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let good_fn = tmp_dir.path().join("GOOD.LD");
        std::fs::write(&good_fn, "L1\tL2\tD'\nA\tB\t0.95\n").unwrap();
        let other_fn = tmp_dir.path().join("OTHER.LD");
        std::fs::write(&other_fn, "L1\tL2\tD'\nC\tD\t0.5\n").unwrap();
        let gene_files = vec![
            ("OTHER".to_string(), other_fn),
            ("MISSING".to_string(), tmp_dir.path().join("MISSING.LD")),
            ("GOOD".to_string(), good_fn),
        ];

        let results = solve_all_genes(gene_files, BlockConfig::default());
        let genes: Vec<&str> = results.iter().map(|(g, _r)| g.as_str()).collect();
        assert_eq!(genes, vec!["GOOD", "MISSING", "OTHER"]);

        let good = results[0].1.as_ref().unwrap();
        assert_eq!(block_sites(good), vec![strings(&["A", "B"])]);
        assert!(results[1].1.is_none());
        let other = results[2].1.as_ref().unwrap();
        assert!(other.blocks().is_empty());
    }
}
