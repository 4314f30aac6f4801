
use serde::Serialize;
use std::collections::HashSet;

/// Reasons a haplotype block cannot be constructed
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum BlockError {
    #[error("blocks require at least 2 sites, found {count}")]
    TooFewSites { count: usize },
    #[error("site {site:?} occurs more than once")]
    DuplicateSite { site: String },
}

/// An ordered run of markers that are in strong mutual linkage.
/// Sites are stored in position order and are always unique.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HaplotypeBlock {
    /// The site identifiers, in position order
    sites: Vec<String>
}

impl HaplotypeBlock {
    /// Constructor with the block checks
    /// # Arguments
    /// * `sites` - the ordered site identifiers in this block
    /// # Errors
    /// * if there are fewer than 2 sites
    /// * if any site is duplicated
    pub fn new(sites: Vec<String>) -> Result<Self, BlockError> {
        if sites.len() < 2 {
            return Err(BlockError::TooFewSites { count: sites.len() });
        }

        let mut observed: HashSet<&str> = HashSet::with_capacity(sites.len());
        for site in sites.iter() {
            if !observed.insert(site.as_str()) {
                return Err(BlockError::DuplicateSite { site: site.clone() });
            }
        }

        Ok(Self {
            sites
        })
    }

    pub fn sites(&self) -> &[String] {
        &self.sites
    }

    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }

    /// Returns true if `site` is part of this block.
    pub fn contains_site(&self, site: &str) -> bool {
        self.sites.iter().any(|s| s == site)
    }

    /// Returns true if every site in this block is also in `other`.
    /// Order is ignored, this is a set comparison.
    pub fn is_subset_of(&self, other: &HaplotypeBlock) -> bool {
        self.sites.iter().all(|s| other.contains_site(s))
    }
}

/// Describes how the window for a candidate block stopped growing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
pub enum BlockTermination {
    /// The window only had the anchor site and one linked successor
    #[strum(serialize = "trivial_pair")]
    TrivialPair,
    /// Every site in the window was consistent with the rest of the window
    #[strum(serialize = "exhausted")]
    Exhausted,
    /// A site in the window had no linked successors of its own, window ends at that site
    #[strum(serialize = "missing_link")]
    MissingLink,
    /// A site in the window was not linked to all remaining sites, window ends before that site
    #[strum(serialize = "inconsistent")]
    Inconsistent,
}

/// A block derived from a single anchor site, prior to merging
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CandidateBlock {
    /// The sites in the candidate
    block: HaplotypeBlock,
    /// Why the candidate stopped where it did
    termination: BlockTermination
}

impl CandidateBlock {
    pub fn new(block: HaplotypeBlock, termination: BlockTermination) -> Self {
        Self {
            block,
            termination
        }
    }

    pub fn block(&self) -> &HaplotypeBlock {
        &self.block
    }

    pub fn termination(&self) -> BlockTermination {
        self.termination
    }
}
