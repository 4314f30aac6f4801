
use indexmap::{IndexMap, IndexSet};

/// Pairwise linkage for a single gene.
/// Contains the position-ordered sites and, for each site, the contiguous run of following sites that are strongly linked to it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinkageTable {
    /// All sites in position order
    ordered_sites: IndexSet<String>,
    /// Site -> linked successors, in position order; sites with no linked successors are absent
    linked: IndexMap<String, Vec<String>>
}

impl LinkageTable {
    /// Builds a table from already-derived components.
    /// Empty successor lists are dropped so that a lookup on them reports "not found".
    /// # Arguments
    /// * `ordered_sites` - every site in position order
    /// * `linked` - the linked successors for each site
    pub fn new(ordered_sites: Vec<String>, linked: IndexMap<String, Vec<String>>) -> Self {
        let linked = linked.into_iter()
            .filter(|(_site, successors)| !successors.is_empty())
            .collect();
        Self {
            ordered_sites: ordered_sites.into_iter().collect(),
            linked
        }
    }

    /// Adds a site to the ordered list if it is not already present.
    pub fn add_site(&mut self, site: &str) {
        if !self.ordered_sites.contains(site) {
            self.ordered_sites.insert(site.to_string());
        }
    }

    /// Appends `successor` to the linked successors of `site`.
    pub fn add_link(&mut self, site: &str, successor: &str) {
        self.linked.entry(site.to_string())
            .or_default()
            .push(successor.to_string());
    }

    /// Iterator over all sites in position order
    pub fn ordered_sites(&self) -> impl Iterator<Item = &str> {
        self.ordered_sites.iter().map(|s| s.as_str())
    }

    /// Returns the linked successors of a site, or None if the site is not linked to any following site.
    pub fn linked_sites(&self, site: &str) -> Option<&[String]> {
        self.linked.get(site).map(|v| v.as_slice())
    }

    /// Returns the position index of a site in the ordered list
    pub fn site_index(&self, site: &str) -> Option<usize> {
        self.ordered_sites.get_index_of(site)
    }

    pub fn num_sites(&self) -> usize {
        self.ordered_sites.len()
    }

    /// Number of sites that have at least one linked successor
    pub fn num_linked_sites(&self) -> usize {
        self.linked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_sites.is_empty()
    }
}
