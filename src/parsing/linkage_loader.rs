
use anyhow::{ensure, Context};
use log::{debug, warn};
use std::collections::HashSet;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::data_types::linkage_table::LinkageTable;
use crate::util::file_io::open_text_reader;

/// Problems with a single row of an LD table; these fail the row, not the file
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RowError {
    #[error("missing {column} column")]
    MissingColumn { column: &'static str },
    #[error("D-prime value {value:?} is not a number")]
    InvalidDprime { value: String },
}

/// Pulls the second site and D-prime from the remaining columns of a row.
fn parse_link<'a>(site_b: Option<&'a str>, dprime: Option<&str>) -> Result<(&'a str, f64), RowError> {
    let site_b = site_b.ok_or(RowError::MissingColumn { column: "site_b" })?;
    let dprime = dprime.ok_or(RowError::MissingColumn { column: "dprime" })?;
    let value: f64 = dprime.parse()
        .map_err(|_e| RowError::InvalidDprime { value: dprime.to_string() })?;
    Ok((site_b, value))
}

/// Returns true if `site_b` is already recorded as a linked successor of `site_a`.
fn is_linked(table: &LinkageTable, site_a: &str, site_b: &str) -> bool {
    table.linked_sites(site_a)
        .is_some_and(|linked| linked.iter().any(|s| s == site_b))
}

/// Loads an LD table file into a LinkageTable, see `read_linkage_table` for details.
/// # Arguments
/// * `filename` - the LD file, optionally gzipped
/// * `dprime_cutoff` - minimum D-prime for a pair to count as linked
/// # Errors
/// * if the file cannot be opened or read
pub fn load_linkage_table(filename: &Path, dprime_cutoff: f64) -> anyhow::Result<LinkageTable> {
    let reader = open_text_reader(filename)?;
    read_linkage_table(reader, dprime_cutoff)
        .with_context(|| format!("Error while reading {filename:?}:"))
}

/// Parses a whitespace-delimited LD table with one header line and rows of `site_a site_b dprime ...`.
/// Rows are expected to be grouped by `site_a` in position order, with `site_b` listed in position order within each group.
/// For each `site_a`, successors are recorded while D-prime >= cutoff; the first failing row closes recording for that site.
/// Rows with a missing or non-numeric D-prime, or that are not valid UTF-8, are logged and count as failing.
/// Self-pairs and repeated pairs are logged and skipped.
/// # Arguments
/// * `reader` - the LD table contents
/// * `dprime_cutoff` - minimum D-prime for a pair to count as linked
/// # Errors
/// * if the underlying reader fails
pub fn read_linkage_table<R: BufRead>(mut reader: R, dprime_cutoff: f64) -> anyhow::Result<LinkageTable> {
    let mut table = LinkageTable::default();
    let mut buffer: Vec<u8> = vec![];

    // first line is always the header
    let header_bytes = reader.read_until(b'\n', &mut buffer)
        .context("Error while reading header line")?;
    if header_bytes == 0 {
        return Ok(table);
    }
    debug!("LD header: {:?}", String::from_utf8_lossy(&buffer).trim_end());

    let mut current_site: Option<String> = None;
    let mut closed_sites: HashSet<String> = Default::default();
    let mut first_run = true;
    let mut recording = false;

    // +1 for 1-based, header is line 1
    let mut line_number = 1;
    loop {
        buffer.clear();
        let bytes_read = reader.read_until(b'\n', &mut buffer)
            .with_context(|| format!("Error while reading line {}", line_number + 1))?;
        if bytes_read == 0 {
            break;
        }
        line_number += 1;

        let line = match std::str::from_utf8(&buffer) {
            Ok(l) => l,
            Err(e) => {
                warn!("Line {line_number}: invalid UTF-8 ({e}), treating {current_site:?} as unlinked from here");
                recording = false;
                continue;
            }
        };

        let mut columns = line.split_whitespace();
        let Some(site_a) = columns.next() else {
            continue;
        };

        if current_site.as_deref() != Some(site_a) {
            if let Some(previous) = current_site.take() {
                // ordered sites are only taken from the first group
                first_run = false;
                closed_sites.insert(previous);
            }

            // a group that shows up a second time would create gaps in the successors
            recording = !closed_sites.contains(site_a);
            if !recording {
                warn!("Line {line_number}: rows for {site_a:?} are not contiguous, ignoring this group");
            }
            table.add_site(site_a);
            current_site = Some(site_a.to_string());
        }

        let site_b = columns.next();
        if first_run {
            if let Some(site_b) = site_b {
                table.add_site(site_b);
            }
        }

        if !recording {
            continue;
        }

        match parse_link(site_b, columns.next()) {
            Ok((site_b, _dprime)) if site_b == site_a => {
                warn!("Line {line_number}: {site_a:?} is paired with itself, skipping row");
            },
            Ok((site_b, _dprime)) if is_linked(&table, site_a, site_b) => {
                warn!("Line {line_number}: duplicate pair {site_a:?} {site_b:?}, skipping row");
            },
            Ok((site_b, dprime)) if dprime >= dprime_cutoff => {
                table.add_link(site_a, site_b);
            },
            Ok(_) => {
                recording = false;
            },
            Err(e) => {
                warn!("Line {line_number}: {e}, treating {site_a:?} as unlinked from here");
                recording = false;
            }
        };
    }

    Ok(table)
}

/// Returns the gene label for an LD file, which is the file name up to the first `.`.
pub fn gene_name(filename: &Path) -> Option<String> {
    let file_name = filename.file_name()?.to_str()?;
    let gene = file_name.split('.').next()?;
    if gene.is_empty() {
        None
    } else {
        Some(gene.to_string())
    }
}

/// Finds all `<gene>.<suffix>` files in a folder, sorted by file name.
/// # Arguments
/// * `ld_dir` - folder containing the LD files
/// * `suffix` - the file suffix, e.g. "LD" for `<gene>.LD`; a trailing `.gz` is also accepted
/// # Errors
/// * if the folder cannot be read
/// * if two files map to the same gene
pub fn find_linkage_files(ld_dir: &Path, suffix: &str) -> anyhow::Result<Vec<(String, PathBuf)>> {
    let plain_ending = format!(".{suffix}");
    let gz_ending = format!(".{suffix}.gz");

    let mut filenames: Vec<PathBuf> = vec![];
    for entry in std::fs::read_dir(ld_dir).with_context(|| format!("Error while listing {ld_dir:?}:"))? {
        let entry = entry.with_context(|| format!("Error while listing {ld_dir:?}:"))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|f| f.to_str()) else {
            continue;
        };
        if file_name.ends_with(&plain_ending) || file_name.ends_with(&gz_ending) {
            filenames.push(path);
        }
    }
    filenames.sort();

    let mut genes: Vec<(String, PathBuf)> = Vec::with_capacity(filenames.len());
    let mut observed: HashSet<String> = Default::default();
    for filename in filenames.into_iter() {
        let Some(gene) = gene_name(&filename) else {
            warn!("Could not determine gene name for {filename:?}, skipping");
            continue;
        };
        ensure!(observed.insert(gene.clone()), "Multiple LD files found for gene {gene:?}");
        genes.push((gene, filename));
    }
    Ok(genes)
}
