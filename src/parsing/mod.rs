/*!
# Parsing module
Contains the logic for parsing input files into meaningful structs / data.
*/
/// Reader for the flat block catalog
pub mod block_catalog;
/// Parser for per-gene LD tables and discovery of the LD files
pub mod linkage_loader;
