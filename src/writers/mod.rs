/*!
# Writers module
Contains the logic for writing the block catalog and the optional summary outputs.
*/
/// Generates the flat block catalog; each line corresponds to an admitted block
pub mod block_catalog;
/// Generates the per-gene summary file
pub mod block_summary;
