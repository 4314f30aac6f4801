/*!
# CLI module
Command line interface functionality that is specific to hapblock.
*/

/// The main CLI module that contains the top-level CLI parser and help text
pub mod core;
/// The blocks CLI subcommand
pub mod blocks;
