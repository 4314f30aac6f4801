/// Helper functions for opening (optionally compressed) text inputs
pub mod file_io;
/// Helper functions for writing JSON via serde
pub mod json_io;
/// Helper functions for generating the progress bars
pub mod progress_bar;
