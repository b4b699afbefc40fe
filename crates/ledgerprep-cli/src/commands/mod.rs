//! CLI command implementations
//!
//! Commands are organized by workflow:
//! - `monthly` - Discover statements and write one import file per month
//! - `per_file` - Write one import file per statement
//! - `convert` - Convert explicit files for a single account
//! - `detect` - Report each file's statement layout
//!
//! Each command returns `Ok(true)` when everything it touched succeeded; the
//! caller turns `false` into a non-zero exit status.

pub mod convert;
pub mod detect;
pub mod monthly;
pub mod per_file;

// Re-export command functions for main.rs
pub use convert::*;
pub use detect::*;
pub use monthly::*;
pub use per_file::*;

use std::path::Path;

/// File name for display, falling back to the full path
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
