//! Whole-project scans.
//!
//! Ties the pieces together: enumerate sources, extract hooks per file,
//! filter by hook type, bind listeners, infer relationships.

mod files;
mod runner;
mod types;

use std::path::PathBuf;

use thiserror::Error;

pub use files::{collect_files, CollectedFiles, ExclusionMatcher};
pub use runner::Scanner;
pub use types::{HookTypeFilter, ResultSet, ScanOutcome, ScanSummary};

/// Errors that abort a scan.
///
/// Per-file problems are not errors; they end up in `parse_failures`.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("source path not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("no source files to scan under {}", path.display())]
    NoSourceFiles { path: PathBuf },

    /// The scan root itself could not be walked.
    #[error("walking source tree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
