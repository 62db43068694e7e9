//! Hookscope - WordPress hook discovery and relationship analysis.
//!
//! Hookscope statically scans PHP sources for the WordPress hook convention:
//! actions and filters fired with `do_action` / `apply_filters` (and their
//! `_ref_array` variants), and callbacks registered with `add_action` /
//! `add_filter`. Hook names are only resolved from literal strings; dynamic
//! names are skipped rather than guessed.
//!
//! # Architecture
//!
//! The codebase uses tree-sitter for AST-based analysis:
//!
//! - `analysis`: language analyzers and the per-file extraction driver
//! - `relate`: listener binding and related-hook inference
//! - `scan`: file enumeration and the scan runner
//! - `config`: YAML scan configuration
//! - `report`: output formatting (pretty, JSON, Markdown)
//!
//! # Example
//!
//! ```no_run
//! use hookscope::{ScanOutcome, Scanner};
//!
//! let outcome = Scanner::new("wp-content/plugins/my-plugin").run()?;
//! if let ScanOutcome::Found(result) = outcome {
//!     for hook in &result.hooks {
//!         println!("{} {} ({} listeners)", hook.kind, hook.name, hook.subscribers.len());
//!     }
//! }
//! # Ok::<(), hookscope::ScanError>(())
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod relate;
pub mod report;
pub mod scan;

pub use analysis::{
    register_analyzers, Extractor, HookKind, LanguageAnalyzer, ParseFailure, PhpAnalyzer,
    PlatformPrefixes, SourceFile,
};
pub use config::ScanConfig;
pub use relate::{
    HookDeclaration, HookSubscription, RelationBasis, RelationshipConfig, RelationshipEdge,
};
pub use scan::{HookTypeFilter, ResultSet, ScanError, ScanOutcome, ScanSummary, Scanner};
