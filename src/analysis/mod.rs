//! AST-backed hook extraction.
//!
//! This module turns source files into hook records using tree-sitter.
//! A language analyzer walks one parse tree and reports:
//! - Declarations (calls that fire an action or filter)
//! - Listeners (calls that subscribe a callback to one)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────┐     ┌───────────────┐
//! │ Source Files    │────▶│ Analyzers    │────▶│ FileHooks     │
//! └─────────────────┘     │ (PHP)        │     │ (RawHook,     │
//!                         └──────────────┘     │  RawListener) │
//!                                              └───────────────┘
//!                                                      │
//!                                                      ▼
//!                                              ┌───────────────┐
//!                                              │ Extractor     │
//!                                              │ (paths,       │
//!                                              │  context)     │
//!                                              └───────────────┘
//! ```
//!
//! # Adding a New Language
//!
//! 1. Create a new module in `src/analysis/languages/`
//! 2. Implement `LanguageAnalyzer` trait
//! 3. Define tree-sitter queries for the call shapes
//! 4. Register the analyzer in `languages/mod.rs`
//!
//! See `languages/php.rs` for the reference implementation.

mod context;
mod facts;
mod languages;
mod platform;
mod traits;

pub use context::{
    context_window, Extraction, Extractor, FileExtraction, SourceFile, CONTEXT_RADIUS,
};
pub use facts::{FileHooks, HookKind, ParseFailure, RawHook, RawListener};
pub use languages::{
    default_analyzer, get_analyzer, register_analyzers, PhpAnalyzer, DEFAULT_ACCEPTED_ARGS,
    DEFAULT_PRIORITY,
};
pub use platform::{PlatformPrefixes, DEFAULT_PLATFORM_PREFIXES};
pub use traits::{LanguageAnalyzer, ParsedFile, VisitOptions};
