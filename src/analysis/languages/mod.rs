//! Language-specific hook visitors.

mod php;

pub use php::{PhpAnalyzer, DEFAULT_ACCEPTED_ARGS, DEFAULT_PRIORITY};

use super::LanguageAnalyzer;
use once_cell::sync::OnceCell;

/// Static storage for the PHP analyzer.
static PHP_ANALYZER: OnceCell<PhpAnalyzer> = OnceCell::new();

fn php() -> &'static PhpAnalyzer {
    PHP_ANALYZER.get_or_init(PhpAnalyzer::new)
}

/// Register all available language analyzers.
///
/// Idempotent; lookups register lazily as well.
pub fn register_analyzers() {
    php();
}

fn analyzers() -> [&'static dyn LanguageAnalyzer; 1] {
    [php()]
}

/// Get an analyzer for the given file extension (without dot).
///
/// Returns None if no analyzer handles the extension.
pub fn get_analyzer(ext: &str) -> Option<&'static dyn LanguageAnalyzer> {
    let ext = ext.to_ascii_lowercase();
    analyzers()
        .into_iter()
        .find(|analyzer| analyzer.handles_extension(&ext))
}

/// Analyzer for sources whose extension no analyzer claims.
pub fn default_analyzer() -> &'static dyn LanguageAnalyzer {
    php()
}
