//! Scan runner that orchestrates extraction and correlation.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::analysis::{Extraction, Extractor, PlatformPrefixes, SourceFile};
use crate::config::{self, ScanConfig};
use crate::relate::{bind_listeners, infer_relationships};

use super::{collect_files, HookTypeFilter, ResultSet, ScanError, ScanOutcome};

/// Runs a scan over one root.
pub struct Scanner {
    root: PathBuf,
    config: ScanConfig,
}

impl Scanner {
    /// Create a scanner with default configuration.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config: ScanConfig::default(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    pub fn hook_type(mut self, filter: HookTypeFilter) -> Self {
        self.config.hook_type = filter;
        self
    }

    pub fn include_doc_comments(mut self, include: bool) -> Self {
        self.config.include_doc_comments = include;
        self
    }

    pub fn platform_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.config.platform_prefixes = prefixes;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Enumerate files under the root and scan them.
    pub fn run(&self) -> Result<ScanOutcome, ScanError> {
        self.validate()?;
        let collected = collect_files(&self.root, &self.config)?;
        if collected.files.is_empty() && collected.unreadable.is_empty() {
            return Err(ScanError::NoSourceFiles {
                path: self.root.clone(),
            });
        }

        info!(root = %self.root.display(), files = collected.files.len(), "scanning");
        let mut extraction = self
            .extractor()
            .extract_paths(&collected.files, self.config.parallel);
        for failure in collected.unreadable {
            extraction.skip(failure);
        }
        Ok(self.correlate(extraction))
    }

    /// Scan sources supplied by the caller, in the given order.
    ///
    /// Paths are made relative to the scanner's root.
    pub fn run_sources(&self, sources: Vec<SourceFile>) -> Result<ScanOutcome, ScanError> {
        self.validate()?;

        info!(root = %self.root.display(), files = sources.len(), "scanning sources");
        let extraction = self
            .extractor()
            .extract_sources(&sources, self.config.parallel);
        Ok(self.correlate(extraction))
    }

    fn validate(&self) -> Result<(), ScanError> {
        config::validate(&self.config).map_err(|e| ScanError::InvalidConfig(e.to_string()))
    }

    fn extractor(&self) -> Extractor {
        Extractor::new(&self.root)
            .include_doc_comments(self.config.include_doc_comments)
            .platform_prefixes(PlatformPrefixes::new(
                self.config.platform_prefixes.iter().cloned(),
            ))
            .strict_parsing(self.config.strict_parsing)
    }

    /// Filter, then run both correlation passes over the full set.
    fn correlate(&self, extraction: Extraction) -> ScanOutcome {
        let Extraction {
            declarations,
            subscriptions,
            failures,
            files_scanned,
        } = extraction;

        let mut declarations: Vec<_> = declarations
            .into_iter()
            .filter(|d| self.config.hook_type.accepts(d.kind))
            .collect();

        if declarations.is_empty() {
            info!(files = files_scanned, failures = failures.len(), "no hooks found");
            return ScanOutcome::Empty {
                files_scanned,
                parse_failures: failures,
            };
        }

        bind_listeners(&mut declarations, &subscriptions);
        infer_relationships(&mut declarations, &self.config.relationships);

        let result = ResultSet::new(declarations, files_scanned, failures);
        info!(
            hooks = result.summary.total,
            actions = result.summary.actions,
            filters = result.summary.filters,
            failures = result.parse_failures.len(),
            "scan complete"
        );
        ScanOutcome::Found(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::HookKind;
    use crate::relate::RelationBasis;
    use std::fs;
    use tempfile::TempDir;

    fn sources() -> Vec<SourceFile> {
        vec![
            SourceFile::new(
                "/plugin/core.php",
                r#"<?php
function save_item( $item ) {
    do_action( 'before_save', $item );
    $item = apply_filters( 'item_data', $item );
    do_action( 'after_save', $item );
}
"#,
            ),
            SourceFile::new(
                "/plugin/listeners.php",
                r#"<?php
add_action( 'before_save', 'log_late', 20 );
add_action( 'before_save', 'log_early', 5 );
add_filter( 'item_data', array( $this, 'clean' ) );
"#,
            ),
        ]
    }

    #[test]
    fn test_run_sources_end_to_end() {
        let outcome = Scanner::new("/plugin").run_sources(sources()).unwrap();
        let result = outcome.result_set().unwrap();

        assert_eq!(result.files_scanned, 2);
        assert_eq!(result.summary.total, 3);
        assert_eq!(result.summary.actions, 2);
        assert_eq!(result.summary.filters, 1);
        assert_eq!(result.summary.with_subscribers, 2);

        let before = &result.hooks[0];
        assert_eq!(before.name, "before_save");
        assert_eq!(before.file, "core.php");
        let callbacks: Vec<_> = before.subscribers.iter().map(|s| s.callback.as_str()).collect();
        assert_eq!(callbacks, vec!["log_early", "log_late"]);
        assert_eq!(before.related[0].name, "after_save");
        assert_eq!(before.related[0].basis, RelationBasis::NamingPattern);

        assert_eq!(result.hooks[1].subscribers[0].callback, "$this::clean");
    }

    #[test]
    fn test_hook_type_filter_runs_before_correlation() {
        let outcome = Scanner::new("/plugin")
            .hook_type(HookTypeFilter::Filter)
            .run_sources(sources())
            .unwrap();
        let result = outcome.result_set().unwrap();

        assert_eq!(result.summary.total, 1);
        assert_eq!(result.hooks[0].kind, HookKind::Filter);
        // The actions were filtered out, so nothing is left to relate to.
        assert!(result.hooks[0].related.is_empty());
    }

    #[test]
    fn test_empty_outcome_is_not_an_error() {
        let outcome = Scanner::new("/plugin")
            .run_sources(vec![SourceFile::new("/plugin/a.php", "<?php echo 'hi';\n")])
            .unwrap();
        assert!(outcome.is_empty());
        assert_eq!(outcome.files_scanned(), 1);
    }

    #[test]
    fn test_run_is_idempotent() {
        let first = Scanner::new("/plugin").run_sources(sources()).unwrap();
        let second = Scanner::new("/plugin")
            .parallel(true)
            .run_sources(sources())
            .unwrap();
        assert_eq!(first, second);

        let a = serde_json::to_string(first.result_set().unwrap()).unwrap();
        let b = serde_json::to_string(second.result_set().unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_run_errors() {
        let temp = TempDir::new().unwrap();

        let missing = Scanner::new(temp.path().join("missing")).run();
        assert!(matches!(missing, Err(ScanError::SourceNotFound { .. })));

        fs::write(temp.path().join("readme.txt"), "no php here").unwrap();
        let empty = Scanner::new(temp.path()).run();
        assert!(matches!(empty, Err(ScanError::NoSourceFiles { .. })));

        let invalid = Scanner::new(temp.path())
            .platform_prefixes(vec![String::new()])
            .run();
        assert!(matches!(invalid, Err(ScanError::InvalidConfig(_))));
    }

    #[test]
    fn test_run_sources_accepts_paths_without_php_extension() {
        let outcome = Scanner::new("/p")
            .run_sources(vec![
                SourceFile::new("/p/plugin", "<?php do_action( 'x_hook' );\n"),
                SourceFile::new("/p/hooks.module", "<?php apply_filters( 'y_hook', 1 );\n"),
            ])
            .unwrap();
        let result = outcome.result_set().unwrap();

        assert!(result.parse_failures.is_empty());
        let names: Vec<_> = result.hooks.iter().map(|h| (h.name.as_str(), h.file.as_str())).collect();
        assert_eq!(names, vec![("x_hook", "plugin"), ("y_hook", "hooks.module")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_does_not_abort_scan() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("good.php"), "<?php do_action( 'good_hook' );\n").unwrap();
        std::os::unix::fs::symlink(temp.path().join("missing.php"), temp.path().join("dangling.php"))
            .unwrap();

        let outcome = Scanner::new(temp.path()).run().unwrap();
        let result = outcome.result_set().unwrap();
        assert_eq!(result.hooks[0].name, "good_hook");
        assert_eq!(result.files_scanned, 2);
        assert_eq!(result.parse_failures.len(), 1);
        assert_eq!(result.parse_failures[0].file, "dangling.php");
    }

    #[test]
    fn test_run_reads_directory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("includes")).unwrap();
        fs::write(
            temp.path().join("includes/hooks.php"),
            "<?php\ndo_action( 'my_plugin_loaded' );\n",
        )
        .unwrap();
        fs::write(temp.path().join("broken.php"), "<?php function ( {\n").unwrap();

        let outcome = Scanner::new(temp.path()).run().unwrap();
        let result = outcome.result_set().unwrap();
        assert_eq!(result.files_scanned, 2);
        assert_eq!(result.parse_failures.len(), 1);
        assert_eq!(result.parse_failures[0].file, "broken.php");
        assert_eq!(result.hooks[0].file, "includes/hooks.php");
        assert!(!result.hooks[0].is_platform_hook);
    }
}
