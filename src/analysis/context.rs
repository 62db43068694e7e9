//! Per-file extraction driver.
//!
//! Parses each source file, runs the language's hook visitor over the tree
//! and turns the raw records into `HookDeclaration`s and `HookSubscription`s
//! carrying root-relative paths, a context window and the platform flag.
//!
//! A file that fails to parse is reported as a `ParseFailure` and skipped;
//! it never aborts the rest of the scan.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::analysis::{
    default_analyzer, get_analyzer, ParseFailure, PlatformPrefixes, RawHook, RawListener,
    VisitOptions,
};
use crate::relate::{ContextLine, HookDeclaration, HookSubscription};

/// Lines shown on each side of a hook call.
pub const CONTEXT_RADIUS: usize = 2;

/// One source file handed over by an enumerator.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Records extracted from a single file.
#[derive(Debug, Clone, Default)]
pub struct FileExtraction {
    pub declarations: Vec<HookDeclaration>,
    pub subscriptions: Vec<HookSubscription>,
}

/// Records accumulated across a whole file set, in enumerator order.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub declarations: Vec<HookDeclaration>,
    pub subscriptions: Vec<HookSubscription>,
    pub failures: Vec<ParseFailure>,
    /// Files attempted, including the ones that failed.
    pub files_scanned: usize,
}

impl Extraction {
    fn push(&mut self, result: Result<FileExtraction, ParseFailure>) {
        self.files_scanned += 1;
        match result {
            Ok(file) => {
                self.declarations.extend(file.declarations);
                self.subscriptions.extend(file.subscriptions);
            }
            Err(failure) => {
                warn!(file = %failure.file, reason = %failure.reason, "skipping file");
                self.failures.push(failure);
            }
        }
    }

    /// Count a file that never reached the parser (e.g. the walk could not read it).
    pub fn skip(&mut self, failure: ParseFailure) {
        self.push(Err(failure));
    }
}

/// Extraction driver for one scan root.
pub struct Extractor {
    /// Base directory for relative path resolution.
    base_dir: PathBuf,
    options: VisitOptions,
    platform: PlatformPrefixes,
    /// Treat error-recovered trees as parse failures.
    strict_parsing: bool,
}

impl Extractor {
    /// Create a driver rooted at `base_dir`.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            options: VisitOptions::default(),
            platform: PlatformPrefixes::default(),
            strict_parsing: true,
        }
    }

    pub fn include_doc_comments(mut self, include: bool) -> Self {
        self.options.include_doc_comments = include;
        self
    }

    pub fn platform_prefixes(mut self, platform: PlatformPrefixes) -> Self {
        self.platform = platform;
        self
    }

    pub fn strict_parsing(mut self, strict: bool) -> Self {
        self.strict_parsing = strict;
        self
    }

    /// Path relative to the scan root with `/` separators.
    ///
    /// Paths outside the root are kept as given. Scanning a single file
    /// reports just its file name.
    pub fn relative_path(&self, path: &Path) -> String {
        if path == self.base_dir {
            if let Some(name) = path.file_name() {
                return name.to_string_lossy().to_string();
            }
        }
        path.strip_prefix(&self.base_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Parse and visit one file's text.
    ///
    /// The analyzer is chosen by extension. Paths with no extension, or one
    /// no analyzer claims, go to the default (PHP) analyzer.
    pub fn extract(&self, path: &Path, text: &str) -> Result<FileExtraction, ParseFailure> {
        let rel_path = self.relative_path(path);

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let analyzer = get_analyzer(ext).unwrap_or_else(|| {
            debug!(file = %rel_path, extension = ext, "no analyzer for extension, using default");
            default_analyzer()
        });

        let parsed = analyzer
            .parse(path, text.as_bytes())
            .map_err(|e| ParseFailure::new(&rel_path, e.to_string()))?;

        if self.strict_parsing && parsed.has_errors() {
            let reason = match parsed.first_error_line() {
                Some(line) => format!("syntax error near line {}", line),
                None => "syntax error".to_string(),
            };
            return Err(ParseFailure::new(&rel_path, reason));
        }

        let found = analyzer
            .visit(&parsed, self.options)
            .map_err(|e| ParseFailure::new(&rel_path, e.to_string()))?;

        let lines: Vec<&str> = text.lines().collect();

        let declarations: Vec<HookDeclaration> = found
            .hooks
            .into_iter()
            .map(|hook| self.declaration(hook, &rel_path, &lines))
            .collect();
        let subscriptions: Vec<HookSubscription> = found
            .listeners
            .into_iter()
            .map(|listener| subscription(listener, &rel_path))
            .collect();

        debug!(
            file = %rel_path,
            declarations = declarations.len(),
            subscriptions = subscriptions.len(),
            "extracted hooks"
        );

        Ok(FileExtraction {
            declarations,
            subscriptions,
        })
    }

    /// Read and extract one file from disk.
    ///
    /// Unreadable and non-UTF-8 files are parse failures, not scan errors.
    pub fn extract_path(&self, path: &Path) -> Result<FileExtraction, ParseFailure> {
        let bytes = fs::read(path)
            .map_err(|e| ParseFailure::new(self.relative_path(path), format!("read error: {}", e)))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| ParseFailure::new(self.relative_path(path), "source is not valid UTF-8"))?;
        self.extract(path, &text)
    }

    /// Extract files from disk, sequentially or with rayon.
    ///
    /// Either way the result keeps the order of `paths`.
    pub fn extract_paths(&self, paths: &[PathBuf], parallel: bool) -> Extraction {
        let results: Vec<_> = if parallel {
            use rayon::prelude::*;
            paths.par_iter().map(|p| self.extract_path(p)).collect()
        } else {
            paths.iter().map(|p| self.extract_path(p)).collect()
        };
        collect(results)
    }

    /// Extract already-loaded sources, sequentially or with rayon.
    pub fn extract_sources(&self, sources: &[SourceFile], parallel: bool) -> Extraction {
        let results: Vec<_> = if parallel {
            use rayon::prelude::*;
            sources
                .par_iter()
                .map(|s| self.extract(&s.path, &s.text))
                .collect()
        } else {
            sources.iter().map(|s| self.extract(&s.path, &s.text)).collect()
        };
        collect(results)
    }

    fn declaration(&self, hook: RawHook, rel_path: &str, lines: &[&str]) -> HookDeclaration {
        HookDeclaration {
            is_platform_hook: self.platform.is_platform_hook(&hook.name),
            context: context_window(lines, hook.line),
            name: hook.name,
            kind: hook.kind,
            file: rel_path.to_string(),
            line: hook.line,
            function_call: hook.function_call,
            doc_comment: hook.doc_comment,
            related: Vec::new(),
            subscribers: Vec::new(),
        }
    }
}

fn subscription(listener: RawListener, rel_path: &str) -> HookSubscription {
    HookSubscription {
        target_name: listener.hook_name,
        kind: listener.kind,
        callback: listener.callback,
        priority: listener.priority,
        accepted_args: listener.accepted_args,
        file: rel_path.to_string(),
        line: listener.line,
    }
}

fn collect(results: Vec<Result<FileExtraction, ParseFailure>>) -> Extraction {
    let mut extraction = Extraction::default();
    for result in results {
        extraction.push(result);
    }
    extraction
}

/// Up to `CONTEXT_RADIUS` lines either side of `line`, clamped to the file.
pub fn context_window(lines: &[&str], line: usize) -> Vec<ContextLine> {
    if lines.is_empty() {
        return Vec::new();
    }
    let line = line.clamp(1, lines.len());
    let start = line.saturating_sub(CONTEXT_RADIUS).max(1);
    let end = (line + CONTEXT_RADIUS).min(lines.len());

    (start..=end)
        .map(|number| ContextLine {
            number,
            text: lines[number - 1].to_string(),
            highlighted: number == line,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::HookKind;
    use tempfile::TempDir;

    #[test]
    fn test_extract_enriches_declarations() {
        let extractor = Extractor::new("/project");
        let text = "<?php\n\nfunction boot() {\n    do_action( 'wp_loaded_extra' );\n}\nadd_action( 'init', 'boot', 5 );\n";
        let file = extractor
            .extract(Path::new("/project/includes/boot.php"), text)
            .unwrap();

        assert_eq!(file.declarations.len(), 1);
        let decl = &file.declarations[0];
        assert_eq!(decl.name, "wp_loaded_extra");
        assert_eq!(decl.kind, HookKind::Action);
        assert_eq!(decl.file, "includes/boot.php");
        assert_eq!(decl.line, 4);
        assert!(decl.is_platform_hook);
        assert!(decl.related.is_empty());
        assert!(decl.subscribers.is_empty());

        let numbers: Vec<_> = decl.context.iter().map(|l| l.number).collect();
        assert_eq!(numbers, vec![2, 3, 4, 5, 6]);
        let highlighted = decl.highlighted_line().unwrap();
        assert_eq!(highlighted.number, 4);
        assert_eq!(highlighted.text, "    do_action( 'wp_loaded_extra' );");

        assert_eq!(file.subscriptions.len(), 1);
        assert_eq!(file.subscriptions[0].file, "includes/boot.php");
        assert_eq!(file.subscriptions[0].priority, 5);
    }

    #[test]
    fn test_context_window_is_clamped() {
        let lines = vec!["<?php do_action( 'a' );", "b", "c"];

        let first = context_window(&lines, 1);
        assert_eq!(first.iter().map(|l| l.number).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(first[0].highlighted);

        let last = context_window(&lines, 3);
        assert_eq!(last.iter().map(|l| l.number).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(last[2].highlighted);
        assert_eq!(last.iter().filter(|l| l.highlighted).count(), 1);

        let single = context_window(&["<?php do_action( 'a' );"], 1);
        assert_eq!(single.len(), 1);
        assert!(single[0].highlighted);
    }

    #[test]
    fn test_syntax_errors_are_parse_failures() {
        let extractor = Extractor::new("/project");
        let text = "<?php\ndo_action( 'fine' );\nfunction broken( {\n";

        let err = extractor
            .extract(Path::new("/project/broken.php"), text)
            .unwrap_err();
        assert_eq!(err.file, "broken.php");
        assert!(err.reason.contains("syntax error"), "{}", err.reason);

        let lenient = Extractor::new("/project").strict_parsing(false);
        let file = lenient
            .extract(Path::new("/project/broken.php"), text)
            .unwrap();
        assert_eq!(file.declarations[0].name, "fine");
    }

    #[test]
    fn test_failed_files_do_not_stop_the_batch() {
        let extractor = Extractor::new("/project");
        let sources = vec![
            SourceFile::new("/project/a.php", "<?php do_action( 'first' );\n"),
            SourceFile::new("/project/b.php", "<?php function ( {\n"),
            SourceFile::new("/project/c.php", "<?php apply_filters( 'third', 1 );\n"),
        ];

        for parallel in [false, true] {
            let extraction = extractor.extract_sources(&sources, parallel);
            assert_eq!(extraction.files_scanned, 3);
            assert_eq!(extraction.failures.len(), 1);
            assert_eq!(extraction.failures[0].file, "b.php");
            let names: Vec<_> = extraction.declarations.iter().map(|d| d.name.as_str()).collect();
            assert_eq!(names, vec!["first", "third"]);
        }
    }

    #[test]
    fn test_extract_paths_reports_unreadable_files() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("good.php");
        fs::write(&good, "<?php do_action( 'ok' );\n").unwrap();
        let binary = temp.path().join("binary.php");
        fs::write(&binary, [0xff, 0xfe, 0x00]).unwrap();
        let missing = temp.path().join("missing.php");

        let extractor = Extractor::new(temp.path());
        let extraction = extractor.extract_paths(&[good, binary, missing], false);

        assert_eq!(extraction.declarations.len(), 1);
        assert_eq!(extraction.failures.len(), 2);
        assert_eq!(extraction.failures[0].file, "binary.php");
        assert!(extraction.failures[0].reason.contains("UTF-8"));
        assert!(extraction.failures[1].reason.contains("read error"));
    }

    #[test]
    fn test_relative_path() {
        let extractor = Extractor::new("/project");
        assert_eq!(extractor.relative_path(Path::new("/project/a/b.php")), "a/b.php");
        assert_eq!(extractor.relative_path(Path::new("elsewhere/c.php")), "elsewhere/c.php");

        let single = Extractor::new("/project/plugin.php");
        assert_eq!(single.relative_path(Path::new("/project/plugin.php")), "plugin.php");
    }

    #[test]
    fn test_unknown_extensions_use_default_analyzer() {
        let extractor = Extractor::new("/project");
        for path in ["/project/plugin", "/project/hooks.module"] {
            let file = extractor
                .extract(Path::new(path), "<?php do_action( 'x_hook' );\n")
                .unwrap();
            assert_eq!(file.declarations[0].name, "x_hook", "{}", path);
        }
    }

    #[test]
    fn test_skipped_files_count_as_scanned() {
        let mut extraction = Extractor::new("/project")
            .extract_sources(&[SourceFile::new("/project/a.php", "<?php do_action( 'a' );\n")], false);
        extraction.skip(ParseFailure::new("dangling.php", "read error: not found"));

        assert_eq!(extraction.files_scanned, 2);
        assert_eq!(extraction.declarations.len(), 1);
        assert_eq!(extraction.failures[0].file, "dangling.php");
    }
}
