//! Source enumeration for directory scans.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::warn;
use walkdir::WalkDir;

use super::ScanError;
use crate::analysis::ParseFailure;
use crate::config::ScanConfig;

/// Compiled `excluded_paths` patterns, matched against root-relative paths.
pub struct ExclusionMatcher {
    set: GlobSet,
}

impl ExclusionMatcher {
    pub fn new(patterns: &[String]) -> Result<Self, ScanError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| {
                ScanError::InvalidConfig(format!("invalid excluded_paths pattern {:?}: {}", pattern, e))
            })?;
            builder.add(glob);
        }
        let set = builder
            .build()
            .map_err(|e| ScanError::InvalidConfig(e.to_string()))?;
        Ok(Self { set })
    }

    /// Check a path relative to the scan root.
    ///
    /// `**/vendor/**` should also hit a top-level `vendor/`, so the path is
    /// tried both as given and with a leading `/`.
    pub fn is_excluded(&self, rel_path: &Path) -> bool {
        if self.set.is_empty() {
            return false;
        }
        let path_str = rel_path.to_string_lossy().replace('\\', "/");
        self.set.is_match(&path_str) || self.set.is_match(format!("/{}", path_str))
    }
}

/// Files found under a scan root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedFiles {
    /// Analyzable files, sorted by path.
    pub files: Vec<PathBuf>,
    /// Candidate files the walk could not reach (dangling links, permissions).
    pub unreadable: Vec<ParseFailure>,
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Collect analyzable files under `root`.
///
/// Hidden directories below the root are skipped. A root that is itself a
/// file is returned as-is, whatever its extension. Only an unreadable root
/// is an error; entries below it that cannot be read are reported in
/// `unreadable` (matching files) or logged and skipped (anything else).
pub fn collect_files(root: &Path, config: &ScanConfig) -> Result<CollectedFiles, ScanError> {
    if !root.exists() {
        return Err(ScanError::SourceNotFound {
            path: root.to_path_buf(),
        });
    }
    if root.is_file() {
        return Ok(CollectedFiles {
            files: vec![root.to_path_buf()],
            unreadable: Vec::new(),
        });
    }

    let exclusions = ExclusionMatcher::new(&config.excluded_paths)?;
    let mut collected = CollectedFiles::default();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            // Skip hidden directories (but never the root itself)
            !(e.depth() > 0
                && e.file_type().is_dir()
                && e.file_name().to_string_lossy().starts_with('.'))
        })
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().map(Path::to_path_buf);
                let path = match path {
                    Some(path) if err.depth() > 0 => path,
                    _ => return Err(err.into()),
                };
                let rel = path.strip_prefix(root).unwrap_or(&path);
                if exclusions.is_excluded(rel) {
                    continue;
                }
                if has_extension(&path, &config.extensions) {
                    let reason = err
                        .io_error()
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| err.to_string());
                    collected.unreadable.push(ParseFailure::new(
                        relative(root, &path),
                        format!("read error: {}", reason),
                    ));
                } else {
                    warn!(path = %path.display(), error = %err, "skipping unreadable entry");
                }
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !has_extension(path, &config.extensions) {
            continue;
        }

        let rel = path.strip_prefix(root).unwrap_or(path);
        if exclusions.is_excluded(rel) {
            continue;
        }

        collected.files.push(path.to_path_buf());
    }

    collected.files.sort();
    collected.unreadable.sort_by(|a, b| a.file.cmp(&b.file));
    Ok(collected)
}
