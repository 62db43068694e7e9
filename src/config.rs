//! Scan configuration for hookscope.
//!
//! Every field is optional; a missing file means defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::DEFAULT_PLATFORM_PREFIXES;
use crate::relate::RelationshipConfig;
use crate::scan::HookTypeFilter;

/// File names searched for when no `--config` is given.
pub const CONFIG_FILE_NAMES: &[&str] = &["hookscope.yaml", ".hookscope.yaml"];

/// Top-level scan configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// all (default), action or filter
    #[serde(default)]
    pub hook_type: HookTypeFilter,
    /// Capture `/** */` comments above declarations (default: false)
    #[serde(default)]
    pub include_doc_comments: bool,
    /// Name prefixes that mark a hook as provided by the platform itself
    #[serde(default = "default_platform_prefixes")]
    pub platform_prefixes: Vec<String>,
    /// File extensions to scan, without the dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Glob patterns for paths to exclude (e.g., "**/vendor/**")
    #[serde(default = "default_excluded_paths")]
    pub excluded_paths: Vec<String>,
    /// Treat files with syntax errors as parse failures (default: true)
    #[serde(default = "default_true")]
    pub strict_parsing: bool,
    /// Extract files on the rayon thread pool (default: false)
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub relationships: RelationshipConfig,
}

fn default_true() -> bool {
    true
}

fn default_platform_prefixes() -> Vec<String> {
    DEFAULT_PLATFORM_PREFIXES.iter().map(|p| p.to_string()).collect()
}

fn default_extensions() -> Vec<String> {
    vec!["php".to_string()]
}

fn default_excluded_paths() -> Vec<String> {
    vec!["**/vendor/**".to_string(), "**/node_modules/**".to_string()]
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            hook_type: HookTypeFilter::All,
            include_doc_comments: false,
            platform_prefixes: default_platform_prefixes(),
            extensions: default_extensions(),
            excluded_paths: default_excluded_paths(),
            strict_parsing: true,
            parallel: false,
            relationships: RelationshipConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    /// Parse a configuration from YAML text. An empty document is all defaults.
    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: ScanConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Find a config file in `root` (when it is a directory) or the current directory.
    pub fn discover(root: &Path) -> Option<PathBuf> {
        let mut dirs = Vec::new();
        if root.is_dir() {
            dirs.push(root.to_path_buf());
        }
        if let Ok(cwd) = std::env::current_dir() {
            dirs.push(cwd);
        }

        dirs.iter()
            .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
            .find(|candidate| candidate.is_file())
    }
}

/// Validate a configuration for correctness.
pub fn validate(config: &ScanConfig) -> anyhow::Result<()> {
    if config.platform_prefixes.iter().any(|p| p.is_empty()) {
        anyhow::bail!("platform_prefixes must not contain an empty prefix");
    }

    if config.extensions.is_empty() {
        anyhow::bail!("extensions must list at least one file extension");
    }

    let rel = &config.relationships;
    for group in &rel.prefix_groups {
        if group.len() < 2 {
            anyhow::bail!("prefix group {:?} needs at least two prefixes", group);
        }
        if group.iter().any(|p| p.is_empty()) {
            anyhow::bail!("prefix group {:?} contains an empty prefix", group);
        }
    }
    if rel.stems.iter().any(|s| s.is_empty()) {
        anyhow::bail!("relationship stems must not be empty");
    }
    if rel.close_window > rel.proximity_window {
        anyhow::bail!(
            "close_window ({}) must not exceed proximity_window ({})",
            rel.close_window,
            rel.proximity_window
        );
    }

    // Validate excluded_paths glob patterns compile
    for pattern in &config.excluded_paths {
        globset::Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid excluded_paths pattern {:?}: {}", pattern, e))?;
    }

    Ok(())
}
