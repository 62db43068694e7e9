//! Raw hook facts emitted by a syntax visitor.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether a hook is an action (fire-and-forget) or a filter (value-returning).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookKind {
    Action,
    Filter,
}

impl HookKind {
    /// Convert to a string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::Action => "action",
            HookKind::Filter => "filter",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for HookKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "action" => Ok(HookKind::Action),
            "filter" => Ok(HookKind::Filter),
            _ => Err(format!("unknown hook kind: {}", s)),
        }
    }
}

/// A hook firing site as seen by the visitor, before enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHook {
    /// Resolved literal hook name.
    pub name: String,
    pub kind: HookKind,
    /// Line of the call expression (1-indexed).
    pub line: usize,
    /// The declaration function used (e.g. "do_action_ref_array").
    pub function_call: String,
    /// Verbatim doc comment, when capture is enabled and one is attached.
    pub doc_comment: Option<String>,
}

/// A hook listening site as seen by the visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawListener {
    pub hook_name: String,
    pub kind: HookKind,
    /// Rendered callback (`fn_name`, `$this::method`, `{closure}`, ...).
    pub callback: String,
    pub priority: i64,
    pub accepted_args: i64,
    /// Line of the call expression (1-indexed).
    pub line: usize,
}

/// Everything the visitor found in one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHooks {
    pub hooks: Vec<RawHook>,
    pub listeners: Vec<RawListener>,
}

/// A file that could not be turned into a syntax tree.
///
/// Never fatal for a scan: the file contributes nothing and is reported.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("failed to parse {file}: {reason}")]
pub struct ParseFailure {
    /// Path relative to the scan root.
    pub file: String,
    pub reason: String,
}

impl ParseFailure {
    pub fn new(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            reason: reason.into(),
        }
    }
}
