//! Scan results.

use serde::{Deserialize, Serialize};

use crate::analysis::{HookKind, ParseFailure};
use crate::relate::HookDeclaration;

/// Which declarations survive into the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookTypeFilter {
    #[default]
    All,
    #[serde(alias = "actions")]
    Action,
    #[serde(alias = "filters")]
    Filter,
}

impl HookTypeFilter {
    pub fn accepts(&self, kind: HookKind) -> bool {
        match self {
            HookTypeFilter::All => true,
            HookTypeFilter::Action => kind == HookKind::Action,
            HookTypeFilter::Filter => kind == HookKind::Filter,
        }
    }
}

impl std::fmt::Display for HookTypeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookTypeFilter::All => write!(f, "all"),
            HookTypeFilter::Action => write!(f, "action"),
            HookTypeFilter::Filter => write!(f, "filter"),
        }
    }
}

impl std::str::FromStr for HookTypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(HookTypeFilter::All),
            "action" | "actions" => Ok(HookTypeFilter::Action),
            "filter" | "filters" => Ok(HookTypeFilter::Filter),
            _ => Err(format!("unknown hook type: {} (expected all, action or filter)", s)),
        }
    }
}

/// Scan-level counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total: usize,
    pub actions: usize,
    pub filters: usize,
    /// Declarations with at least one subscriber.
    pub with_subscribers: usize,
}

impl ScanSummary {
    pub fn from_declarations(declarations: &[HookDeclaration]) -> Self {
        let actions = declarations
            .iter()
            .filter(|d| d.kind == HookKind::Action)
            .count();
        Self {
            total: declarations.len(),
            actions,
            filters: declarations.len() - actions,
            with_subscribers: declarations
                .iter()
                .filter(|d| !d.subscribers.is_empty())
                .count(),
        }
    }
}

/// The final, cross-referenced declarations of one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    pub summary: ScanSummary,
    pub files_scanned: usize,
    /// Files skipped because they could not be read or parsed.
    pub parse_failures: Vec<ParseFailure>,
    /// In enumerator order, then source order within each file.
    pub hooks: Vec<HookDeclaration>,
}

impl ResultSet {
    pub fn new(
        hooks: Vec<HookDeclaration>,
        files_scanned: usize,
        parse_failures: Vec<ParseFailure>,
    ) -> Self {
        Self {
            summary: ScanSummary::from_declarations(&hooks),
            files_scanned,
            parse_failures,
            hooks,
        }
    }

    /// Declarations of one kind, sorted by name (stable on ties).
    pub fn sorted_by_name(&self, kind: HookKind) -> Vec<&HookDeclaration> {
        let mut hooks: Vec<_> = self.hooks.iter().filter(|h| h.kind == kind).collect();
        hooks.sort_by(|a, b| a.name.cmp(&b.name));
        hooks
    }
}

/// Result of a scan that did not hit a fatal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Found(ResultSet),
    /// Nothing left after filtering. Not a failure.
    Empty {
        files_scanned: usize,
        parse_failures: Vec<ParseFailure>,
    },
}

impl ScanOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, ScanOutcome::Empty { .. })
    }

    pub fn result_set(&self) -> Option<&ResultSet> {
        match self {
            ScanOutcome::Found(set) => Some(set),
            ScanOutcome::Empty { .. } => None,
        }
    }

    pub fn parse_failures(&self) -> &[ParseFailure] {
        match self {
            ScanOutcome::Found(set) => &set.parse_failures,
            ScanOutcome::Empty { parse_failures, .. } => parse_failures,
        }
    }

    pub fn files_scanned(&self) -> usize {
        match self {
            ScanOutcome::Found(set) => set.files_scanned,
            ScanOutcome::Empty { files_scanned, .. } => *files_scanned,
        }
    }
}
