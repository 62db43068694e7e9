//! Enriched hook records shared by extraction, correlation and reporting.

use serde::{Deserialize, Serialize};

use crate::analysis::HookKind;

/// One line of source shown around a hook call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLine {
    /// Line number (1-indexed).
    pub number: usize,
    pub text: String,
    /// True only for the line holding the call.
    pub highlighted: bool,
}

/// A call site that registers a callback on a hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookSubscription {
    /// The hook this subscribes to.
    pub target_name: String,
    pub kind: HookKind,
    /// Human-readable callback: `fn_name`, `$this::method`, `{closure}`, `{unknown}`...
    pub callback: String,
    pub priority: i64,
    pub accepted_args: i64,
    /// Path relative to the scan root.
    pub file: String,
    pub line: usize,
}

/// The heuristic that proposed a relationship, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationBasis {
    /// Paired prefixes such as `before_x` / `after_x`.
    NamingPattern,
    /// Nearby in the same file and sharing a name token.
    ProximityAndNaming,
    /// Sharing a generic verb and at least two name tokens.
    CommonStem,
    /// Very close in the same file, nothing else in common.
    Proximity,
}

impl RelationBasis {
    /// Ordinal strength; higher sorts first.
    pub fn strength(&self) -> u8 {
        match self {
            RelationBasis::NamingPattern => 3,
            RelationBasis::ProximityAndNaming => 2,
            RelationBasis::CommonStem => 1,
            RelationBasis::Proximity => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationBasis::NamingPattern => "naming pattern",
            RelationBasis::ProximityAndNaming => "proximity and naming",
            RelationBasis::CommonStem => "common word stem",
            RelationBasis::Proximity => "proximity",
        }
    }
}

impl std::fmt::Display for RelationBasis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An inferred link from one declaration to another hook name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub name: String,
    pub kind: HookKind,
    pub basis: RelationBasis,
}

/// A call site that fires a hook, with everything the scan learned about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookDeclaration {
    pub name: String,
    /// Fixed by the declaration function that produced it.
    pub kind: HookKind,
    /// Path relative to the scan root.
    pub file: String,
    pub line: usize,
    /// The declaration function used (e.g. "apply_filters_ref_array").
    pub function_call: String,
    /// Verbatim doc comment; `None` when absent or not captured.
    pub doc_comment: Option<String>,
    /// Up to two lines either side of `line`, clamped to the file.
    pub context: Vec<ContextLine>,
    pub is_platform_hook: bool,
    /// Filled by the relationship pass.
    pub related: Vec<RelationshipEdge>,
    /// Filled by the listener binding pass, ordered by priority.
    pub subscribers: Vec<HookSubscription>,
}

impl HookDeclaration {
    /// The highlighted context line, if the window is not empty.
    pub fn highlighted_line(&self) -> Option<&ContextLine> {
        self.context.iter().find(|l| l.highlighted)
    }

    /// Underscore-delimited name tokens.
    pub fn name_tokens(&self) -> impl Iterator<Item = &str> {
        self.name.split('_')
    }
}
