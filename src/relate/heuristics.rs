//! Relationship inference between declared hooks.
//!
//! Three independent heuristics run over the declaration list:
//!
//! 1. **Naming pattern**: paired prefixes (`before_x` / `after_x`).
//! 2. **Common stem**: a shared generic verb plus at least two shared name tokens.
//! 3. **Proximity**: nearby in the same file, strengthened by a shared token.
//!
//! Candidates are merged, ordered by basis strength, de-duplicated by name
//! and capped at [`MAX_RELATED_HOOKS`].

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{HookDeclaration, RelationBasis, RelationshipEdge};

/// Upper bound on edges attached to one declaration.
pub const MAX_RELATED_HOOKS: usize = 5;

/// Tunables for the inference heuristics.
///
/// The defaults reproduce the WordPress naming conventions the heuristics
/// were tuned on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipConfig {
    /// Groups of interchangeable prefixes, e.g. `[before_, after_]`.
    pub prefix_groups: Vec<Vec<String>>,
    /// Generic verbs that make two names worth comparing.
    pub stems: Vec<String>,
    /// Max line distance for proximity candidates.
    pub proximity_window: usize,
    /// Max line distance for a proximity edge with no shared token.
    pub close_window: usize,
    pub stem_min_shared_tokens: usize,
    pub proximity_min_shared_tokens: usize,
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        let groups: &[&[&str]] = &[
            &["before_", "after_"],
            &["pre_", "post_"],
            &["start_", "end_"],
            &["begin_", "complete_"],
            &["init_", "process_", "complete_"],
            &["wp_ajax_", "wp_ajax_nopriv_"],
        ];
        let stems = [
            "save", "update", "delete", "create", "render", "display", "load", "process",
        ];

        Self {
            prefix_groups: groups
                .iter()
                .map(|g| g.iter().map(|p| p.to_string()).collect())
                .collect(),
            stems: stems.iter().map(|s| s.to_string()).collect(),
            proximity_window: 15,
            close_window: 5,
            stem_min_shared_tokens: 2,
            proximity_min_shared_tokens: 1,
        }
    }
}

/// Populate `related` on every declaration.
///
/// Reads the whole list before writing anything, so results do not depend
/// on declaration order beyond the tie-breaking described above.
pub fn infer_relationships(declarations: &mut [HookDeclaration], config: &RelationshipConfig) {
    let related: Vec<Vec<RelationshipEdge>> = {
        let analyzer = Inference::new(declarations, config);
        (0..declarations.len()).map(|i| analyzer.related_to(i)).collect()
    };

    for (decl, edges) in declarations.iter_mut().zip(related) {
        decl.related = edges;
    }
}

/// Read-only view over the declarations used while computing edges.
struct Inference<'a> {
    decls: &'a [HookDeclaration],
    config: &'a RelationshipConfig,
    /// Declaration indices by exact name, in list order.
    by_name: HashMap<&'a str, Vec<usize>>,
    tokens: Vec<HashSet<&'a str>>,
}

impl<'a> Inference<'a> {
    fn new(decls: &'a [HookDeclaration], config: &'a RelationshipConfig) -> Self {
        let mut by_name: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, d) in decls.iter().enumerate() {
            by_name.entry(d.name.as_str()).or_default().push(i);
        }
        let tokens = decls.iter().map(|d| d.name_tokens().collect()).collect();

        Self {
            decls,
            config,
            by_name,
            tokens,
        }
    }

    fn related_to(&self, i: usize) -> Vec<RelationshipEdge> {
        let mut candidates = Vec::new();
        self.naming_pattern(i, &mut candidates);
        self.common_stem(i, &mut candidates);
        self.proximity(i, &mut candidates);
        rank(candidates)
    }

    fn edge(&self, j: usize, basis: RelationBasis) -> RelationshipEdge {
        RelationshipEdge {
            name: self.decls[j].name.clone(),
            kind: self.decls[j].kind,
            basis,
        }
    }

    fn shared_tokens(&self, i: usize, j: usize) -> usize {
        self.tokens[i].intersection(&self.tokens[j]).count()
    }

    fn naming_pattern(&self, i: usize, out: &mut Vec<RelationshipEdge>) {
        let name = self.decls[i].name.as_str();

        for group in &self.config.prefix_groups {
            for prefix in group {
                let Some(base) = name.strip_prefix(prefix.as_str()) else {
                    continue;
                };
                for other in group.iter().filter(|p| *p != prefix) {
                    let candidate = format!("{}{}", other, base);
                    let Some(matches) = self.by_name.get(candidate.as_str()) else {
                        continue;
                    };
                    for &j in matches.iter().filter(|&&j| j != i) {
                        out.push(self.edge(j, RelationBasis::NamingPattern));
                    }
                }
            }
        }
    }

    fn common_stem(&self, i: usize, out: &mut Vec<RelationshipEdge>) {
        let name = self.decls[i].name.as_str();

        for stem in self.config.stems.iter().filter(|s| name.contains(s.as_str())) {
            for (j, other) in self.decls.iter().enumerate() {
                if j == i || other.name == name || !other.name.contains(stem.as_str()) {
                    continue;
                }
                if self.shared_tokens(i, j) >= self.config.stem_min_shared_tokens {
                    out.push(self.edge(j, RelationBasis::CommonStem));
                }
            }
        }
    }

    fn proximity(&self, i: usize, out: &mut Vec<RelationshipEdge>) {
        let decl = &self.decls[i];

        for (j, other) in self.decls.iter().enumerate() {
            if j == i || other.file != decl.file {
                continue;
            }
            let distance = other.line.abs_diff(decl.line);
            if distance > self.config.proximity_window {
                continue;
            }
            if self.shared_tokens(i, j) >= self.config.proximity_min_shared_tokens {
                out.push(self.edge(j, RelationBasis::ProximityAndNaming));
            } else if distance <= self.config.close_window {
                out.push(self.edge(j, RelationBasis::Proximity));
            }
        }
    }
}

/// Strongest first, first occurrence per name, capped.
fn rank(mut candidates: Vec<RelationshipEdge>) -> Vec<RelationshipEdge> {
    candidates.sort_by_key(|e| std::cmp::Reverse(e.basis.strength()));

    let mut seen = HashSet::new();
    let mut ranked = Vec::new();
    for edge in candidates {
        if ranked.len() >= MAX_RELATED_HOOKS {
            break;
        }
        if seen.insert(edge.name.clone()) {
            ranked.push(edge);
        }
    }
    ranked
}
