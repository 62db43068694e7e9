//! Cross-file correlation of extracted hooks.
//!
//! Runs after every file has been extracted:
//! - `listeners` binds subscriptions to declarations by name
//! - `heuristics` infers related hooks from naming and proximity

mod heuristics;
mod listeners;
mod types;

pub use heuristics::{infer_relationships, RelationshipConfig, MAX_RELATED_HOOKS};
pub use listeners::bind_listeners;
pub use types::{ContextLine, HookDeclaration, HookSubscription, RelationBasis, RelationshipEdge};
