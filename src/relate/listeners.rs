//! Listener binding: attach subscriptions to the declarations they target.

use std::collections::HashMap;

use super::{HookDeclaration, HookSubscription};

/// Attach every subscription to each declaration whose name it targets.
///
/// Subscriptions are grouped by target name once, then each declaration
/// receives its group sorted by ascending priority. The sort is stable, so
/// equal priorities keep discovery order. Declarations with no listeners get
/// an empty list.
pub fn bind_listeners(declarations: &mut [HookDeclaration], subscriptions: &[HookSubscription]) {
    let by_name = group_by_target(subscriptions);

    for decl in declarations.iter_mut() {
        let mut subscribers: Vec<HookSubscription> = by_name
            .get(decl.name.as_str())
            .map(|subs| subs.iter().map(|s| (*s).clone()).collect())
            .unwrap_or_default();
        subscribers.sort_by_key(|s| s.priority);
        decl.subscribers = subscribers;
    }
}

fn group_by_target(subscriptions: &[HookSubscription]) -> HashMap<&str, Vec<&HookSubscription>> {
    let mut by_name: HashMap<&str, Vec<&HookSubscription>> = HashMap::new();
    for sub in subscriptions {
        by_name.entry(sub.target_name.as_str()).or_default().push(sub);
    }
    by_name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::HookKind;

    fn decl(name: &str) -> HookDeclaration {
        HookDeclaration {
            name: name.to_string(),
            kind: HookKind::Action,
            file: "plugin.php".to_string(),
            line: 1,
            function_call: "do_action".to_string(),
            doc_comment: None,
            context: Vec::new(),
            is_platform_hook: false,
            related: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    fn sub(target: &str, callback: &str, priority: i64) -> HookSubscription {
        HookSubscription {
            target_name: target.to_string(),
            kind: HookKind::Action,
            callback: callback.to_string(),
            priority,
            accepted_args: 1,
            file: "listeners.php".to_string(),
            line: 1,
        }
    }

    fn callbacks(decl: &HookDeclaration) -> Vec<&str> {
        decl.subscribers.iter().map(|s| s.callback.as_str()).collect()
    }

    #[test]
    fn test_subscribers_sorted_by_priority_stable() {
        let mut decls = vec![decl("save_order")];
        let subs = vec![
            sub("save_order", "late", 20),
            sub("save_order", "first_default", 10),
            sub("save_order", "early", 1),
            sub("save_order", "second_default", 10),
        ];

        bind_listeners(&mut decls, &subs);

        assert_eq!(
            callbacks(&decls[0]),
            vec!["early", "first_default", "second_default", "late"]
        );
    }

    #[test]
    fn test_every_matching_declaration_gets_the_subscription() {
        let mut decls = vec![decl("init_done"), decl("other"), decl("init_done")];
        let subs = vec![sub("init_done", "on_init", 10), sub("unused", "nobody", 10)];

        bind_listeners(&mut decls, &subs);

        assert_eq!(callbacks(&decls[0]), vec!["on_init"]);
        assert!(decls[1].subscribers.is_empty());
        assert_eq!(callbacks(&decls[2]), vec!["on_init"]);
    }

    #[test]
    fn test_rebinding_replaces_previous_subscribers() {
        let mut decls = vec![decl("tick")];
        bind_listeners(&mut decls, &[sub("tick", "a", 10)]);
        bind_listeners(&mut decls, &[sub("tick", "b", 10)]);
        assert_eq!(callbacks(&decls[0]), vec!["b"]);
    }
}
