//! Dependency resolution
//!
//! Resolution runs in two phases:
//! 1. Fetch: a breadth-wise frontier of unseen references is fetched
//!    concurrently, each `(source, name)` at most once.
//! 2. Order: an iterative post-order walk over the fetched graph produces a
//!    leaves-first install order, dropping cycle edges with a warning.

pub mod merge;
pub mod tree;

pub use merge::{merge_css_vars, merge_json, split_package_spec, PackageSet};
pub use tree::{ResolveFailure, ResolvedItem, ResolvedTree};

use crate::registry::{ItemRef, RegistryClient};
use crate::schema::{RegistryIndex, RegistryItem};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

struct Node {
    item: RegistryItem,
    dependencies: Vec<ItemRef>,
}

/// A reference waiting to be fetched, with the item that required it
struct Pending {
    reference: ItemRef,
    parent: Option<ItemRef>,
    raw: String,
}

/// Resolve requested references into an ordered, de-duplicated tree.
///
/// Requested names that fail are reported in [`ResolvedTree::failures`];
/// every other problem skips the affected branch with a warning.
pub async fn resolve_tree(client: &RegistryClient, requested: &[String]) -> ResolvedTree {
    let mut warnings = Vec::new();
    let mut failures = Vec::new();
    let mut seen: HashSet<ItemRef> = HashSet::new();
    let mut roots: Vec<ItemRef> = Vec::new();
    let mut frontier: Vec<Pending> = Vec::new();

    for raw in requested {
        match client.parse_ref(raw, None) {
            Ok(reference) => {
                if seen.insert(reference.clone()) {
                    roots.push(reference.clone());
                    frontier.push(Pending {
                        reference,
                        parent: None,
                        raw: raw.clone(),
                    });
                }
            }
            Err(error) => failures.push(ResolveFailure {
                reference: raw.clone(),
                error,
            }),
        }
    }

    let mut graph: HashMap<ItemRef, Node> = HashMap::new();
    let mut indexes: HashMap<String, Option<RegistryIndex>> = HashMap::new();

    while !frontier.is_empty() {
        let references: Vec<ItemRef> = frontier.iter().map(|p| p.reference.clone()).collect();
        let results = client.fetch_items(&references).await;

        let mut next = Vec::new();
        for (pending, result) in frontier.into_iter().zip(results) {
            let item = match result {
                Ok(item) => item,
                Err(error) => {
                    match &pending.parent {
                        None => failures.push(ResolveFailure {
                            reference: pending.raw,
                            error,
                        }),
                        Some(parent) => warnings.push(format!(
                            "Skipping {} (required by {}): {}",
                            pending.reference, parent, error
                        )),
                    }
                    continue;
                }
            };

            let mut dependencies = Vec::new();
            for raw in &item.registry_dependencies {
                match client.parse_ref(raw, Some(&pending.reference)) {
                    Ok(dependency) => {
                        dependencies.push(dependency.clone());
                        if seen.insert(dependency.clone()) {
                            next.push(Pending {
                                reference: dependency,
                                parent: Some(pending.reference.clone()),
                                raw: raw.clone(),
                            });
                        }
                    }
                    Err(error) => warnings.push(format!(
                        "Skipping dependency '{}' of {}: {}",
                        raw, pending.reference, error
                    )),
                }
            }
            graph.insert(pending.reference, Node { item, dependencies });
        }

        frontier = drop_unlisted(client, next, &mut indexes, &mut warnings).await;
    }

    let order = install_order(&roots, &graph, &mut warnings);
    let items = order
        .into_iter()
        .filter_map(|reference| {
            let node = graph.remove(&reference)?;
            Some(ResolvedItem {
                reference,
                item: node.item,
            })
        })
        .collect();

    for warning in &warnings {
        warn!("{}", warning);
    }

    let mut tree = ResolvedTree::from_ordered(items);
    tree.warnings = warnings;
    tree.failures = failures;
    debug!(items = tree.items.len(), failures = tree.failures.len(), "resolved tree");
    tree
}

/// Drop dependencies that a reachable registry index does not list
async fn drop_unlisted(
    client: &RegistryClient,
    pending: Vec<Pending>,
    indexes: &mut HashMap<String, Option<RegistryIndex>>,
    warnings: &mut Vec<String>,
) -> Vec<Pending> {
    let mut missing: Vec<String> = pending
        .iter()
        .filter_map(|p| p.reference.namespace())
        .filter(|ns| !indexes.contains_key(*ns))
        .map(str::to_string)
        .collect();
    missing.sort();
    missing.dedup();

    let fetched = join_all(missing.iter().map(|ns| client.fetch_index(ns))).await;
    for (namespace, result) in missing.into_iter().zip(fetched) {
        if let Err(error) = &result {
            debug!(%namespace, %error, "registry index unavailable, not checking names");
        }
        indexes.insert(namespace, result.ok());
    }

    pending
        .into_iter()
        .filter(|p| {
            let index = p
                .reference
                .namespace()
                .and_then(|ns| indexes.get(ns))
                .and_then(Option::as_ref);
            match index {
                Some(index) if !index.contains(&p.reference.name) => {
                    let parent = p
                        .parent
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_default();
                    warnings.push(format!(
                        "Skipping {} (required by {}): not listed in the registry index",
                        p.reference, parent
                    ));
                    false
                }
                _ => true,
            }
        })
        .collect()
}

enum Frame {
    Enter(ItemRef),
    Exit(ItemRef),
}

/// Post-order walk from each root; dependencies come before dependents
fn install_order(
    roots: &[ItemRef],
    graph: &HashMap<ItemRef, Node>,
    warnings: &mut Vec<String>,
) -> Vec<ItemRef> {
    let mut order = Vec::new();
    let mut visited: HashSet<ItemRef> = HashSet::new();
    let mut on_stack: HashSet<ItemRef> = HashSet::new();

    for root in roots.iter().filter(|r| graph.contains_key(*r)) {
        let mut stack = vec![Frame::Enter(root.clone())];
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(reference) => {
                    if visited.contains(&reference) || on_stack.contains(&reference) {
                        continue;
                    }
                    let Some(node) = graph.get(&reference) else {
                        continue;
                    };
                    on_stack.insert(reference.clone());
                    stack.push(Frame::Exit(reference.clone()));
                    for dependency in node.dependencies.iter().rev() {
                        if !graph.contains_key(dependency) || visited.contains(dependency) {
                            continue;
                        }
                        if on_stack.contains(dependency) {
                            warnings.push(format!(
                                "Dependency cycle between {} and {}; ignoring the edge",
                                reference, dependency
                            ));
                            continue;
                        }
                        stack.push(Frame::Enter(dependency.clone()));
                    }
                }
                Frame::Exit(reference) => {
                    on_stack.remove(&reference);
                    if visited.insert(reference.clone()) {
                        order.push(reference);
                    }
                }
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::fetcher::testing::MemoryFetcher;
    use crate::registry::{RegistryEndpoint, RegistryMap};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::Arc;

    const BASE: &str = "https://ui.shadcn.com/r";

    fn url(name: &str) -> String {
        format!("{}/styles/new-york/{}.json", BASE, name)
    }

    fn item(name: &str, deps: &[&str]) -> Value {
        json!({
            "name": name,
            "type": "registry:ui",
            "files": [{ "path": format!("ui/{}.tsx", name), "content": "" }],
            "registryDependencies": deps,
        })
    }

    fn client(fetcher: Arc<MemoryFetcher>) -> RegistryClient {
        let mut registries = RegistryMap::with_default(BASE);
        registries.insert("@acme", RegistryEndpoint::new("https://acme.dev/r/{name}.json"));
        RegistryClient::new(fetcher, registries, "new-york")
    }

    fn names(requested: &[&str]) -> Vec<String> {
        requested.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_button_resolves_after_utils() {
        let fetcher = Arc::new(
            MemoryFetcher::new()
                .with_json(&url("button"), item("button", &["utils"]))
                .with_json(&url("utils"), item("utils", &[])),
        );
        let tree = resolve_tree(&client(fetcher), &names(&["button"])).await;

        assert_eq!(tree.names(), vec!["utils", "button"]);
        assert!(tree.warnings.is_empty());
        assert!(tree.failures.is_empty());
    }

    #[tokio::test]
    async fn test_diamond_fetches_shared_dependency_once() {
        let fetcher = Arc::new(
            MemoryFetcher::new()
                .with_json(&url("a"), item("a", &["b", "c"]))
                .with_json(&url("b"), item("b", &["d"]))
                .with_json(&url("c"), item("c", &["d"]))
                .with_json(&url("d"), item("d", &[])),
        );
        let tree = resolve_tree(&client(fetcher.clone()), &names(&["a"])).await;

        assert_eq!(tree.names(), vec!["d", "b", "c", "a"]);
        assert_eq!(fetcher.hits(&url("d")), 1);
    }

    #[tokio::test]
    async fn test_no_duplicates_and_roots_in_request_order() {
        let fetcher = Arc::new(
            MemoryFetcher::new()
                .with_json(&url("card"), item("card", &["utils"]))
                .with_json(&url("button"), item("button", &["utils"]))
                .with_json(&url("utils"), item("utils", &[])),
        );
        let tree = resolve_tree(
            &client(fetcher.clone()),
            &names(&["card", "button", "card", "utils"]),
        )
        .await;

        assert_eq!(tree.names(), vec!["utils", "card", "button"]);
        assert_eq!(fetcher.hits(&url("card")), 1);
    }

    #[tokio::test]
    async fn test_dependencies_precede_dependents() {
        let fetcher = Arc::new(
            MemoryFetcher::new()
                .with_json(&url("page"), item("page", &["form", "button"]))
                .with_json(&url("form"), item("form", &["input", "button"]))
                .with_json(&url("input"), item("input", &["utils"]))
                .with_json(&url("button"), item("button", &["utils"]))
                .with_json(&url("utils"), item("utils", &[])),
        );
        let tree = resolve_tree(&client(fetcher), &names(&["page"])).await;
        let order = tree.names();

        let position = |name: &str| order.iter().position(|n| *n == name).unwrap();
        for resolved in &tree.items {
            for dep in &resolved.item.registry_dependencies {
                assert!(position(dep) < position(&resolved.item.name));
            }
        }
        assert_eq!(order.len(), 5);
    }

    #[tokio::test]
    async fn test_unlisted_dependency_is_skipped_with_warning() {
        let fetcher = Arc::new(
            MemoryFetcher::new()
                .with_json(
                    &format!("{}/index.json", BASE),
                    json!([
                        { "name": "button", "type": "registry:ui" },
                        { "name": "utils", "type": "registry:lib" }
                    ]),
                )
                .with_json(&url("button"), item("button", &["utils", "ghost-item"]))
                .with_json(&url("utils"), item("utils", &[])),
        );
        let tree = resolve_tree(&client(fetcher.clone()), &names(&["button"])).await;

        assert_eq!(tree.names(), vec!["utils", "button"]);
        assert_eq!(tree.warnings.len(), 1);
        assert!(tree.warnings[0].contains("ghost-item"));
        assert_eq!(fetcher.hits(&url("ghost-item")), 0);
    }

    #[tokio::test]
    async fn test_failed_dependency_becomes_warning() {
        let fetcher = Arc::new(
            MemoryFetcher::new().with_json(&url("button"), item("button", &["ghost-item"])),
        );
        let tree = resolve_tree(&client(fetcher), &names(&["button"])).await;

        assert_eq!(tree.names(), vec!["button"]);
        assert!(tree.failures.is_empty());
        assert!(tree.warnings[0].contains("ghost-item"));
    }

    #[tokio::test]
    async fn test_direct_failures_are_recorded() {
        let fetcher = Arc::new(
            MemoryFetcher::new()
                .with_json(&url("button"), item("button", &[]))
                .with_status(&url("secret"), 401),
        );
        let tree = resolve_tree(
            &client(fetcher),
            &names(&["button", "secret", "@nowhere/thing"]),
        )
        .await;

        assert_eq!(tree.names(), vec!["button"]);
        let kinds: Vec<&str> = tree.failures.iter().map(|f| f.error.kind()).collect();
        assert_eq!(kinds, vec!["UnknownRegistry", "Unauthorized"]);
        assert_eq!(tree.failures[1].reference, "secret");
    }

    #[tokio::test]
    async fn test_remote_item_cannot_pull_local_files() {
        let fetcher = Arc::new(
            MemoryFetcher::new()
                .with_json(&url("button"), item("button", &["../x.json"]))
                .with_json("../x.json", item("x", &[])),
        );
        let tree = resolve_tree(&client(fetcher.clone()), &names(&["button"])).await;

        assert_eq!(tree.names(), vec!["button"]);
        assert!(tree.warnings[0].contains("../x.json"));
        assert!(tree.warnings[0].contains("local path"));
        assert_eq!(fetcher.hits("../x.json"), 0);
    }

    #[tokio::test]
    async fn test_unknown_registry_dependency_is_warning() {
        let fetcher = Arc::new(
            MemoryFetcher::new().with_json(&url("button"), item("button", &["@nowhere/x"])),
        );
        let tree = resolve_tree(&client(fetcher), &names(&["button"])).await;
        assert_eq!(tree.names(), vec!["button"]);
        assert!(tree.warnings[0].contains("@nowhere"));
    }

    #[tokio::test]
    async fn test_cycle_is_broken_with_warning() {
        let fetcher = Arc::new(
            MemoryFetcher::new()
                .with_json(&url("a"), item("a", &["b"]))
                .with_json(&url("b"), item("b", &["a"])),
        );
        let tree = resolve_tree(&client(fetcher), &names(&["a"])).await;

        assert_eq!(tree.names(), vec!["b", "a"]);
        assert_eq!(tree.warnings.len(), 1);
        assert!(tree.warnings[0].contains("cycle"));
    }

    #[tokio::test]
    async fn test_bare_dependencies_inherit_parent_registry() {
        let fetcher = Arc::new(
            MemoryFetcher::new()
                .with_json("https://acme.dev/r/header.json", item("header", &["logo", "button"]))
                .with_json("https://acme.dev/r/logo.json", item("logo", &[]))
                .with_json("https://acme.dev/r/button.json", item("button", &["@shadcn/utils"]))
                .with_json(&url("utils"), item("utils", &[])),
        );
        let tree = resolve_tree(&client(fetcher), &names(&["@acme/header"])).await;

        let refs: Vec<String> = tree.items.iter().map(|r| r.reference.to_string()).collect();
        assert_eq!(
            refs,
            vec!["@acme/logo", "@shadcn/utils", "@acme/button", "@acme/header"]
        );
    }

    #[tokio::test]
    async fn test_radius_last_write_wins() {
        let fetcher = Arc::new(
            MemoryFetcher::new()
                .with_json(
                    &url("theme"),
                    json!({
                        "name": "theme", "type": "registry:theme",
                        "files": [{ "path": "theme.css", "content": "" }],
                        "cssVars": { "light": { "radius": "0.5rem", "primary": "blue" } }
                    }),
                )
                .with_json(
                    &url("card"),
                    json!({
                        "name": "card", "type": "registry:ui",
                        "files": [{ "path": "ui/card.tsx", "content": "" }],
                        "registryDependencies": ["theme"],
                        "cssVars": { "light": { "radius": "1rem" } }
                    }),
                ),
        );
        let tree = resolve_tree(&client(fetcher), &names(&["card"])).await;

        assert_eq!(tree.css_vars["light"]["radius"], "1rem");
        assert_eq!(tree.css_vars["light"]["primary"], "blue");
    }
}
