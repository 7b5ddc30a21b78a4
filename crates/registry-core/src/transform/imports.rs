//! Rewrites registry import and re-export specifiers to the project's aliases

use super::edit::{apply_edits, Edit};
use super::syntax::{parse, ParseError, Span, SyntaxKind};
use super::{Transform, TransformContext};
use crate::config::Aliases;

const REGISTRY_PREFIX: &str = "@/registry/";

pub struct ImportsPass;

impl Transform for ImportsPass {
    fn name(&self) -> &'static str {
        "imports"
    }

    fn apply(&self, source: &str, ctx: &TransformContext<'_>) -> Result<String, ParseError> {
        let tree = parse(source)?;
        let aliases = &ctx.config.aliases;

        let edits: Vec<Edit> = tree
            .children
            .iter()
            .filter(|node| matches!(node.kind, SyntaxKind::Import { .. }))
            .filter_map(|node| {
                let SyntaxKind::Import { source: specifier } = &node.kind else {
                    return None;
                };
                let rewritten = rewrite_specifier(specifier, aliases)?;
                let literal = node.children.first()?;
                let inner = Span::new(literal.span.start + 1, literal.span.end - 1);
                Some(Edit::replace(inner, rewritten))
            })
            .collect();

        Ok(apply_edits(source, edits))
    }
}

/// The aliased form of `specifier`, or `None` when it needs no change
pub fn rewrite_specifier(specifier: &str, aliases: &Aliases) -> Option<String> {
    let rewritten = match specifier.strip_prefix(REGISTRY_PREFIX) {
        Some(rest) => rewrite_registry_path(rest, aliases)?,
        None => rewrite_placeholder(specifier, aliases)?,
    };
    (rewritten != specifier).then_some(rewritten)
}

/// `@/registry/<style...>/<root>/<rest>`; the style may span several segments
fn rewrite_registry_path(rest: &str, aliases: &Aliases) -> Option<String> {
    let segments: Vec<&str> = rest.split('/').collect();
    let (index, root) = segments
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, seg)| matches!(**seg, "ui" | "lib" | "hooks" | "components" | "blocks"))?;
    let tail = segments[index + 1..].join("/");

    let base = match *root {
        "ui" => &aliases.ui,
        "hooks" => &aliases.hooks,
        "components" | "blocks" => &aliases.components,
        "lib" if tail == "utils" => return Some(aliases.utils.clone()),
        "lib" => &aliases.lib,
        _ => return None,
    };
    Some(join(base, &tail))
}

fn rewrite_placeholder(specifier: &str, aliases: &Aliases) -> Option<String> {
    let table: [(&str, &str); 5] = [
        ("@/components/ui", &aliases.ui),
        ("@/components", &aliases.components),
        ("@/lib/utils", &aliases.utils),
        ("@/lib", &aliases.lib),
        ("@/hooks", &aliases.hooks),
    ];
    table.iter().find_map(|(placeholder, alias)| {
        let rest = specifier.strip_prefix(placeholder)?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(format!("{}{}", alias, rest))
        } else {
            None
        }
    })
}

fn join(base: &str, tail: &str) -> String {
    if tail.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), tail)
    }
}
