//! Turns Radix `asChild` composition into Base UI render props
//!
//! `<Trigger asChild><Button variant="outline">Edit</Button></Trigger>`
//! becomes `<Trigger render={<Button variant="outline" />}>Edit</Trigger>`.
//! Children that do not render a `<button>` get `nativeButton={false}`.

use super::edit::{apply_edits, Edit};
use super::syntax::{parse, ParseError, SyntaxKind, SyntaxNode};
use super::{Transform, TransformContext};

const MAX_ROUNDS: usize = 16;

/// Components that forward to a non-button element
const NON_BUTTON_COMPONENTS: &[&str] = &["Link", "NavLink"];

pub struct AsChildPass;

impl Transform for AsChildPass {
    fn name(&self) -> &'static str {
        "as-child"
    }

    fn apply(&self, source: &str, ctx: &TransformContext<'_>) -> Result<String, ParseError> {
        if !ctx.config.style.starts_with("base-") || !source.contains("asChild") {
            return Ok(source.to_string());
        }

        let mut current = source.to_string();
        for _ in 0..MAX_ROUNDS {
            let tree = parse(&current)?;
            let edits: Vec<Edit> = tree
                .descendants()
                .filter_map(|node| as_child_edit(node, &current))
                .collect();
            if edits.is_empty() {
                break;
            }
            let next = apply_edits(&current, edits);
            if next == current {
                break;
            }
            current = next;
        }
        Ok(current)
    }
}

fn is_as_child(attr: &SyntaxNode, source: &str) -> bool {
    if attr.attribute_name() != Some("asChild") {
        return false;
    }
    match attr.attribute_value() {
        None => true,
        Some(value) => value.text(source).replace(' ', "") == "{true}",
    }
}

fn renders_native_button(name: &str) -> bool {
    if name == "button" {
        return true;
    }
    let intrinsic = name.chars().next().map(|c| c.is_ascii_lowercase()).unwrap_or(false);
    !intrinsic && !NON_BUTTON_COMPONENTS.contains(&name)
}

fn as_child_edit(node: &SyntaxNode, source: &str) -> Option<Edit> {
    let element = node.as_jsx()?;
    if element.self_closing || !node.attributes().any(|attr| is_as_child(attr, source)) {
        return None;
    }

    let mut significant = node.content().filter(|c| !c.is_whitespace(source));
    let child = significant.next()?;
    if significant.next().is_some() {
        return None;
    }
    let child_element = child.as_jsx()?;
    if child_element.name.is_empty() {
        return None;
    }

    let mut opening = format!("<{}", element.name);
    for attr in node.attributes().filter(|attr| !is_as_child(attr, source)) {
        opening.push(' ');
        opening.push_str(attr.text(source));
    }

    let mut target = format!("<{}", child_element.name);
    for attr in child.attributes() {
        target.push(' ');
        target.push_str(attr.text(source));
    }
    opening.push_str(&format!(" render={{{} />}}", target));
    if !renders_native_button(&child_element.name) {
        opening.push_str(" nativeButton={false}");
    }

    let content: String = child.content().map(|c| c.text(source)).collect();
    Some(Edit::replace(
        node.span,
        format!("{}>{}</{}>", opening, content.trim(), element.name),
    ))
}
