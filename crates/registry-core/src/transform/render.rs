//! Moves element children into the element passed as `render`
//!
//! `<Trigger render={<Button />}>Open</Trigger>` becomes
//! `<Trigger render={<Button>Open</Button>} />`. Only `base-*` styles use
//! the render-prop composition model.

use super::edit::{apply_edits, Edit};
use super::syntax::{parse, ParseError, SyntaxKind, SyntaxNode};
use super::{Transform, TransformContext};

/// Nested matches are resolved one level per round
const MAX_ROUNDS: usize = 16;

pub struct RenderPass;

impl Transform for RenderPass {
    fn name(&self) -> &'static str {
        "render"
    }

    fn apply(&self, source: &str, ctx: &TransformContext<'_>) -> Result<String, ParseError> {
        if !ctx.config.style.starts_with("base-") || !source.contains("render=") {
            return Ok(source.to_string());
        }

        let mut current = source.to_string();
        for _ in 0..MAX_ROUNDS {
            let tree = parse(&current)?;
            let edits: Vec<Edit> = tree
                .descendants()
                .filter_map(|node| render_edit(node, &current))
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

fn render_edit(node: &SyntaxNode, source: &str) -> Option<Edit> {
    let element = node.as_jsx()?;
    if element.self_closing {
        return None;
    }

    let value = node.attribute("render")?.attribute_value()?;
    if value.kind != SyntaxKind::JsxExpression {
        return None;
    }
    let mut significant = value.children.iter().filter(|c| !c.is_whitespace(source));
    let target = significant.next()?;
    if significant.next().is_some() {
        return None;
    }
    let target_element = target.as_jsx()?;
    if !target_element.self_closing {
        return None;
    }

    let children: String = node
        .content()
        .filter_map(|child| match child.kind {
            SyntaxKind::JsxText => {
                let text = child.text(source).trim();
                (!text.is_empty()).then_some(text)
            }
            _ => Some(child.text(source)),
        })
        .collect();
    if children.is_empty() {
        return None;
    }

    let target_open = target
        .text(source)
        .trim_end_matches("/>")
        .trim_end();
    let filled = format!("{}>{}</{}>", target_open, children, target_element.name);

    let head = &source[node.span.start..target.span.start];
    let tail = source[target.span.end..element.opening.end - 1].trim_end();
    Some(Edit::replace(
        node.span,
        format!("{}{}{} />", head, filled, tail),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::testing::run_pass;
    use pretty_assertions::assert_eq;

    fn base(source: &str) -> String {
        run_pass(RenderPass, source, |config| config.style = "base-default".to_string())
    }

    fn wrap(jsx: &str) -> String {
        format!(
            "import * as React from \"react\"\n\nexport function Component() {{\n  return (\n    {}\n  )\n}}",
            jsx
        )
    }

    #[test]
    fn test_moves_text_children() {
        assert_eq!(
            base(&wrap(
                r#"<DropdownMenuTrigger render={<Button className="w-fit" />}>Open</DropdownMenuTrigger>"#
            )),
            wrap(r#"<DropdownMenuTrigger render={<Button className="w-fit">Open</Button>} />"#)
        );
    }

    #[test]
    fn test_keeps_parent_and_render_props() {
        assert_eq!(
            base(&wrap(
                r#"<MenuTrigger className="my-class" disabled render={<Button variant="outline" size="sm" />}>Open Menu</MenuTrigger>"#
            )),
            wrap(
                r#"<MenuTrigger className="my-class" disabled render={<Button variant="outline" size="sm">Open Menu</Button>} />"#
            )
        );
    }

    #[test]
    fn test_render_without_props() {
        assert_eq!(
            base(&wrap(r#"<PopoverTrigger render={<Button />}>Click me</PopoverTrigger>"#)),
            wrap(r#"<PopoverTrigger render={<Button>Click me</Button>} />"#)
        );
    }

    #[test]
    fn test_complex_children_are_trimmed() {
        let source = wrap(
            "<TooltipTrigger render={<Button variant=\"ghost\" />}>\n      <Icon /> Settings\n    </TooltipTrigger>",
        );
        assert_eq!(
            base(&source),
            wrap(r#"<TooltipTrigger render={<Button variant="ghost"><Icon />Settings</Button>} />"#)
        );
    }

    #[test]
    fn test_expression_children_and_anchor_targets() {
        assert_eq!(
            base(&wrap(r#"<DropdownMenuTrigger render={<Button />}>{label}</DropdownMenuTrigger>"#)),
            wrap(r#"<DropdownMenuTrigger render={<Button>{label}</Button>} />"#)
        );
        assert_eq!(
            base(&wrap(r#"<Button render={<a href="/home" />}>Go Home</Button>"#)),
            wrap(r#"<Button render={<a href="/home">Go Home</a>} />"#)
        );
    }

    #[test]
    fn test_leaves_non_matching_elements() {
        let empty = wrap(r#"<DropdownMenuTrigger render={<Button className="w-fit" />}></DropdownMenuTrigger>"#);
        assert_eq!(base(&empty), empty);

        let filled = wrap(r#"<DropdownMenuTrigger render={<Button>Existing</Button>}>Ignored</DropdownMenuTrigger>"#);
        assert_eq!(base(&filled), filled);
    }

    #[test]
    fn test_only_base_styles() {
        let source = wrap(r#"<DropdownMenuTrigger render={<Button />}>Open</DropdownMenuTrigger>"#);
        let output = run_pass(RenderPass, &source, |config| config.style = "new-york".to_string());
        assert_eq!(output, source);
    }

    #[test]
    fn test_multiple_matches() {
        let source = wrap(
            "<div>\n      <DialogTrigger render={<Button variant=\"outline\" />}>Edit</DialogTrigger>\n      <DialogClose render={<Button variant=\"ghost\" />}>Cancel</DialogClose>\n    </div>",
        );
        assert_eq!(
            base(&source),
            wrap(
                "<div>\n      <DialogTrigger render={<Button variant=\"outline\">Edit</Button>} />\n      <DialogClose render={<Button variant=\"ghost\">Cancel</Button>} />\n    </div>"
            )
        );
    }

    #[test]
    fn test_nested_matches() {
        let source = wrap(
            "<Outer render={<A />}><Inner render={<B />}>x</Inner></Outer>",
        );
        assert_eq!(
            base(&source),
            wrap("<Outer render={<A><Inner render={<B>x</B>} /></A>} />")
        );
    }

    #[test]
    fn test_idempotent() {
        let source = wrap(r#"<DropdownMenuTrigger render={<Button className="w-fit" />}>Open</DropdownMenuTrigger>"#);
        let once = base(&source);
        assert_eq!(base(&once), once);
    }
}
