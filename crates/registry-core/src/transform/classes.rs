//! Class list rewrites: Tailwind version migration, RTL and prefixing
//!
//! All three passes work on the same inputs: string literals the parser
//! marked as class lists (`className`/`class` values and arguments of
//! `cn`, `cva`, `clsx`, `cx` and `twMerge`). Each token is split into
//! `variant:value/modifier` so the passes only ever look at the value.

use super::edit::{apply_edits, Edit};
use super::syntax::{parse, ParseError, Span, SyntaxKind, SyntaxNode};
use super::{Transform, TransformContext};
use crate::project::TailwindVersion;

/// Renamed utilities, as (v3, v4)
const VERSION_RENAMES: &[(&str, &str)] = &[
    ("shadow-sm", "shadow-xs"),
    ("shadow", "shadow-sm"),
    ("drop-shadow-sm", "drop-shadow-xs"),
    ("drop-shadow", "drop-shadow-sm"),
    ("blur-sm", "blur-xs"),
    ("blur", "blur-sm"),
    ("backdrop-blur-sm", "backdrop-blur-xs"),
    ("backdrop-blur", "backdrop-blur-sm"),
    ("rounded-sm", "rounded-xs"),
    ("rounded", "rounded-sm"),
    ("outline-none", "outline-hidden"),
    ("ring", "ring-3"),
];

/// Physical to logical prefixes; longer and negative forms come first
const RTL_MAPPINGS: &[(&str, &str)] = &[
    ("-ml-", "-ms-"),
    ("-mr-", "-me-"),
    ("ml-", "ms-"),
    ("mr-", "me-"),
    ("pl-", "ps-"),
    ("pr-", "pe-"),
    ("-left-", "-start-"),
    ("-right-", "-end-"),
    ("left-", "start-"),
    ("right-", "end-"),
    ("inset-l-", "inset-inline-start-"),
    ("inset-r-", "inset-inline-end-"),
    ("rounded-tl-", "rounded-ss-"),
    ("rounded-tr-", "rounded-se-"),
    ("rounded-bl-", "rounded-es-"),
    ("rounded-br-", "rounded-ee-"),
    ("rounded-l-", "rounded-s-"),
    ("rounded-r-", "rounded-e-"),
    ("border-l-", "border-s-"),
    ("border-r-", "border-e-"),
    ("border-l", "border-s"),
    ("border-r", "border-e"),
    ("text-left", "text-start"),
    ("text-right", "text-end"),
    ("scroll-ml-", "scroll-ms-"),
    ("scroll-mr-", "scroll-me-"),
    ("scroll-pl-", "scroll-ps-"),
    ("scroll-pr-", "scroll-pe-"),
    ("float-left", "float-start"),
    ("float-right", "float-end"),
    ("clear-left", "clear-start"),
    ("clear-right", "clear-end"),
    ("origin-top-left", "origin-top-start"),
    ("origin-top-right", "origin-top-end"),
    ("origin-bottom-left", "origin-bottom-start"),
    ("origin-bottom-right", "origin-bottom-end"),
    ("origin-left", "origin-start"),
    ("origin-right", "origin-end"),
];

/// Kept as-is, plus an `rtl:` twin with the sign flipped
const RTL_TRANSLATE_X: &[(&str, &str)] = &[
    ("-translate-x-", "translate-x-"),
    ("translate-x-", "-translate-x-"),
];

/// Kept as-is, plus an `rtl:` reverse utility
const RTL_REVERSE: &[(&str, &str)] = &[
    ("space-x-", "space-x-reverse"),
    ("divide-x-", "divide-x-reverse"),
];

/// Kept as-is, plus an `rtl:` twin with the swapped value
const RTL_SWAP: &[(&str, &str)] = &[
    ("cursor-w-resize", "cursor-e-resize"),
    ("cursor-e-resize", "cursor-w-resize"),
];

/// Slide animations under logical side variants, as (variant, physical, logical)
const RTL_LOGICAL_SIDE_SLIDES: &[(&str, &str, &str)] = &[
    ("data-[side=inline-start]", "slide-in-from-right", "slide-in-from-end"),
    ("data-[side=inline-start]", "slide-out-to-right", "slide-out-to-end"),
    ("data-[side=inline-end]", "slide-in-from-left", "slide-in-from-start"),
    ("data-[side=inline-end]", "slide-out-to-left", "slide-out-to-start"),
];

const PHYSICAL_SIDE_VARIANTS: &[&str] = &["data-[side=left]", "data-[side=right]"];

const POSITIONING_PREFIXES: &[&str] = &["-left-", "-right-", "left-", "right-"];

pub const RTL_FLIP_MARKER: &str = "cn-rtl-flip";

/// Components whose `side` prop takes logical values
const SIDE_PROP_COMPONENTS: &[&str] = &[
    "ContextMenuContent",
    "ContextMenuSubContent",
    "DropdownMenuSubContent",
];

/// One class token, split as `variant:value/modifier`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassToken<'a> {
    pub variant: Option<&'a str>,
    pub value: &'a str,
    pub modifier: Option<&'a str>,
}

impl<'a> ClassToken<'a> {
    /// Separators inside `[...]` and `(...)` belong to arbitrary values
    pub fn split(token: &'a str) -> Self {
        let variant_end = last_top_level(token, b':');
        let (variant, rest) = match variant_end {
            Some(idx) => (Some(&token[..idx]), &token[idx + 1..]),
            None => (None, token),
        };
        let (value, modifier) = match first_top_level(rest, b'/') {
            Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
            None => (rest, None),
        };
        Self {
            variant,
            value,
            modifier,
        }
    }

    fn with_value(&self, value: &str) -> String {
        join_class(self.variant, value, self.modifier)
    }
}

fn join_class(variant: Option<&str>, value: &str, modifier: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(variant) = variant {
        out.push_str(variant);
        out.push(':');
    }
    out.push_str(value);
    if let Some(modifier) = modifier {
        out.push('/');
        out.push_str(modifier);
    }
    out
}

fn top_level_positions(token: &str, needle: u8) -> impl Iterator<Item = usize> + '_ {
    let mut depth = 0i32;
    token.bytes().enumerate().filter_map(move |(idx, c)| {
        match c {
            b'[' | b'(' => depth += 1,
            b']' | b')' => depth -= 1,
            _ if c == needle && depth == 0 => return Some(idx),
            _ => {}
        }
        None
    })
}

fn last_top_level(token: &str, needle: u8) -> Option<usize> {
    top_level_positions(token, needle).last()
}

fn first_top_level(token: &str, needle: u8) -> Option<usize> {
    top_level_positions(token, needle).next()
}

/// Rewrite each whitespace-separated token of a class list.
///
/// Separators are preserved. A token that maps to nothing is removed with
/// the whitespace before it (or after it, when it leads the list).
pub fn map_class_list<F>(input: &str, mut map: F) -> String
where
    F: FnMut(&str) -> Vec<String>,
{
    let mut pieces: Vec<(bool, String)> = Vec::new();
    let mut start = 0;
    let mut in_space = None;
    for (idx, c) in input.char_indices() {
        let space = c.is_whitespace();
        if in_space != Some(space) {
            if idx > start {
                pieces.push((in_space == Some(true), input[start..idx].to_string()));
            }
            start = idx;
            in_space = Some(space);
        }
    }
    if start < input.len() {
        pieces.push((in_space == Some(true), input[start..].to_string()));
    }

    let mut out: Vec<String> = Vec::with_capacity(pieces.len());
    let mut drop_next_space = false;
    for (is_space, text) in pieces {
        if is_space {
            if drop_next_space {
                drop_next_space = false;
                continue;
            }
            out.push(text);
            continue;
        }
        drop_next_space = false;
        let mapped = map(&text);
        if mapped.is_empty() {
            if out.last().map(|s| s.trim().is_empty()).unwrap_or(false) {
                out.pop();
            } else {
                drop_next_space = true;
            }
            continue;
        }
        out.push(mapped.join(" "));
    }
    out.concat()
}

/// Rename utilities whose names changed between Tailwind versions
pub fn migrate_class(token: &str, from: TailwindVersion, to: TailwindVersion) -> String {
    if from == to {
        return token.to_string();
    }
    let class = ClassToken::split(token);
    let (bang, bare) = match class.value.strip_prefix('!') {
        Some(rest) => ("!", rest),
        None => ("", class.value),
    };
    let renamed = VERSION_RENAMES.iter().find_map(|(v3, v4)| match to {
        TailwindVersion::V4 if *v3 == bare => Some(*v4),
        TailwindVersion::V3 if *v4 == bare => Some(*v3),
        _ => None,
    });
    match renamed {
        Some(value) => class.with_value(&format!("{}{}", bang, value)),
        None => token.to_string(),
    }
}

pub fn migrate_class_list(input: &str, from: TailwindVersion, to: TailwindVersion) -> String {
    map_class_list(input, |token| vec![migrate_class(token, from, to)])
}

/// Physical to logical class mapping for one class list.
///
/// `rtl` decides what happens to the flip marker: it becomes
/// `rtl:rotate-180`, or is dropped when RTL output is off.
pub fn apply_rtl_mapping(input: &str, rtl: bool) -> String {
    map_class_list(input, |token| {
        if token == RTL_FLIP_MARKER {
            return if rtl {
                vec!["rtl:rotate-180".to_string()]
            } else {
                Vec::new()
            };
        }
        if rtl {
            rtl_token(token)
        } else {
            vec![token.to_string()]
        }
    })
}

fn rtl_token(token: &str) -> Vec<String> {
    let class = ClassToken::split(token);
    if class.value.is_empty() {
        return vec![token.to_string()];
    }
    let (bang, value) = match class.value.strip_prefix('!') {
        Some(rest) => ("!", rest),
        None => ("", class.value),
    };
    let rtl_variant = |variant: Option<&str>| match variant {
        Some(v) => format!("rtl:{}", v),
        None => "rtl".to_string(),
    };

    for (physical, flipped) in RTL_TRANSLATE_X {
        if let Some(rest) = value.strip_prefix(physical) {
            let twin = join_class(
                Some(&rtl_variant(class.variant)),
                &format!("{}{}{}", bang, flipped, rest),
                class.modifier,
            );
            return vec![token.to_string(), twin];
        }
    }

    for (prefix, reverse) in RTL_REVERSE {
        if value.starts_with(prefix) {
            let twin = join_class(Some(&rtl_variant(class.variant)), reverse, None);
            return vec![token.to_string(), twin];
        }
    }

    for (physical, swapped) in RTL_SWAP {
        if value == *physical {
            let twin = join_class(Some(&rtl_variant(class.variant)), swapped, None);
            return vec![token.to_string(), twin];
        }
    }

    if let Some(variant) = class.variant {
        for (side, physical, logical) in RTL_LOGICAL_SIDE_SLIDES {
            if let Some(rest) = value.strip_prefix(physical) {
                if variant.contains(side) {
                    return vec![class.with_value(&format!("{}{}{}", bang, logical, rest))];
                }
            }
        }
    }

    let physical_side = class
        .variant
        .map(|v| PHYSICAL_SIDE_VARIANTS.iter().any(|side| v.contains(side)))
        .unwrap_or(false);

    for (physical, logical) in RTL_MAPPINGS {
        if physical_side && POSITIONING_PREFIXES.contains(physical) {
            continue;
        }
        let mapped = match physical.strip_suffix('-') {
            Some(bare) if value == bare => logical.trim_end_matches('-').to_string(),
            Some(_) => match value.strip_prefix(physical) {
                Some(rest) => format!("{}{}", logical, rest),
                None => continue,
            },
            None if value == *physical => logical.to_string(),
            None => match value.strip_prefix(physical) {
                Some(rest) if rest.starts_with('-') => format!("{}{}", logical, rest),
                _ => continue,
            },
        };
        return vec![class.with_value(&format!("{}{}", bang, mapped))];
    }

    vec![token.to_string()]
}

/// Apply the Tailwind `prefix` option to one token.
///
/// Tailwind 3 prefixes the utility itself (`hover:-tw-mt-2`); Tailwind 4
/// uses a leading variant (`tw:hover:-mt-2`).
pub fn apply_prefix(token: &str, prefix: &str, version: TailwindVersion) -> String {
    if prefix.is_empty() {
        return token.to_string();
    }
    match version {
        TailwindVersion::V4 => {
            let variant = prefix.trim_end_matches(':');
            let marker = format!("{}:", variant);
            if token.starts_with(&marker) {
                token.to_string()
            } else {
                format!("{}{}", marker, token)
            }
        }
        TailwindVersion::V3 => {
            let class = ClassToken::split(token);
            let value = class.value;
            let lead_len = value.len() - value.trim_start_matches(['!', '-']).len();
            let (lead, bare) = value.split_at(lead_len);
            if bare.is_empty() || bare.starts_with(prefix) {
                return token.to_string();
            }
            class.with_value(&format!("{}{}{}", lead, prefix, bare))
        }
    }
}

pub fn apply_prefix_list(input: &str, prefix: &str, version: TailwindVersion) -> String {
    map_class_list(input, |token| vec![apply_prefix(token, prefix, version)])
}

/// Edits that rewrite every class-list string in `tree`
fn class_list_edits<F>(tree: &SyntaxNode, source: &str, mut rewrite: F) -> Vec<Edit>
where
    F: FnMut(&str) -> String,
{
    tree.descendants()
        .filter(|node| matches!(node.kind, SyntaxKind::StringLiteral { class_context: true }))
        .filter(|node| node.span.len() >= 2)
        .filter_map(|node| {
            let inner = Span::new(node.span.start + 1, node.span.end - 1);
            let text = &source[inner.start..inner.end];
            let rewritten = rewrite(text);
            (rewritten != text).then(|| Edit::replace(inner, rewritten))
        })
        .collect()
}

pub struct TailwindVersionPass;

impl Transform for TailwindVersionPass {
    fn name(&self) -> &'static str {
        "tailwind-version"
    }

    fn apply(&self, source: &str, ctx: &TransformContext<'_>) -> Result<String, ParseError> {
        let (from, to) = (ctx.source_tailwind, ctx.config.tailwind_version);
        if from == to {
            return Ok(source.to_string());
        }
        let tree = parse(source)?;
        let edits = class_list_edits(&tree, source, |text| migrate_class_list(text, from, to));
        Ok(apply_edits(source, edits))
    }
}

pub struct RtlPass;

impl Transform for RtlPass {
    fn name(&self) -> &'static str {
        "rtl"
    }

    fn apply(&self, source: &str, ctx: &TransformContext<'_>) -> Result<String, ParseError> {
        let rtl = ctx.config.rtl;
        if !rtl && !source.contains(RTL_FLIP_MARKER) {
            return Ok(source.to_string());
        }
        let tree = parse(source)?;
        let mut edits = class_list_edits(&tree, source, |text| apply_rtl_mapping(text, rtl));
        if rtl {
            edits.extend(side_prop_edits(&tree, source));
        }
        Ok(apply_edits(source, edits))
    }
}

/// `side="right"` → `side="inline-end"` on components that accept logical sides
fn side_prop_edits(tree: &SyntaxNode, source: &str) -> Vec<Edit> {
    tree.descendants()
        .filter(|node| {
            node.as_jsx()
                .map(|e| SIDE_PROP_COMPONENTS.contains(&e.name.as_str()))
                .unwrap_or(false)
        })
        .filter_map(|node| {
            let value = node.attribute("side")?.attribute_value()?;
            if !matches!(value.kind, SyntaxKind::StringLiteral { .. }) {
                return None;
            }
            let text = value.text(source);
            let logical = match &text[1..text.len() - 1] {
                "right" => "inline-end",
                "left" => "inline-start",
                _ => return None,
            };
            Some(Edit::replace(value.span, format!("\"{}\"", logical)))
        })
        .collect()
}

pub struct PrefixPass;

impl Transform for PrefixPass {
    fn name(&self) -> &'static str {
        "prefix"
    }

    fn apply(&self, source: &str, ctx: &TransformContext<'_>) -> Result<String, ParseError> {
        let prefix = ctx.config.tailwind_prefix.as_str();
        if prefix.is_empty() {
            return Ok(source.to_string());
        }
        let version = ctx.config.tailwind_version;
        let tree = parse(source)?;
        let edits = class_list_edits(&tree, source, |text| apply_prefix_list(text, prefix, version));
        Ok(apply_edits(source, edits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::testing::run_pass;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_token() {
        assert_eq!(
            ClassToken::split("hover:bg-primary/90"),
            ClassToken {
                variant: Some("hover"),
                value: "bg-primary",
                modifier: Some("90"),
            }
        );
        let arbitrary = ClassToken::split("data-[state=open]:w-[calc(100%/2)]");
        assert_eq!(arbitrary.variant, Some("data-[state=open]"));
        assert_eq!(arbitrary.value, "w-[calc(100%/2)]");
        assert_eq!(arbitrary.modifier, None);
        let nested = ClassToken::split("[&>svg]:size-4");
        assert_eq!(nested.variant, Some("[&>svg]"));
        assert_eq!(nested.value, "size-4");
    }

    #[test]
    fn test_migrate_to_v4() {
        assert_eq!(
            migrate_class_list(
                "shadow-sm shadow focus-visible:outline-none rounded hover:ring !blur-sm p-2",
                TailwindVersion::V3,
                TailwindVersion::V4
            ),
            "shadow-xs shadow-sm focus-visible:outline-hidden rounded-sm hover:ring-3 !blur-xs p-2"
        );
    }

    #[test]
    fn test_migrate_to_v3() {
        assert_eq!(
            migrate_class_list(
                "shadow-xs shadow-sm outline-hidden ring-3 rounded-md",
                TailwindVersion::V4,
                TailwindVersion::V3
            ),
            "shadow-sm shadow outline-none ring rounded-md"
        );
    }

    #[test]
    fn test_rtl_mapping() {
        assert_eq!(
            apply_rtl_mapping("ml-2 -mr-1 pl-4 text-left border-l border-l-2 rounded-tl-md", true),
            "ms-2 -me-1 ps-4 text-start border-s border-s-2 rounded-ss-md"
        );
        assert_eq!(
            apply_rtl_mapping("absolute left-0 -right-2 top-1/2 hover:pr-3", true),
            "absolute start-0 -end-2 top-1/2 hover:pe-3"
        );
        assert_eq!(apply_rtl_mapping("border-lime-500 rounded-lg", true), "border-lime-500 rounded-lg");
    }

    #[test]
    fn test_rtl_additive_variants() {
        assert_eq!(
            apply_rtl_mapping("-translate-x-1/2 space-x-2 cursor-w-resize", true),
            "-translate-x-1/2 rtl:translate-x-1/2 space-x-2 rtl:space-x-reverse cursor-w-resize rtl:cursor-e-resize"
        );
        assert_eq!(
            apply_rtl_mapping("data-[state=open]:translate-x-2", true),
            "data-[state=open]:translate-x-2 rtl:data-[state=open]:-translate-x-2"
        );
    }

    #[test]
    fn test_rtl_side_variants() {
        assert_eq!(
            apply_rtl_mapping("data-[side=inline-start]:slide-in-from-right-2", true),
            "data-[side=inline-start]:slide-in-from-end-2"
        );
        assert_eq!(
            apply_rtl_mapping("data-[side=left]:-right-1 data-[side=left]:ml-1", true),
            "data-[side=left]:-right-1 data-[side=left]:ms-1"
        );
    }

    #[test]
    fn test_flip_marker() {
        assert_eq!(apply_rtl_mapping("size-4 cn-rtl-flip", true), "size-4 rtl:rotate-180");
        assert_eq!(apply_rtl_mapping("size-4 cn-rtl-flip ml-2", false), "size-4 ml-2");
        assert_eq!(apply_rtl_mapping("cn-rtl-flip size-4", false), "size-4");
    }

    #[test]
    fn test_prefix() {
        assert_eq!(
            apply_prefix_list("bg-white hover:-mt-2 !p-2 tw-flex", "tw-", TailwindVersion::V3),
            "tw-bg-white hover:-tw-mt-2 !tw-p-2 tw-flex"
        );
        assert_eq!(
            apply_prefix_list("bg-white hover:-mt-2 tw:flex", "tw", TailwindVersion::V4),
            "tw:bg-white tw:hover:-mt-2 tw:flex"
        );
    }

    #[test]
    fn test_map_class_list_keeps_separators() {
        assert_eq!(
            map_class_list("a  b\n  c", |t| vec![t.to_uppercase()]),
            "A  B\n  C"
        );
    }

    #[test]
    fn test_rtl_pass_on_source() {
        let source = r#"const buttonVariants = cva("inline-flex ml-2", {
  variants: { size: { sm: "pl-2 pr-3" } },
  defaultVariants: { size: "sm" },
})

export function Menu() {
  return (
    <ContextMenuContent side="right" className={cn("text-left", open && "mr-1")}>
      <ChevronRight className="cn-rtl-flip" />
    </ContextMenuContent>
  )
}
"#;
        let output = run_pass(RtlPass, source, |config| config.rtl = true);
        assert_eq!(
            output,
            r#"const buttonVariants = cva("inline-flex ms-2", {
  variants: { size: { sm: "ps-2 pe-3" } },
  defaultVariants: { size: "sm" },
})

export function Menu() {
  return (
    <ContextMenuContent side="inline-end" className={cn("text-start", open && "me-1")}>
      <ChevronRight className="rtl:rotate-180" />
    </ContextMenuContent>
  )
}
"#
        );
    }

    #[test]
    fn test_rtl_pass_disabled_only_strips_marker() {
        let source = r#"const a = <Icon className="ml-2 cn-rtl-flip" />"#;
        let output = run_pass(RtlPass, source, |config| config.rtl = false);
        assert_eq!(output, r#"const a = <Icon className="ml-2" />"#);
    }

    #[test]
    fn test_tailwind_version_pass_skips_same_version() {
        let source = r#"const a = <div className="shadow-sm" />"#;
        assert_eq!(run_pass(TailwindVersionPass, source, |_| {}), source);
    }

    #[test]
    fn test_prefix_pass_only_touches_class_lists() {
        let source = r#"const a = <div id="flex" className="flex p-2" />"#;
        let output = run_pass(PrefixPass, source, |config| {
            config.tailwind_prefix = "tw-".to_string();
            config.tailwind_version = TailwindVersion::V3;
        });
        assert_eq!(output, r#"const a = <div id="flex" className="tw-flex tw-p-2" />"#);
    }
}
