//! Merging item `css` rules into the project stylesheet
//!
//! Keys are selectors or at-rules; values are declaration strings or nested
//! objects. Nested objects inside at-rules become nested blocks, nested
//! objects inside plain rules become sibling rules (`&` is expanded against
//! the parent selector). Keyframes always live inside `@theme inline`.

use super::stylesheet::{
    ensure_block, ensure_statement, ensure_top_statement, find_block, normalize_header,
    upsert_declarations,
};
use crate::schema::CssRules;
use indexmap::IndexMap;
use serde_json::Value;

const THEME_BLOCK: &str = "@theme inline";

/// Merge `rules` into `css`
pub fn update_css_rules(css: &str, rules: &CssRules) -> String {
    let mut output = css.to_string();
    for (key, value) in rules {
        let header = normalize_header(key);
        if header.is_empty() {
            continue;
        }
        if header.starts_with('@') && is_empty_object(value) {
            output = ensure_top_statement(&output, &header);
            continue;
        }
        let path = if header.starts_with("@keyframes") {
            vec![THEME_BLOCK.to_string(), header]
        } else {
            vec![header]
        };
        output = apply_rule(output, &path, value);
    }
    output
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().map(|o| o.is_empty()).unwrap_or(false)
}

fn apply_rule(css: String, path: &[String], value: &Value) -> String {
    let mut output = ensure_block(css, path);
    let indent = "  ".repeat(path.len());

    let mut properties = IndexMap::new();
    let mut statements = Vec::new();
    let mut nested = Vec::new();
    match value {
        Value::String(text) => properties.extend(parse_declarations(text)),
        Value::Object(entries) => {
            for (key, value) in entries {
                match value {
                    Value::String(text) => {
                        properties.insert(key.trim().to_string(), text.trim().to_string());
                    }
                    Value::Object(map) if map.is_empty() && key.trim_start().starts_with('@') => {
                        statements.push(normalize_header(key));
                    }
                    Value::Object(_) => nested.push((key.trim().to_string(), value)),
                    _ => {}
                }
            }
        }
        _ => {}
    }

    if !properties.is_empty() {
        if let Some(block) = find_block(&output, path) {
            output = upsert_declarations(&output, &block, &properties, &indent);
        }
    }
    for statement in statements {
        if let Some(block) = find_block(&output, path) {
            output = ensure_statement(&output, &block, &statement, &indent);
        }
    }

    let Some((selector, parent)) = path.split_last() else {
        return output;
    };
    for (key, value) in nested {
        let child = if selector.starts_with('@') {
            let mut child = path.to_vec();
            child.push(normalize_header(&key));
            child
        } else {
            let mut child = parent.to_vec();
            child.push(nested_selector(selector, &key));
            child
        };
        output = apply_rule(output, &child, value);
    }
    output
}

/// `.btn` + `&:hover` is `.btn:hover`; the suffix goes before any
/// pseudo-class already on the parent
fn nested_selector(parent: &str, key: &str) -> String {
    match key.strip_prefix('&') {
        Some(suffix) => {
            let split = parent.find(':').unwrap_or(parent.len());
            normalize_header(&format!("{}{}{}", &parent[..split], suffix, &parent[split..]))
        }
        None => normalize_header(key),
    }
}

/// `a: b; c: d` into ordered pairs; fragments without a colon are dropped
fn parse_declarations(text: &str) -> Vec<(String, String)> {
    text.split(';')
        .filter_map(|segment| {
            let (property, value) = segment.split_once(':')?;
            let property = property.trim();
            let value = value.trim();
            (!property.is_empty() && !value.is_empty())
                .then(|| (property.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rules(value: Value) -> CssRules {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_adds_utility_after_imports() {
        let output = update_css_rules(
            "@import \"tailwindcss\";\n",
            &rules(json!({ "@utility content-auto": { "content-visibility": "auto" } })),
        );
        assert_eq!(
            output,
            "@import \"tailwindcss\";\n\n@utility content-auto {\n  content-visibility: auto;\n}\n"
        );
    }

    #[test]
    fn test_layer_with_nested_rules() {
        let output = update_css_rules(
            "@import \"tailwindcss\";\n",
            &rules(json!({
                "@layer components": {
                    ".card": {
                        "background-color": "white",
                        "border-radius": "0.5rem"
                    }
                }
            })),
        );
        assert_eq!(
            output,
            "@import \"tailwindcss\";\n\n@layer components {\n  .card {\n    background-color: white;\n    border-radius: 0.5rem;\n  }\n}\n"
        );
    }

    #[test]
    fn test_updates_existing_declarations() {
        let css = "@utility content-auto {\n  content-visibility: hidden;\n}\n";
        let output = update_css_rules(
            css,
            &rules(json!({ "@utility content-auto": { "content-visibility": "auto", "contain": "paint" } })),
        );
        assert_eq!(
            output,
            "@utility content-auto {\n  content-visibility: auto;\n  contain: paint;\n}\n"
        );
    }

    #[test]
    fn test_utility_with_nested_pseudo_element() {
        let output = update_css_rules(
            "",
            &rules(json!({
                "@utility scrollbar-hidden": {
                    "scrollbar-width": "none",
                    "&::-webkit-scrollbar": { "display": "none" }
                }
            })),
        );
        assert_eq!(
            output,
            "@utility scrollbar-hidden {\n  scrollbar-width: none;\n  &::-webkit-scrollbar {\n    display: none;\n  }\n}\n"
        );
    }

    #[test]
    fn test_ampersand_in_plain_rule_becomes_sibling() {
        let output = update_css_rules(
            "",
            &rules(json!({ ".btn": { "color": "red", "&:hover": { "color": "blue" } } })),
        );
        assert_eq!(
            output,
            ".btn {\n  color: red;\n}\n\n.btn:hover {\n  color: blue;\n}\n"
        );
    }

    #[test]
    fn test_keyframes_go_under_theme() {
        let output = update_css_rules(
            "",
            &rules(json!({
                "@keyframes wiggle": {
                    "0%, 100%": { "transform": "rotate(-3deg)" },
                    "50%": { "transform": "rotate(3deg)" }
                }
            })),
        );
        assert_eq!(
            output,
            "@theme inline {\n  @keyframes wiggle {\n    0%, 100% {\n      transform: rotate(-3deg);\n    }\n    50% {\n      transform: rotate(3deg);\n    }\n  }\n}\n"
        );
    }

    #[test]
    fn test_string_bodies_and_statements() {
        let output = update_css_rules(
            "",
            &rules(json!({
                "@import \"@fontsource-variable/inter\"": {},
                "@layer base": { "body": { "@apply font-sans bg-background": {} } },
                ".prose": "max-width: 65ch; color: inherit"
            })),
        );
        assert_eq!(
            output,
            "@import \"@fontsource-variable/inter\";\n\n@layer base {\n  body {\n    @apply font-sans bg-background;\n  }\n}\n\n.prose {\n  max-width: 65ch;\n  color: inherit;\n}\n"
        );
    }

    #[test]
    fn test_idempotent() {
        let input = rules(json!({
            "@layer base": { "html": { "@apply font-sans": {} } },
            "@utility content-auto": { "content-visibility": "auto" }
        }));
        let once = update_css_rules("@import \"tailwindcss\";\n", &input);
        assert_eq!(update_css_rules(&once, &input), once);
    }
}
