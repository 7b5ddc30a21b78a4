//! Merging item `tailwind.config` fragments into a v3 `tailwind.config.*`
//!
//! Missing keys are added and nested objects are merged. Values the project
//! already sets are left alone, except `plugins`, which gains the entries it
//! lacks. Files without a recognizable config object are not touched.

use super::js_object::{find_object_with_key, line_indent, Literal};
use crate::transform::{apply_edits, Edit, Span};
use serde_json::{Map, Value};

const CONFIG_KEYS: &[&str] = &["content", "theme", "plugins", "darkMode"];

/// Merge the `config` part of an aggregated `tailwind` fragment into `source`
pub fn update_tailwind_config(source: &str, fragment: &Value) -> String {
    let Some(config) = fragment.get("config").and_then(Value::as_object) else {
        return source.to_string();
    };
    if config.is_empty() {
        return source.to_string();
    }
    let Some(object) = find_object_with_key(source, CONFIG_KEYS) else {
        return source.to_string();
    };

    let quote = quote_char(source);
    let mut edits = Vec::new();
    merge_object(source, &object, config, quote, &mut edits);
    apply_edits(source, edits)
}

/// The quote character the file already uses for strings
fn quote_char(source: &str) -> char {
    match (source.find('"'), source.find('\'')) {
        (Some(d), Some(s)) if s < d => '\'',
        (None, Some(_)) => '\'',
        _ => '"',
    }
}

fn merge_object(
    source: &str,
    object: &Literal,
    fragment: &Map<String, Value>,
    quote: char,
    edits: &mut Vec<Edit>,
) {
    let properties = object.properties(source);
    let indent = member_indent(source, object);
    let mut missing = String::new();

    for (key, value) in fragment {
        let existing = properties.iter().find(|p| &p.key == key);
        match (existing, value) {
            (Some(property), Value::Object(nested)) => {
                if let Some(literal) = Literal::at(source, property.value.start) {
                    if source.as_bytes()[literal.open] == b'{' {
                        merge_object(source, &literal, nested, quote, edits);
                    }
                }
            }
            (Some(property), Value::Array(entries)) if key == "plugins" => {
                if let Some(literal) = Literal::at(source, property.value.start) {
                    append_plugins(source, &literal, entries, edits);
                }
            }
            (Some(_), _) => {}
            (None, _) => {
                let literal = if key == "plugins" {
                    plugin_array(value)
                } else {
                    js_literal(value, &indent, quote)
                };
                missing.push_str(&format!("\n{}{}: {},", indent, js_key(key, quote), literal));
            }
        }
    }

    if missing.is_empty() {
        return;
    }
    let end = object.content_end(source);
    if end > object.open + 1 && !source[..end].ends_with(',') {
        missing.insert(0, ',');
    }
    edits.push(Edit::replace(Span::new(end, end), missing));
    if !source[end..object.close].contains('\n') {
        edits.push(Edit::replace(
            Span::new(end, object.close),
            format!("\n{}", line_indent(source, object.open)),
        ));
    }
}

/// Indentation for members of `object`: that of its first member, or one
/// level deeper than the line it opens on
fn member_indent(source: &str, object: &Literal) -> String {
    match object.entries(source).first() {
        Some(first) if source[object.open..first.start].contains('\n') => {
            line_indent(source, first.start).to_string()
        }
        _ => format!("{}  ", line_indent(source, object.open)),
    }
}

/// Plugin entries are code, e.g. `require("tailwindcss-animate")`
fn plugin_code(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '\'' { '"' } else { c })
        .collect()
}

fn plugin_array(value: &Value) -> String {
    let entries: Vec<&str> = value
        .as_array()
        .map(|entries| entries.iter().filter_map(plugin_code).collect())
        .unwrap_or_default();
    format!("[{}]", entries.join(", "))
}

fn append_plugins(source: &str, array: &Literal, wanted: &[Value], edits: &mut Vec<Edit>) {
    let present: Vec<String> = array
        .entries(source)
        .into_iter()
        .map(|span| normalize_code(&source[span.start..span.end]))
        .collect();
    let mut added: Vec<&str> = Vec::new();
    for code in wanted.iter().filter_map(plugin_code) {
        let normalized = normalize_code(code);
        if !present.contains(&normalized) && !added.iter().any(|a| normalize_code(a) == normalized) {
            added.push(code);
        }
    }
    if added.is_empty() {
        return;
    }

    let end = array.content_end(source);
    let mut text = added.join(", ");
    if end > array.open + 1 {
        text.insert_str(0, if source[..end].ends_with(',') { " " } else { ", " });
    }
    edits.push(Edit::replace(Span::new(end, end), text));
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn js_key(key: &str, quote: char) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        js_string(key, quote)
    }
}

fn js_string(value: &str, quote: char) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace(quote, &format!("\\{}", quote));
    format!("{}{}{}", quote, escaped, quote)
}

/// Render `value` as a JavaScript literal whose own members sit one level
/// deeper than `indent`
fn js_literal(value: &Value, indent: &str, quote: char) -> String {
    match value {
        Value::String(s) => js_string(s, quote),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(|v| js_literal(v, indent, quote)).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        Value::Object(map) => {
            let inner = format!("{}  ", indent);
            let members: String = map
                .iter()
                .map(|(k, v)| format!("\n{}{}: {},", inner, js_key(k, quote), js_literal(v, &inner, quote)))
                .collect();
            format!("{{{}\n{}}}", members, indent)
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const CONFIG: &str = r#"import type { Config } from "tailwindcss"

const config = {
  content: ["./app/**/*.{ts,tsx}"],
  theme: {
    extend: {
      colors: {
        border: "hsl(var(--border))",
      },
    },
  },
  plugins: [],
} satisfies Config

export default config
"#;

    #[test]
    fn test_merges_theme_plugins_and_dark_mode() {
        let fragment = json!({
            "config": {
                "darkMode": ["class"],
                "theme": {
                    "extend": {
                        "colors": { "border": "red", "ring": "hsl(var(--ring))" },
                        "keyframes": { "accordion-down": { "from": { "height": "0" } } }
                    }
                },
                "plugins": ["require(\"tailwindcss-animate\")"]
            }
        });
        assert_eq!(
            update_tailwind_config(CONFIG, &fragment),
            r#"import type { Config } from "tailwindcss"

const config = {
  content: ["./app/**/*.{ts,tsx}"],
  theme: {
    extend: {
      colors: {
        border: "hsl(var(--border))",
        ring: "hsl(var(--ring))",
      },
      keyframes: {
        "accordion-down": {
          from: {
            height: "0",
          },
        },
      },
    },
  },
  plugins: [require("tailwindcss-animate")],
  darkMode: ["class"],
} satisfies Config

export default config
"#
        );
    }

    #[test]
    fn test_idempotent() {
        let fragment = json!({
            "config": {
                "theme": { "extend": { "borderRadius": { "lg": "var(--radius)" } } },
                "plugins": ["require('tailwindcss-animate')"]
            }
        });
        let once = update_tailwind_config(CONFIG, &fragment);
        assert!(once.contains("plugins: [require('tailwindcss-animate')],"));
        assert_eq!(update_tailwind_config(&once, &fragment), once);
    }

    #[test]
    fn test_single_quotes_and_inline_objects() {
        let source = "module.exports = {\n  content: ['./src/**/*.js'],\n  theme: { extend: {} },\n  plugins: [require('a')]\n}\n";
        let fragment = json!({
            "config": {
                "theme": { "extend": { "colors": { "brand": "#123" } } },
                "plugins": ["require(\"a\")", "require(\"b\")"]
            }
        });
        assert_eq!(
            update_tailwind_config(source, &fragment),
            "module.exports = {\n  content: ['./src/**/*.js'],\n  theme: { extend: {\n    colors: {\n      brand: '#123',\n    },\n  } },\n  plugins: [require('a'), require(\"b\")]\n}\n"
        );
    }

    #[test]
    fn test_unrecognized_files_are_left_alone() {
        let fragment = json!({ "config": { "darkMode": ["class"] } });
        assert_eq!(update_tailwind_config("export default {}\n", &fragment), "export default {}\n");
        assert_eq!(update_tailwind_config(CONFIG, &json!({})), CONFIG);
    }
}
