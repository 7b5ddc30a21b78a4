//! Just enough of a JavaScript scanner to edit object and array literals in
//! config files: top-level properties and elements with their spans

use crate::transform::Span;

/// A property of an object literal. Spread and shorthand entries are not
/// reported.
#[derive(Debug, Clone)]
pub(super) struct Property {
    pub key: String,
    pub value: Span,
}

/// An object or array literal delimited by `open` and `close`
#[derive(Debug, Clone)]
pub(super) struct Literal {
    pub open: usize,
    pub close: usize,
}

impl Literal {
    /// Find the literal whose opening bracket is at `open`
    pub fn at(source: &str, open: usize) -> Option<Literal> {
        let bytes = source.as_bytes();
        let closer = match bytes.get(open)? {
            b'{' => b'}',
            b'[' => b']',
            _ => return None,
        };
        let mut depth = 0usize;
        let mut i = open;
        while i < bytes.len() {
            if let Some(next) = skip_trivia(source, i) {
                i = next;
                continue;
            }
            match bytes[i] {
                b'{' | b'[' | b'(' => depth += 1,
                b'}' | b']' | b')' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return (bytes[i] == closer).then_some(Literal { open, close: i });
                    }
                }
                _ => {}
            }
            i += 1;
        }
        None
    }

    /// Comma-separated entries, trimmed, without a trailing empty one
    pub fn entries(&self, source: &str) -> Vec<Span> {
        let bytes = source.as_bytes();
        let mut entries = Vec::new();
        let mut depth = 0usize;
        let mut start = self.open + 1;
        let mut i = start;
        while i < self.close {
            if let Some(next) = skip_trivia(source, i) {
                i = next;
                continue;
            }
            match bytes[i] {
                b'{' | b'[' | b'(' => depth += 1,
                b'}' | b']' | b')' => depth = depth.saturating_sub(1),
                b',' if depth == 0 => {
                    entries.push(trim(source, Span::new(start, i)));
                    start = i + 1;
                }
                _ => {}
            }
            i += 1;
        }
        entries.push(trim(source, Span::new(start, self.close)));
        entries.retain(|span| span.start < span.end);
        entries
    }

    pub fn properties(&self, source: &str) -> Vec<Property> {
        self.entries(source)
            .into_iter()
            .filter_map(|entry| property(source, entry))
            .collect()
    }

    /// Offset just past the last entry, or just inside the opening bracket
    pub fn content_end(&self, source: &str) -> usize {
        trim(source, Span::new(self.open + 1, self.close)).end.max(self.open + 1)
    }
}

fn property(source: &str, entry: Span) -> Option<Property> {
    let text = &source[entry.start..entry.end];
    if text.starts_with("...") {
        return None;
    }
    let (key, rest) = match text.as_bytes().first()? {
        quote @ (b'"' | b'\'') => {
            let end = text[1..].find(*quote as char)? + 1;
            (text[1..end].to_string(), &text[end + 1..])
        }
        _ => {
            let end = text
                .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
                .unwrap_or(text.len());
            (text[..end].to_string(), &text[end..])
        }
    };
    let after_colon = rest.trim_start().strip_prefix(':')?;
    let value_start = entry.end - after_colon.len();
    Some(Property {
        key,
        value: trim(source, Span::new(value_start, entry.end)),
    })
}

/// Skip a comment or string starting at `i`, returning the offset after it
fn skip_trivia(source: &str, i: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    match bytes[i] {
        b'/' if bytes.get(i + 1) == Some(&b'/') => Some(
            source[i..]
                .find('\n')
                .map(|p| i + p)
                .unwrap_or(source.len()),
        ),
        b'/' if bytes.get(i + 1) == Some(&b'*') => Some(
            source[i + 2..]
                .find("*/")
                .map(|p| i + 2 + p + 2)
                .unwrap_or(source.len()),
        ),
        quote @ (b'"' | b'\'' | b'`') => {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j] != quote {
                if bytes[j] == b'\\' {
                    j += 1;
                }
                j += 1;
            }
            Some((j + 1).min(source.len()))
        }
        _ => None,
    }
}

/// Shrink `span` past whitespace and comments on both sides
fn trim(source: &str, span: Span) -> Span {
    let mut start = span.start;
    loop {
        let text = &source[start..span.end];
        let trimmed = text.trim_start();
        start += text.len() - trimmed.len();
        if trimmed.starts_with("//") || trimmed.starts_with("/*") {
            match skip_trivia(source, start) {
                Some(next) if next <= span.end => start = next,
                _ => break,
            }
        } else {
            break;
        }
    }
    let end = start + source[start..span.end].trim_end().len();
    Span::new(start, end)
}

/// The first object literal in `source` that declares one of `keys`
pub(super) fn find_object_with_key(source: &str, keys: &[&str]) -> Option<Literal> {
    let bytes = source.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if let Some(next) = skip_trivia(source, i) {
            i = next;
            continue;
        }
        if bytes[i] == b'{' {
            if let Some(literal) = Literal::at(source, i) {
                if literal
                    .properties(source)
                    .iter()
                    .any(|p| keys.contains(&p.key.as_str()))
                {
                    return Some(literal);
                }
            }
        }
        i += 1;
    }
    None
}

/// Indentation of the line containing `offset`
pub(super) fn line_indent(source: &str, offset: usize) -> &str {
    let line_start = source[..offset].rfind('\n').map(|p| p + 1).unwrap_or(0);
    let line = &source[line_start..];
    &line[..line.len() - line.trim_start().len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"import type { Config } from "tailwindcss"

const config = {
  // dark mode via class
  darkMode: ["class"],
  content: ["./app/**/*.{ts,tsx}", "./components/**/*.{ts,tsx}"],
  theme: {
    extend: { colors: { border: "hsl(var(--border))" } },
  },
  "future": { hoverOnlyWhenSupported: true },
  ...shared,
  plugins: [require("tailwindcss-animate")],
} satisfies Config

export default config
"#;

    #[test]
    fn test_finds_config_object_and_properties() {
        let object = find_object_with_key(CONFIG, &["content"]).unwrap();
        let keys: Vec<String> = object.properties(CONFIG).into_iter().map(|p| p.key).collect();
        assert_eq!(keys, vec!["darkMode", "content", "theme", "future", "plugins"]);

        let theme = object
            .properties(CONFIG)
            .into_iter()
            .find(|p| p.key == "theme")
            .unwrap();
        let nested = Literal::at(CONFIG, theme.value.start).unwrap();
        let extend = &nested.properties(CONFIG)[0];
        assert_eq!(
            &CONFIG[extend.value.start..extend.value.end],
            r#"{ colors: { border: "hsl(var(--border))" } }"#
        );
    }

    #[test]
    fn test_array_entries() {
        let source = "[a, require(\"b, c\"), [1, 2], ]";
        let array = Literal::at(source, 0).unwrap();
        let entries: Vec<&str> = array
            .entries(source)
            .into_iter()
            .map(|s| &source[s.start..s.end])
            .collect();
        assert_eq!(entries, vec!["a", "require(\"b, c\")", "[1, 2]"]);
        assert_eq!(array.content_end(source), source.len() - 2);
    }

    #[test]
    fn test_unbalanced_literal_is_none() {
        assert!(Literal::at("{ a: [1, 2 }", 0).is_none());
        assert!(find_object_with_key("module.exports = {", &["content"]).is_none());
    }
}
