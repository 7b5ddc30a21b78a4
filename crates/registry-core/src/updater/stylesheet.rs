//! Block-level editing of CSS text
//!
//! Rules and at-rules are found by their normalized header and edited in
//! place through span edits, so untouched parts of the stylesheet keep their
//! exact formatting.

use crate::transform::{apply_edits, Edit, Span};
use indexmap::IndexMap;

/// A `{ ... }` block: its selector or at-rule header and brace offsets
#[derive(Debug, Clone)]
pub(super) struct Block {
    pub header: String,
    /// Start of the statement, header included
    pub start: usize,
    pub open: usize,
    pub close: usize,
}

impl Block {
    pub fn body(&self) -> Span {
        Span::new(self.open + 1, self.close)
    }
}

pub(super) fn normalize_header(header: &str) -> String {
    header.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Blocks directly inside `range`, skipping comments and strings
pub(super) fn blocks_in(css: &str, range: Span) -> Vec<Block> {
    let bytes = css.as_bytes();
    let mut blocks = Vec::new();
    let mut depth = 0usize;
    let mut statement_start = range.start;
    let mut open = range.start;
    let mut i = range.start;

    while i < range.end {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = css[i + 2..range.end]
                    .find("*/")
                    .map(|p| i + 2 + p + 2)
                    .unwrap_or(range.end);
                if depth == 0 {
                    statement_start = i;
                }
                continue;
            }
            quote @ (b'"' | b'\'') => {
                i += 1;
                while i < range.end && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'{' => {
                if depth == 0 {
                    open = i;
                }
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    blocks.push(Block {
                        header: normalize_header(&css[statement_start..open]),
                        start: statement_start,
                        open,
                        close: i,
                    });
                    statement_start = i + 1;
                }
            }
            b';' if depth == 0 => statement_start = i + 1,
            _ => {}
        }
        i += 1;
    }
    blocks
}

pub(super) fn find_block(css: &str, path: &[String]) -> Option<Block> {
    let mut range = Span::new(0, css.len());
    let mut found = None;
    for header in path {
        let block = blocks_in(css, range)
            .into_iter()
            .find(|b| &b.header == header)?;
        range = block.body();
        found = Some(block);
    }
    found
}

/// Create the blocks along `path` that do not exist yet
pub(super) fn ensure_block(css: String, path: &[String]) -> String {
    let Some((last, parent)) = path.split_last() else {
        return css;
    };
    if find_block(&css, path).is_some() {
        return css;
    }

    if parent.is_empty() {
        let mut output = css;
        if !output.is_empty() {
            if !output.ends_with('\n') {
                output.push('\n');
            }
            output.push('\n');
        }
        output.push_str(&format!("{} {{\n}}\n", last));
        return output;
    }

    let css = ensure_block(css, parent);
    let Some(parent_block) = find_block(&css, parent) else {
        return css;
    };
    let indent = "  ".repeat(parent.len());
    let text = format!("\n{}{} {{\n{}}}", indent, last, indent);
    insert_before_close(&css, &parent_block, text, &"  ".repeat(parent.len() - 1), Vec::new())
}

/// Insert `text` after the last non-blank content of `block`, keeping the
/// closing brace on its own line
pub(super) fn insert_before_close(
    css: &str,
    block: &Block,
    text: String,
    closing_indent: &str,
    mut edits: Vec<Edit>,
) -> String {
    let body = block.body();
    let content_end = body.start + css[body.start..body.end].trim_end().len();
    edits.push(Edit::replace(Span::new(content_end, content_end), text));
    if !css[content_end..block.close].contains('\n') {
        edits.push(Edit::replace(
            Span::new(content_end, block.close),
            format!("\n{}", closing_indent),
        ));
    }
    apply_edits(css, edits)
}

pub(super) struct Declaration {
    pub property: String,
    pub value: Span,
}

/// Declarations in `range`, which must not contain nested blocks
fn declarations_in(css: &str, range: Span) -> Vec<Declaration> {
    let text = &css[range.start..range.end];
    let mut result = Vec::new();
    let mut offset = 0;
    for segment in text.split(';') {
        let start = range.start + offset;
        offset += segment.len() + 1;

        let mut rest = segment;
        let mut skipped = 0;
        loop {
            let trimmed = rest.trim_start();
            skipped += rest.len() - trimmed.len();
            rest = trimmed;
            match rest.strip_prefix("/*").and_then(|r| r.find("*/").map(|p| p + 4)) {
                Some(len) => {
                    skipped += len;
                    rest = &rest[len..];
                }
                None => break,
            }
        }
        if rest.starts_with('@') {
            continue;
        }
        let Some(colon) = rest.find(':') else {
            continue;
        };
        let property = rest[..colon].trim().to_string();
        let raw_value = &rest[colon + 1..];
        let leading = raw_value.len() - raw_value.trim_start().len();
        let value_start = start + skipped + colon + 1 + leading;
        let value_end = value_start + raw_value.trim().len();
        result.push(Declaration {
            property,
            value: Span::new(value_start, value_end),
        });
    }
    result
}

/// Declarations written directly in a block, ignoring nested rules
pub(super) fn declarations(css: &str, block: &Block) -> Vec<Declaration> {
    let body = block.body();
    let mut result = Vec::new();
    let mut cursor = body.start;
    for nested in blocks_in(css, body) {
        result.extend(declarations_in(css, Span::new(cursor, nested.start)));
        cursor = nested.close + 1;
    }
    result.extend(declarations_in(css, Span::new(cursor, body.end)));
    result
}

fn needs_semicolon(body: &str) -> bool {
    !body.is_empty()
        && !body.ends_with(';')
        && !body.ends_with('{')
        && !body.ends_with('}')
        && !body.ends_with("*/")
}

/// Replace or append `properties` (full property names) in `block`
pub(super) fn upsert_declarations(
    css: &str,
    block: &Block,
    properties: &IndexMap<String, String>,
    indent: &str,
) -> String {
    let existing = declarations(css, block);
    let mut edits = Vec::new();
    let mut appended = String::new();

    for (property, value) in properties {
        match existing.iter().find(|d| &d.property == property) {
            Some(decl) => {
                if &css[decl.value.start..decl.value.end] != value {
                    edits.push(Edit::replace(decl.value, value.clone()));
                }
            }
            None => appended.push_str(&format!("\n{}{}: {};", indent, property, value)),
        }
    }

    if appended.is_empty() {
        return apply_edits(css, edits);
    }
    if needs_semicolon(css[block.open + 1..block.close].trim_end()) {
        appended.insert(0, ';');
    }
    let closing_indent = &indent[..indent.len().saturating_sub(2)];
    insert_before_close(css, block, appended, closing_indent, edits)
}

/// Add a bodiless statement such as `@apply font-sans` to `block` unless an
/// identical one is already there
pub(super) fn ensure_statement(css: &str, block: &Block, statement: &str, indent: &str) -> String {
    let wanted = normalize_header(statement);
    let body = block.body();
    let mut cursor = body.start;
    let mut present = false;
    for nested in blocks_in(css, body)
        .into_iter()
        .map(Some)
        .chain(std::iter::once(None))
    {
        let end = nested.as_ref().map(|b| b.start).unwrap_or(body.end);
        present |= css[cursor..end]
            .split(';')
            .any(|s| normalize_header(s) == wanted);
        if let Some(nested) = nested {
            cursor = nested.close + 1;
        }
    }
    if present {
        return css.to_string();
    }

    let mut text = format!("\n{}{};", indent, statement.trim());
    if needs_semicolon(css[block.open + 1..block.close].trim_end()) {
        text.insert(0, ';');
    }
    let closing_indent = &indent[..indent.len().saturating_sub(2)];
    insert_before_close(css, block, text, closing_indent, Vec::new())
}

/// Add a top-level statement such as `@import "x"` after the existing
/// imports, or at the start of the file
pub(super) fn ensure_top_statement(css: &str, statement: &str) -> String {
    let wanted = normalize_header(statement);
    let mut imports_end = None;
    let mut offset = 0;
    for line in css.split_inclusive('\n') {
        let trimmed = line.trim().trim_end_matches(';');
        if normalize_header(trimmed) == wanted {
            return css.to_string();
        }
        if trimmed.starts_with("@import") || trimmed.starts_with("@charset") {
            imports_end = Some(offset + line.len());
        }
        offset += line.len();
    }

    let line = format!("{};\n", statement.trim());
    match imports_end {
        Some(end) => {
            let mut output = css.to_string();
            if !output[..end].ends_with('\n') {
                output.insert(end, '\n');
                output.insert_str(end + 1, &line);
            } else {
                output.insert_str(end, &line);
            }
            output
        }
        None if css.is_empty() => line,
        None => format!("{}\n{}", line, css),
    }
}
