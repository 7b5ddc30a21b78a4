//! A lightweight syntax tree for TypeScript/JavaScript sources with JSX
//!
//! The tree only distinguishes what the transform passes need: comments,
//! string and template literals, import declarations and JSX structure.
//! Everything else is kept as opaque [`SyntaxKind::Code`] runs, so the
//! concatenated spans of a node's children always cover its own source.

use thiserror::Error;

/// Call expressions whose string arguments are class lists
const CLASS_FUNCTIONS: &[&str] = &["cn", "cva", "clsx", "cx", "twMerge"];

/// Object keys whose string values are variant names, not class lists
const NON_CLASS_KEYS: &[&str] = &["defaultVariants", "compoundVariants"];

/// JSX attributes whose string values are class lists
const CLASS_ATTRIBUTES: &[&str] = &["className", "class"];

/// Byte range into the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsxElement {
    /// Tag name; empty for fragments
    pub name: String,
    pub self_closing: bool,
    /// `<Name ...>` or `<Name ... />`
    pub opening: Span,
    /// `</Name>`, absent when self-closing
    pub closing: Option<Span>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxKind {
    Program,
    Code,
    Comment,
    /// Quoted string including its quotes
    StringLiteral { class_context: bool },
    TemplateLiteral,
    /// Import declaration or `export ... from` re-export, including a
    /// trailing semicolon
    Import { source: String },
    JsxElement(JsxElement),
    JsxAttribute { name: String },
    JsxText,
    /// `{ ... }` inside JSX, braces included
    JsxExpression,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: SyntaxKind,
    pub span: Span,
    pub children: Vec<SyntaxNode>,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("parse error at byte {offset}: {message}")]
pub struct ParseError {
    pub offset: usize,
    pub message: String,
}

impl SyntaxNode {
    fn leaf(kind: SyntaxKind, start: usize, end: usize) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
            children: Vec::new(),
        }
    }

    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.span.start..self.span.end]
    }

    /// This node and all nodes below it, in document order
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    pub fn as_jsx(&self) -> Option<&JsxElement> {
        match &self.kind {
            SyntaxKind::JsxElement(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_whitespace(&self, source: &str) -> bool {
        matches!(self.kind, SyntaxKind::Code | SyntaxKind::JsxText)
            && self.text(source).trim().is_empty()
    }

    /// Attributes and spreads inside an element's opening tag
    pub fn attributes(&self) -> impl Iterator<Item = &SyntaxNode> {
        let opening = self.as_jsx().map(|e| e.opening);
        self.children
            .iter()
            .filter(move |child| opening.map(|o| o.contains(child.span)).unwrap_or(false))
    }

    pub fn attribute(&self, name: &str) -> Option<&SyntaxNode> {
        self.attributes().find(|attr| attr.attribute_name() == Some(name))
    }

    pub fn attribute_name(&self) -> Option<&str> {
        match &self.kind {
            SyntaxKind::JsxAttribute { name } => Some(name),
            _ => None,
        }
    }

    /// Value node of an attribute (`"..."`, `{...}` or an element)
    pub fn attribute_value(&self) -> Option<&SyntaxNode> {
        match self.kind {
            SyntaxKind::JsxAttribute { .. } => self.children.first(),
            _ => None,
        }
    }

    /// Children between the opening and closing tags
    pub fn content(&self) -> impl Iterator<Item = &SyntaxNode> {
        let opening_end = self.as_jsx().map(|e| e.opening.end);
        self.children
            .iter()
            .filter(move |child| opening_end.map(|end| child.span.start >= end).unwrap_or(false))
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a SyntaxNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a SyntaxNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Parse a source file into a syntax tree
pub fn parse(source: &str) -> Result<SyntaxNode, ParseError> {
    let mut parser = Parser {
        src: source,
        bytes: source.as_bytes(),
        pos: 0,
    };
    let children = parser.parse_code(false, false)?;
    Ok(SyntaxNode {
        kind: SyntaxKind::Program,
        span: Span::new(0, source.len()),
        children,
    })
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

struct Frame {
    delimiter: u8,
    class_context: bool,
}

impl<'a> Parser<'a> {
    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek(0).map(|c| c.is_ascii_whitespace()).unwrap_or(false) {
            self.pos += 1;
        }
    }

    fn next_significant(&self) -> Option<u8> {
        self.bytes[self.pos..]
            .iter()
            .copied()
            .find(|c| !c.is_ascii_whitespace())
    }

    fn flush_code(&self, nodes: &mut Vec<SyntaxNode>, start: usize, end: usize) {
        if start < end {
            nodes.push(SyntaxNode::leaf(SyntaxKind::Code, start, end));
        }
    }

    /// Scan code until EOF, or until an unmatched `}` when `in_braces`
    fn parse_code(&mut self, in_braces: bool, class_context: bool) -> Result<Vec<SyntaxNode>, ParseError> {
        let mut nodes = Vec::new();
        let mut code_start = self.pos;
        let mut prev: Option<u8> = None;
        let mut last_word: &'a str = "";
        let mut colon_label: &'a str = "";
        let mut frames: Vec<Frame> = Vec::new();

        while let Some(c) = self.peek(0) {
            let context = frames
                .last()
                .map(|f| f.class_context)
                .unwrap_or(class_context);
            let after_word = prev.map(is_ident_char).unwrap_or(false);

            match c {
                b'/' if matches!(self.peek(1), Some(b'/') | Some(b'*')) => {
                    self.flush_code(&mut nodes, code_start, self.pos);
                    nodes.push(self.parse_comment()?);
                    code_start = self.pos;
                }
                b'/' if regex_allowed(prev, after_word, last_word) => {
                    self.skip_regex()?;
                    prev = Some(b'/');
                }
                b'"' | b'\'' => {
                    self.flush_code(&mut nodes, code_start, self.pos);
                    let start = self.pos;
                    self.skip_string(c)?;
                    let in_object = frames.last().map(|f| f.delimiter == b'{').unwrap_or(false);
                    let is_key = in_object
                        && matches!(prev, Some(b'{') | Some(b','))
                        && self.next_significant() == Some(b':');
                    nodes.push(SyntaxNode::leaf(
                        SyntaxKind::StringLiteral {
                            class_context: context && !is_key,
                        },
                        start,
                        self.pos,
                    ));
                    code_start = self.pos;
                    prev = Some(c);
                }
                b'`' => {
                    self.flush_code(&mut nodes, code_start, self.pos);
                    nodes.push(self.parse_template()?);
                    code_start = self.pos;
                    prev = Some(b'`');
                }
                b'<' if jsx_allowed(prev, after_word, last_word) && self.jsx_follows() => {
                    self.flush_code(&mut nodes, code_start, self.pos);
                    nodes.push(self.parse_jsx_element()?);
                    code_start = self.pos;
                    prev = Some(b')');
                }
                b'(' | b'[' | b'{' => {
                    let frame_context = match c {
                        b'(' => context || (after_word && CLASS_FUNCTIONS.contains(&last_word)),
                        b'{' => {
                            context && !(prev == Some(b':') && NON_CLASS_KEYS.contains(&colon_label))
                        }
                        _ => context,
                    };
                    frames.push(Frame {
                        delimiter: c,
                        class_context: frame_context,
                    });
                    self.pos += 1;
                    prev = Some(c);
                }
                b')' | b']' | b'}' => {
                    if frames.is_empty() && c == b'}' && in_braces {
                        break;
                    }
                    frames.pop();
                    self.pos += 1;
                    prev = Some(c);
                }
                c if is_ident_start(c) => {
                    let start = self.pos;
                    while self.peek(0).map(is_ident_char).unwrap_or(false) {
                        self.pos += 1;
                    }
                    let word = &self.src[start..self.pos];
                    if word == "import"
                        && !in_braces
                        && frames.is_empty()
                        && prev != Some(b'.')
                        && self.import_follows()
                    {
                        self.flush_code(&mut nodes, code_start, start);
                        nodes.push(self.parse_import(start)?);
                        code_start = self.pos;
                        prev = Some(b';');
                        last_word = "";
                        continue;
                    }
                    if word == "export" && !in_braces && frames.is_empty() && prev != Some(b'.') {
                        if let Some(literal) = self.reexport_source() {
                            self.flush_code(&mut nodes, code_start, start);
                            self.pos = literal;
                            nodes.push(self.parse_import(start)?);
                            code_start = self.pos;
                            prev = Some(b';');
                            last_word = "";
                            continue;
                        }
                    }
                    last_word = word;
                    prev = self.bytes.get(self.pos - 1).copied();
                }
                c if c.is_ascii_whitespace() => self.pos += 1,
                _ => {
                    if c == b':' && after_word {
                        colon_label = last_word;
                    }
                    last_word = "";
                    self.pos += 1;
                    prev = Some(c);
                }
            }
        }

        self.flush_code(&mut nodes, code_start, self.pos);
        Ok(nodes)
    }

    fn parse_comment(&mut self) -> Result<SyntaxNode, ParseError> {
        let start = self.pos;
        if self.peek(1) == Some(b'/') {
            while self.peek(0).map(|c| c != b'\n').unwrap_or(false) {
                self.pos += 1;
            }
        } else {
            self.pos += 2;
            loop {
                match self.peek(0) {
                    None => return Err(self.error("unterminated block comment")),
                    Some(b'*') if self.peek(1) == Some(b'/') => {
                        self.pos += 2;
                        break;
                    }
                    Some(_) => self.pos += 1,
                }
            }
        }
        Ok(SyntaxNode::leaf(SyntaxKind::Comment, start, self.pos))
    }

    fn skip_string(&mut self, quote: u8) -> Result<(), ParseError> {
        self.pos += 1;
        loop {
            match self.peek(0) {
                None | Some(b'\n') => return Err(self.error("unterminated string literal")),
                Some(b'\\') => self.pos += 2,
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn skip_regex(&mut self) -> Result<(), ParseError> {
        self.pos += 1;
        let mut in_class = false;
        loop {
            match self.peek(0) {
                None | Some(b'\n') => return Err(self.error("unterminated regular expression")),
                Some(b'\\') => self.pos += 2,
                Some(b'[') => {
                    in_class = true;
                    self.pos += 1;
                }
                Some(b']') => {
                    in_class = false;
                    self.pos += 1;
                }
                Some(b'/') if !in_class => {
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        while self.peek(0).map(|c| c.is_ascii_alphabetic()).unwrap_or(false) {
            self.pos += 1;
        }
        Ok(())
    }

    fn parse_template(&mut self) -> Result<SyntaxNode, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let mut children = Vec::new();
        loop {
            match self.peek(0) {
                None => return Err(self.error("unterminated template literal")),
                Some(b'\\') => self.pos += 2,
                Some(b'`') => {
                    self.pos += 1;
                    break;
                }
                Some(b'$') if self.peek(1) == Some(b'{') => {
                    self.pos += 2;
                    children.extend(self.parse_code(true, false)?);
                    if self.peek(0) != Some(b'}') {
                        return Err(self.error("unterminated template expression"));
                    }
                    self.pos += 1;
                }
                Some(_) => self.pos += 1,
            }
        }
        Ok(SyntaxNode {
            kind: SyntaxKind::TemplateLiteral,
            span: Span::new(start, self.pos),
            children,
        })
    }

    fn import_follows(&self) -> bool {
        let rest = &self.bytes[self.pos..];
        let Some(first) = rest.first() else {
            return false;
        };
        if matches!(first, b'{' | b'*' | b'"' | b'\'') {
            return true;
        }
        first.is_ascii_whitespace()
            && rest
                .iter()
                .find(|c| !c.is_ascii_whitespace())
                .map(|&c| matches!(c, b'{' | b'*' | b'"' | b'\'') || is_ident_start(c))
                .unwrap_or(false)
    }

    /// Offset of the module source of `export * from "x"` or
    /// `export { a } from "x"`; `self.pos` is just past the keyword
    fn reexport_source(&self) -> Option<usize> {
        let bytes = self.bytes;
        let skip_ws = |mut i: usize| {
            while bytes.get(i).map(|c| c.is_ascii_whitespace()).unwrap_or(false) {
                i += 1;
            }
            i
        };
        let word_at = |i: usize, word: &str| {
            bytes[i..].starts_with(word.as_bytes())
                && !bytes.get(i + word.len()).copied().map(is_ident_char).unwrap_or(false)
        };

        let mut i = skip_ws(self.pos);
        if word_at(i, "type") {
            i = skip_ws(i + 4);
        }
        match bytes.get(i)? {
            b'*' => {
                i = skip_ws(i + 1);
                if word_at(i, "as") {
                    i = skip_ws(i + 2);
                    while bytes.get(i).copied().map(is_ident_char).unwrap_or(false) {
                        i += 1;
                    }
                    i = skip_ws(i);
                }
            }
            b'{' => {
                let close = bytes[i..].iter().position(|&c| c == b'}' || c == b';')?;
                if bytes[i + close] != b'}' {
                    return None;
                }
                i = skip_ws(i + close + 1);
            }
            _ => return None,
        }
        if !word_at(i, "from") {
            return None;
        }
        i = skip_ws(i + 4);
        matches!(bytes.get(i)?, b'"' | b'\'').then_some(i)
    }

    /// Parse an import declaration; `self.pos` is just past the keyword
    fn parse_import(&mut self, start: usize) -> Result<SyntaxNode, ParseError> {
        loop {
            match self.peek(0) {
                None | Some(b';') => return Err(self.error("import without a module source")),
                Some(b'"') | Some(b'\'') => break,
                Some(_) => self.pos += 1,
            }
        }
        let quote = self.bytes[self.pos];
        let literal_start = self.pos;
        self.skip_string(quote)?;
        let literal_end = self.pos;
        if self.peek(0) == Some(b';') {
            self.pos += 1;
        }
        let source = self.src[literal_start + 1..literal_end - 1].to_string();
        Ok(SyntaxNode {
            kind: SyntaxKind::Import { source },
            span: Span::new(start, self.pos),
            children: vec![SyntaxNode::leaf(
                SyntaxKind::StringLiteral {
                    class_context: false,
                },
                literal_start,
                literal_end,
            )],
        })
    }

    fn jsx_follows(&self) -> bool {
        matches!(self.peek(1), Some(c) if c.is_ascii_alphabetic() || c == b'>')
    }

    fn read_jsx_name(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek(0).map(is_jsx_name_char).unwrap_or(false) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn parse_jsx_element(&mut self) -> Result<SyntaxNode, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let name = self.read_jsx_name().to_string();
        let mut children = Vec::new();
        let self_closing;

        loop {
            self.skip_whitespace();
            match self.peek(0) {
                None => return Err(self.error(format!("unterminated <{}> tag", name))),
                Some(b'/') if self.peek(1) == Some(b'>') => {
                    self.pos += 2;
                    self_closing = true;
                    break;
                }
                Some(b'>') => {
                    self.pos += 1;
                    self_closing = false;
                    break;
                }
                Some(b'{') => children.push(self.parse_expression_container(false)?),
                Some(c) if is_ident_start(c) => children.push(self.parse_attribute()?),
                Some(c) => {
                    return Err(self.error(format!(
                        "unexpected '{}' in <{}> tag",
                        c as char, name
                    )))
                }
            }
        }
        let opening = Span::new(start, self.pos);

        if self_closing {
            return Ok(SyntaxNode {
                kind: SyntaxKind::JsxElement(JsxElement {
                    name,
                    self_closing,
                    opening,
                    closing: None,
                }),
                span: opening,
                children,
            });
        }

        let closing = loop {
            match self.peek(0) {
                None => return Err(self.error(format!("missing </{}>", name))),
                Some(b'<') if self.peek(1) == Some(b'/') => {
                    let close_start = self.pos;
                    self.pos += 2;
                    self.skip_whitespace();
                    let closing_name = self.read_jsx_name();
                    if closing_name != name {
                        return Err(self.error(format!(
                            "expected </{}> but found </{}>",
                            name, closing_name
                        )));
                    }
                    self.skip_whitespace();
                    if self.peek(0) != Some(b'>') {
                        return Err(self.error("malformed closing tag"));
                    }
                    self.pos += 1;
                    break Span::new(close_start, self.pos);
                }
                Some(b'<') => children.push(self.parse_jsx_element()?),
                Some(b'{') => children.push(self.parse_expression_container(false)?),
                Some(_) => {
                    let text_start = self.pos;
                    while self.peek(0).map(|c| c != b'<' && c != b'{').unwrap_or(false) {
                        self.pos += 1;
                    }
                    children.push(SyntaxNode::leaf(SyntaxKind::JsxText, text_start, self.pos));
                }
            }
        };

        Ok(SyntaxNode {
            kind: SyntaxKind::JsxElement(JsxElement {
                name,
                self_closing,
                opening,
                closing: Some(closing),
            }),
            span: Span::new(start, closing.end),
            children,
        })
    }

    fn parse_attribute(&mut self) -> Result<SyntaxNode, ParseError> {
        let start = self.pos;
        let name = self.read_jsx_name().to_string();
        let class_attribute = CLASS_ATTRIBUTES.contains(&name.as_str());

        let checkpoint = self.pos;
        self.skip_whitespace();
        if self.peek(0) != Some(b'=') {
            self.pos = checkpoint;
            return Ok(SyntaxNode::leaf(SyntaxKind::JsxAttribute { name }, start, self.pos));
        }
        self.pos += 1;
        self.skip_whitespace();

        let value = match self.peek(0) {
            Some(quote @ (b'"' | b'\'')) => {
                let value_start = self.pos;
                self.pos += 1;
                while self.peek(0).map(|c| c != quote).unwrap_or(false) {
                    self.pos += 1;
                }
                if self.peek(0).is_none() {
                    return Err(self.error(format!("unterminated value for '{}'", name)));
                }
                self.pos += 1;
                SyntaxNode::leaf(
                    SyntaxKind::StringLiteral {
                        class_context: class_attribute,
                    },
                    value_start,
                    self.pos,
                )
            }
            Some(b'{') => self.parse_expression_container(class_attribute)?,
            Some(b'<') => self.parse_jsx_element()?,
            _ => return Err(self.error(format!("missing value for '{}'", name))),
        };

        Ok(SyntaxNode {
            kind: SyntaxKind::JsxAttribute { name },
            span: Span::new(start, value.span.end),
            children: vec![value],
        })
    }

    fn parse_expression_container(&mut self, class_context: bool) -> Result<SyntaxNode, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let children = self.parse_code(true, class_context)?;
        if self.peek(0) != Some(b'}') {
            return Err(self.error("unterminated JSX expression"));
        }
        self.pos += 1;
        Ok(SyntaxNode {
            kind: SyntaxKind::JsxExpression,
            span: Span::new(start, self.pos),
            children,
        })
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'$' || c >= 0x80
}

fn is_ident_char(c: u8) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

fn is_jsx_name_char(c: u8) -> bool {
    is_ident_char(c) || matches!(c, b'-' | b'.' | b':')
}

/// Whether `<` starts JSX given the previous significant token
fn jsx_allowed(prev: Option<u8>, after_word: bool, last_word: &str) -> bool {
    match prev {
        None => true,
        Some(_) if after_word => matches!(last_word, "return" | "default" | "yield"),
        Some(c) => b"(,={[?:&|!;>".contains(&c),
    }
}

/// Whether `/` starts a regular expression rather than a division
fn regex_allowed(prev: Option<u8>, after_word: bool, last_word: &str) -> bool {
    match prev {
        None => true,
        Some(_) if after_word => matches!(last_word, "return" | "typeof" | "case"),
        Some(c) => b"(,=:[!&|?{};".contains(&c),
    }
}
