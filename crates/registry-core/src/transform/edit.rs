//! Span edits over source text

use super::syntax::Span;
use tracing::debug;

/// Replace `span` with `replacement`; an empty span is an insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub span: Span,
    pub replacement: String,
}

impl Edit {
    pub fn replace(span: Span, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
        }
    }

    pub fn delete(span: Span) -> Self {
        Self::replace(span, String::new())
    }
}

/// Apply edits in reverse document order.
///
/// Offsets always refer to the original text. An edit overlapping one that
/// was already applied is skipped; insertions at the same offset keep their
/// list order.
pub fn apply_edits(source: &str, edits: Vec<Edit>) -> String {
    let mut indexed: Vec<(usize, Edit)> = edits.into_iter().enumerate().collect();
    indexed.sort_by(|(ia, a), (ib, b)| {
        b.span
            .start
            .cmp(&a.span.start)
            .then(b.span.end.cmp(&a.span.end))
            .then(ib.cmp(ia))
    });

    let mut output = source.to_string();
    let mut limit = source.len();
    for (_, edit) in indexed {
        if edit.span.end > limit || edit.span.start > edit.span.end {
            debug!(start = edit.span.start, end = edit.span.end, "skipping overlapping edit");
            continue;
        }
        output.replace_range(edit.span.start..edit.span.end, &edit.replacement);
        limit = edit.span.start;
    }
    output
}

/// Span of a whole line-level construct plus the newline that ends it
pub fn line_span(source: &str, span: Span) -> Span {
    let end = if source[span.end..].starts_with("\r\n") {
        span.end + 2
    } else if source[span.end..].starts_with('\n') {
        span.end + 1
    } else {
        span.end
    };
    Span::new(span.start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applies_in_reverse_order() {
        let source = "let a = 1; let b = 2;";
        let edits = vec![
            Edit::replace(Span::new(4, 5), "x"),
            Edit::replace(Span::new(15, 16), "y"),
        ];
        assert_eq!(apply_edits(source, edits), "let x = 1; let y = 2;");
    }

    #[test]
    fn test_skips_overlapping_edits() {
        let source = "abcdef";
        let edits = vec![
            Edit::replace(Span::new(0, 4), "X"),
            Edit::replace(Span::new(2, 6), "Y"),
        ];
        assert_eq!(apply_edits(source, edits), "abY");
    }

    #[test]
    fn test_insertions_keep_order() {
        let source = "ab";
        let edits = vec![
            Edit::replace(Span::new(1, 1), "1"),
            Edit::replace(Span::new(1, 1), "2"),
        ];
        assert_eq!(apply_edits(source, edits), "a12b");
    }

    #[test]
    fn test_line_span() {
        let source = "import x\nrest";
        assert_eq!(line_span(source, Span::new(0, 8)), Span::new(0, 9));
        assert_eq!(line_span("tail", Span::new(0, 4)), Span::new(0, 4));
    }
}
