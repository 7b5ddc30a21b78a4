//! Replaces `<IconPlaceholder>` with the project's icon library

use super::edit::{apply_edits, line_span, Edit};
use super::syntax::{parse, ParseError, SyntaxKind, SyntaxNode};
use super::{Transform, TransformContext};
use indexmap::IndexSet;

const PLACEHOLDER: &str = "IconPlaceholder";

/// Attributes naming the icon in each supported library
const LIBRARY_PROPS: &[&str] = &["lucide", "tabler", "phosphor", "hugeicons"];

const HUGEICONS_WRAPPER: &str = "HugeiconsIcon";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IconLibrary {
    Lucide,
    Tabler,
    Phosphor,
    Hugeicons,
}

impl IconLibrary {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "lucide" => Some(Self::Lucide),
            "tabler" => Some(Self::Tabler),
            "phosphor" => Some(Self::Phosphor),
            "hugeicons" => Some(Self::Hugeicons),
            _ => None,
        }
    }

    fn prop(self) -> &'static str {
        match self {
            Self::Lucide => "lucide",
            Self::Tabler => "tabler",
            Self::Phosphor => "phosphor",
            Self::Hugeicons => "hugeicons",
        }
    }

    fn import_lines(self, names: &str) -> Vec<String> {
        match self {
            Self::Lucide => vec![format!("import {{ {} }} from \"lucide-react\"", names)],
            Self::Tabler => vec![format!("import {{ {} }} from \"@tabler/icons-react\"", names)],
            Self::Phosphor => vec![format!("import {{ {} }} from \"@phosphor-icons/react\"", names)],
            Self::Hugeicons => vec![
                format!("import {{ {} }} from \"@hugeicons/react\"", HUGEICONS_WRAPPER),
                format!("import {{ {} }} from \"@hugeicons/core-free-icons\"", names),
            ],
        }
    }
}

pub struct IconsPass;

impl Transform for IconsPass {
    fn name(&self) -> &'static str {
        "icons"
    }

    fn apply(&self, source: &str, ctx: &TransformContext<'_>) -> Result<String, ParseError> {
        let Some(library) = IconLibrary::parse(&ctx.config.icon_library) else {
            return Ok(source.to_string());
        };
        if !source.contains(PLACEHOLDER) {
            return Ok(source.to_string());
        }

        let tree = parse(source)?;
        let mut edits = Vec::new();
        let mut icons: IndexSet<String> = IndexSet::new();

        for node in tree.descendants() {
            let Some(element) = node.as_jsx() else {
                continue;
            };
            if element.name != PLACEHOLDER {
                continue;
            }
            let Some(icon) = icon_name(node, library, source) else {
                continue;
            };
            edits.extend(replace_element(node, library, &icon, source));
            icons.insert(icon);
        }

        if let Some(import) = tree.children.iter().find(|n| is_placeholder_import(n, source)) {
            if icons.is_empty() {
                edits.push(Edit::delete(line_span(source, import.span)));
            } else {
                let names = icons.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
                let semicolon = if import.text(source).ends_with(';') { ";" } else { "" };
                let lines: Vec<String> = library
                    .import_lines(&names)
                    .into_iter()
                    .map(|line| format!("{}{}", line, semicolon))
                    .collect();
                edits.push(Edit::replace(import.span, lines.join("\n")));
            }
        }

        Ok(apply_edits(source, edits))
    }
}

fn is_placeholder_import(node: &SyntaxNode, source: &str) -> bool {
    if !matches!(node.kind, SyntaxKind::Import { .. }) {
        return false;
    }
    let text = node.text(source);
    let specifiers = text
        .find('{')
        .zip(text.find('}'))
        .map(|(open, close)| &text[open + 1..close])
        .unwrap_or("");
    specifiers.split(',').any(|s| s.trim() == PLACEHOLDER)
}

/// Icon named by the library's attribute, when it is a plain string
fn icon_name(node: &SyntaxNode, library: IconLibrary, source: &str) -> Option<String> {
    let value = node.attribute(library.prop())?.attribute_value()?;
    if !matches!(value.kind, SyntaxKind::StringLiteral { .. }) {
        return None;
    }
    let text = value.text(source);
    let name = &text[1..text.len() - 1];
    (!name.is_empty()).then(|| name.to_string())
}

fn replace_element(
    node: &SyntaxNode,
    library: IconLibrary,
    icon: &str,
    source: &str,
) -> Vec<Edit> {
    let Some(element) = node.as_jsx() else {
        return Vec::new();
    };

    let kept: Vec<&str> = node
        .attributes()
        .filter(|attr| {
            attr.attribute_name()
                .map(|name| !LIBRARY_PROPS.contains(&name))
                .unwrap_or(true)
        })
        .map(|attr| attr.text(source))
        .collect();

    let (tag, mut props) = match library {
        IconLibrary::Hugeicons => {
            let mut props = vec![format!("icon={{{}}}", icon)];
            if node.attribute("strokeWidth").is_none() {
                props.push("strokeWidth={2}".to_string());
            }
            (HUGEICONS_WRAPPER, props)
        }
        _ => (icon, Vec::new()),
    };
    props.extend(kept.into_iter().map(str::to_string));

    let mut opening = format!("<{}", tag);
    for prop in &props {
        opening.push(' ');
        opening.push_str(prop);
    }

    match element.closing {
        None => vec![Edit::replace(element.opening, format!("{} />", opening))],
        Some(closing) => vec![
            Edit::replace(element.opening, format!("{}>", opening)),
            Edit::replace(closing, format!("</{}>", tag)),
        ],
    }
}
