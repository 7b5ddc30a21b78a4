//! Fonts requested by registry items
//!
//! Next.js projects load Google fonts through `next/font/google` in the root
//! layout. Other projects get the font as a `@fontsource-variable` package
//! imported from the stylesheet.

use crate::project::Framework;
use crate::resolver::{merge_json, ResolvedTree};
use crate::schema::FontSpec;
use crate::transform::{apply_edits, parse, Edit, ParseError, Span, SyntaxKind, SyntaxNode};
use serde_json::json;

const NEXT_FONT_MODULE: &str = "next/font/google";
const FONTSOURCE_SCOPE: &str = "@fontsource-variable";

/// Fold the first font's requirements into the tree's packages, CSS rules
/// and theme variables
pub fn apply_font_requirements(tree: &mut ResolvedTree, framework: Framework) {
    let Some(font) = tree.fonts.first().cloned() else {
        return;
    };
    let variable = font.variable.trim_start_matches("--").to_string();

    if framework.is_next() {
        tree.css_vars
            .entry("theme".to_string())
            .or_default()
            .insert(variable, format!("var({})", font.variable));
        return;
    }

    let package = format!("{}/{}", FONTSOURCE_SCOPE, font_slug(&font.family));
    if !tree.dependencies.iter().any(|d| d == &package) {
        tree.dependencies.push(package.clone());
    }
    tree.css
        .entry(format!("@import \"{}\"", package))
        .or_insert_with(|| json!({}));
    let base = json!({
        "html": { "@apply font-sans": {} },
        "body": { "@apply font-sans bg-background text-foreground": {} }
    });
    match tree.css.get_mut("@layer base") {
        Some(existing) => merge_json(existing, &base),
        None => {
            tree.css.insert("@layer base".to_string(), base);
        }
    }
    tree.css_vars
        .entry("theme".to_string())
        .or_default()
        .insert(variable, font.family);
}

/// `Geist Mono` is `geist-mono`
fn font_slug(family: &str) -> String {
    family
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// `Geist_Mono` is `geistMono`
fn binding_name(import: &str) -> String {
    import
        .split('_')
        .filter(|part| !part.is_empty())
        .enumerate()
        .map(|(i, part)| {
            let lower = part.to_lowercase();
            if i == 0 {
                return lower;
            }
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

fn font_options(font: &FontSpec) -> String {
    let list = |values: &[String]| {
        values
            .iter()
            .map(|v| format!("\"{}\"", v))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut options = Vec::new();
    if !font.subsets.is_empty() {
        options.push(format!("subsets: [{}]", list(&font.subsets)));
    }
    if !font.weight.is_empty() {
        options.push(format!("weight: [{}]", list(&font.weight)));
    }
    options.push(format!("variable: \"{}\"", font.variable));
    format!("{{ {} }}", options.join(", "))
}

/// Names inside the braces of an import, with the span of the braces
fn named_imports(node: &SyntaxNode, source: &str) -> Option<(Span, Vec<String>)> {
    let text = node.text(source);
    let open = text.find('{')?;
    let close = open + text[open..].find('}')?;
    let names = text[open + 1..close]
        .split(',')
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    Some((
        Span::new(node.span.start + open, node.span.start + close + 1),
        names,
    ))
}

fn imports(tree: &SyntaxNode) -> impl Iterator<Item = (&SyntaxNode, &str)> {
    tree.children.iter().filter_map(|node| match &node.kind {
        SyntaxKind::Import { source } => Some((node, source.as_str())),
        _ => None,
    })
}

/// Edits adding `names` to the import of `module`, or a new import line
/// after the last import
fn ensure_named_imports(tree: &SyntaxNode, source: &str, module: &str, names: &[String]) -> Vec<Edit> {
    let existing = imports(tree)
        .filter(|(_, from)| *from == module)
        .find_map(|(node, _)| named_imports(node, source));
    match existing {
        Some((braces, mut present)) => {
            let before = present.len();
            for name in names {
                if !present.contains(name) {
                    present.push(name.clone());
                }
            }
            if present.len() == before {
                return Vec::new();
            }
            vec![Edit::replace(braces, format!("{{ {} }}", present.join(", ")))]
        }
        None => vec![insert_after_imports(
            tree,
            source,
            format!("import {{ {} }} from \"{}\"", names.join(", "), module),
        )],
    }
}

fn insert_after_imports(tree: &SyntaxNode, source: &str, line: String) -> Edit {
    match imports(tree).last() {
        Some((last, _)) => Edit::replace(Span::new(last.span.end, last.span.end), format!("\n{}", line)),
        None if source.is_empty() => Edit::replace(Span::new(0, 0), format!("{}\n", line)),
        None => Edit::replace(Span::new(0, 0), format!("{}\n\n", line)),
    }
}

/// Name of an existing `const x = Font({ ... variable: "--font-sans" ... })`
fn declared_binding(source: &str, variable: &str) -> Option<String> {
    let quoted = [format!("\"{}\"", variable), format!("'{}'", variable)];
    let mut offset = 0;
    while let Some(found) = source[offset..].find("const ") {
        let start = offset + found + "const ".len();
        let end = ["\n\n", "\nconst "]
            .iter()
            .filter_map(|stop| source[start..].find(stop))
            .min()
            .map(|p| start + p)
            .unwrap_or(source.len());
        let declaration = &source[start..end];
        if declaration.contains("variable") && quoted.iter().any(|q| declaration.contains(q.as_str())) {
            let name = declaration.split('=').next()?.trim();
            return Some(name.split(':').next().unwrap_or(name).trim().to_string());
        }
        offset = start;
    }
    None
}

/// Load `fonts` in a Next.js root layout: import them from
/// `next/font/google`, declare each once and add their CSS variables to the
/// `<html>` element's `className`. `utils` is the import path of `cn`.
pub fn transform_layout_fonts(source: &str, fonts: &[FontSpec], utils: &str) -> Result<String, ParseError> {
    let fonts: Vec<&FontSpec> = fonts
        .iter()
        .filter(|f| f.provider == "google" && !f.import.is_empty())
        .collect();
    if fonts.is_empty() {
        return Ok(source.to_string());
    }

    let tree = parse(source)?;
    let mut bindings = Vec::new();
    let mut declarations = Vec::new();
    for font in &fonts {
        match declared_binding(source, &font.variable) {
            Some(name) => bindings.push(name),
            None => {
                let name = binding_name(&font.import);
                declarations.push(format!("const {} = {}({})", name, font.import, font_options(font)));
                bindings.push(name);
            }
        }
    }

    let names: Vec<String> = fonts.iter().map(|f| f.import.clone()).collect();
    let mut edits = ensure_named_imports(&tree, source, NEXT_FONT_MODULE, &names);
    if !declarations.is_empty() {
        let block = declarations.join("\n");
        edits.push(match imports(&tree).last() {
            Some((last, _)) => Edit::replace(Span::new(last.span.end, last.span.end), format!("\n\n{}", block)),
            None => Edit::replace(Span::new(0, 0), format!("{}\n\n", block)),
        });
    }
    let source = apply_edits(source, edits);

    let tree = parse(&source)?;
    let Some(html) = tree
        .descendants()
        .find(|node| node.as_jsx().map(|e| e.name == "html").unwrap_or(false))
    else {
        return Ok(source);
    };
    let variables: Vec<String> = bindings.iter().map(|b| format!("{}.variable", b)).collect();
    let Some((edit, uses_cn)) = class_name_edit(html, &source, &variables) else {
        return Ok(source);
    };
    let mut edits = vec![edit];
    if uses_cn && !imports(&tree).any(|(node, _)| {
        named_imports(node, &source)
            .map(|(_, names)| names.iter().any(|n| n == "cn"))
            .unwrap_or(false)
    }) {
        edits.extend(ensure_named_imports(&tree, &source, utils, &["cn".to_string()]));
    }
    Ok(apply_edits(&source, edits))
}

/// The edit putting `variables` into the `className` of `html`, and whether
/// it calls `cn`
fn class_name_edit(html: &SyntaxNode, source: &str, variables: &[String]) -> Option<(Edit, bool)> {
    let joined = variables.join(", ");
    let element = html.as_jsx()?;
    let Some(attribute) = html.attribute("className") else {
        let name_end = element.opening.start + 1 + element.name.len();
        let value = if variables.len() == 1 {
            (joined.clone(), false)
        } else {
            (format!("cn({})", joined), true)
        };
        return Some((
            Edit::replace(Span::new(name_end, name_end), format!(" className={{{}}}", value.0)),
            value.1,
        ));
    };

    let value = attribute.attribute_value()?;
    match value.kind {
        SyntaxKind::StringLiteral { .. } => {
            let text = value.text(source);
            let classes = &text[1..text.len() - 1];
            Some((
                Edit::replace(value.span, format!("{{cn(\"{}\", {})}}", classes, joined)),
                true,
            ))
        }
        SyntaxKind::JsxExpression => {
            let text = value.text(source);
            let expression = text[1..text.len() - 1].trim();
            let missing: Vec<&String> = variables
                .iter()
                .filter(|v| !expression.contains(v.as_str()))
                .collect();
            if missing.is_empty() {
                return None;
            }
            let missing = missing
                .iter()
                .map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let replacement = if expression.starts_with("cn(") && expression.ends_with(')') {
                format!("{{{}, {})}}", &expression[..expression.len() - 1], missing)
            } else if expression.starts_with('`') && expression.ends_with('`') {
                format!("{{cn({})}}", template_arguments(expression, &missing).join(", "))
            } else {
                format!("{{cn({}, {})}}", expression, missing)
            };
            Some((Edit::replace(value.span, replacement), true))
        }
        _ => None,
    }
}

/// `` `${a.variable} antialiased` `` as `cn` arguments: static classes
/// first, then interpolations, then `extra`
fn template_arguments(template: &str, extra: &str) -> Vec<String> {
    let body = &template[1..template.len() - 1];
    let mut classes = Vec::new();
    let mut expressions = Vec::new();
    let mut rest = body;
    while let Some(start) = rest.find("${") {
        classes.extend(rest[..start].split_whitespace().map(|c| format!("\"{}\"", c)));
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let expression = rest[start + 2..start + end].trim();
        if !expression.is_empty() {
            expressions.push(expression.to_string());
        }
        rest = &rest[start + end + 1..];
    }
    classes.extend(rest.split_whitespace().map(|c| format!("\"{}\"", c)));
    classes.extend(expressions);
    classes.push(extra.to_string());
    classes
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn font(family: &str, import: &str, variable: &str) -> FontSpec {
        FontSpec {
            family: family.to_string(),
            provider: "google".to_string(),
            import: import.to_string(),
            variable: variable.to_string(),
            weight: Vec::new(),
            subsets: vec!["latin".to_string()],
        }
    }

    fn tree_with_font() -> ResolvedTree {
        let mut tree = ResolvedTree::default();
        tree.fonts.push(font("Geist Mono", "Geist_Mono", "--font-mono"));
        tree
    }

    const LAYOUT: &str = "import type { Metadata } from \"next\"\nimport \"./globals.css\"\n\nexport default function RootLayout({ children }: { children: React.ReactNode }) {\n  return (\n    <html lang=\"en\">\n      <body>{children}</body>\n    </html>\n  )\n}\n";

    #[test]
    fn test_next_projects_bind_theme_variable() {
        let mut tree = tree_with_font();
        apply_font_requirements(&mut tree, Framework::NextApp);
        assert_eq!(tree.css_vars["theme"]["font-mono"], "var(--font-mono)");
        assert!(tree.dependencies.is_empty());
        assert!(tree.css.is_empty());
    }

    #[test]
    fn test_other_projects_use_fontsource() {
        let mut tree = tree_with_font();
        apply_font_requirements(&mut tree, Framework::Other);
        assert_eq!(tree.dependencies, vec!["@fontsource-variable/geist-mono"]);
        assert_eq!(tree.css["@import \"@fontsource-variable/geist-mono\""], json!({}));
        assert_eq!(
            tree.css["@layer base"]["body"],
            json!({ "@apply font-sans bg-background text-foreground": {} })
        );
        assert_eq!(tree.css_vars["theme"]["font-mono"], "Geist Mono");

        apply_font_requirements(&mut tree, Framework::Other);
        assert_eq!(tree.dependencies.len(), 1);
    }

    #[test]
    fn test_binding_names() {
        assert_eq!(binding_name("Inter"), "inter");
        assert_eq!(binding_name("Geist_Mono"), "geistMono");
        assert_eq!(font_slug("Noto Sans JP"), "noto-sans-jp");
    }

    #[test]
    fn test_layout_gets_import_declaration_and_class() {
        let output = transform_layout_fonts(LAYOUT, &[font("Inter", "Inter", "--font-sans")], "@/lib/utils")
            .unwrap();
        assert_eq!(
            output,
            "import type { Metadata } from \"next\"\nimport \"./globals.css\"\nimport { Inter } from \"next/font/google\"\n\nconst inter = Inter({ subsets: [\"latin\"], variable: \"--font-sans\" })\n\nexport default function RootLayout({ children }: { children: React.ReactNode }) {\n  return (\n    <html className={inter.variable} lang=\"en\">\n      <body>{children}</body>\n    </html>\n  )\n}\n"
        );
        let again = transform_layout_fonts(&output, &[font("Inter", "Inter", "--font-sans")], "@/lib/utils")
            .unwrap();
        assert_eq!(again, output);
    }

    #[test]
    fn test_existing_imports_and_string_class_names() {
        let source = "import { Geist } from \"next/font/google\"\n\nconst geist = Geist({ subsets: [\"latin\"], variable: \"--font-sans\" })\n\nexport default function Layout() {\n  return <html lang=\"en\" className=\"antialiased\"><body /></html>\n}\n";
        let output = transform_layout_fonts(
            source,
            &[font("Geist", "Geist", "--font-sans"), font("Geist Mono", "Geist_Mono", "--font-mono")],
            "@/lib/utils",
        )
        .unwrap();
        assert_eq!(
            output,
            "import { Geist, Geist_Mono } from \"next/font/google\"\nimport { cn } from \"@/lib/utils\"\n\nconst geistMono = Geist_Mono({ subsets: [\"latin\"], variable: \"--font-mono\" })\n\nconst geist = Geist({ subsets: [\"latin\"], variable: \"--font-sans\" })\n\nexport default function Layout() {\n  return <html lang=\"en\" className={cn(\"antialiased\", geist.variable, geistMono.variable)}><body /></html>\n}\n"
        );
    }

    #[test]
    fn test_expression_class_names() {
        let fonts = [font("Inter", "Inter", "--font-sans")];
        let wrap = |class: &str| {
            format!(
                "import {{ Inter }} from \"next/font/google\"\nimport {{ cn }} from \"@/lib/utils\"\n\nconst inter = Inter({{ variable: \"--font-sans\" }})\n\nexport default function Layout() {{\n  return <html className={}></html>\n}}\n",
                class
            )
        };
        assert_eq!(
            transform_layout_fonts(&wrap("{cn(\"dark\", theme)}"), &fonts, "@/lib/utils").unwrap(),
            wrap("{cn(\"dark\", theme, inter.variable)}")
        );
        assert_eq!(
            transform_layout_fonts(&wrap("{`${mono.variable} antialiased`}"), &fonts, "@/lib/utils").unwrap(),
            wrap("{cn(\"antialiased\", mono.variable, inter.variable)}")
        );
        assert_eq!(
            transform_layout_fonts(&wrap("{classes}"), &fonts, "@/lib/utils").unwrap(),
            wrap("{cn(classes, inter.variable)}")
        );
        let done = wrap("{cn(inter.variable)}");
        assert_eq!(transform_layout_fonts(&done, &fonts, "@/lib/utils").unwrap(), done);
    }

    #[test]
    fn test_other_providers_are_ignored() {
        let mut local = font("Inter", "Inter", "--font-sans");
        local.provider = "local".to_string();
        assert_eq!(transform_layout_fonts(LAYOUT, &[local], "@/lib/utils").unwrap(), LAYOUT);
    }
}
