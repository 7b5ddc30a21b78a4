//! Source transforms applied to registry files before they are written
//!
//! Each pass is a pure function of the source text and a
//! [`TransformContext`]. Passes run in a fixed order:
//! render, as-child, icons, imports, tailwind-version, rtl, prefix.

pub mod aschild;
pub mod classes;
pub mod edit;
pub mod icons;
pub mod imports;
pub mod render;
pub mod syntax;

pub use aschild::AsChildPass;
pub use classes::{PrefixPass, RtlPass, TailwindVersionPass};
pub use edit::{apply_edits, Edit};
pub use icons::IconsPass;
pub use imports::ImportsPass;
pub use render::RenderPass;
pub use syntax::{parse, ParseError, Span, SyntaxKind, SyntaxNode};

use crate::config::ProjectConfig;
use crate::project::TailwindVersion;
use crate::resolver::ResolvedTree;
use crate::schema::RegistryItem;
use std::path::Path;
use tracing::warn;

/// Extensions of files the passes understand
const SCRIPT_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

/// Everything a pass may read while transforming one file
pub struct TransformContext<'a> {
    pub config: &'a ProjectConfig,
    pub tree: &'a ResolvedTree,
    /// Destination path of the file
    pub path: &'a Path,
    /// Tailwind version the file's classes were authored for
    pub source_tailwind: TailwindVersion,
}

/// One source-to-source pass
pub trait Transform: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, source: &str, ctx: &TransformContext<'_>) -> Result<String, ParseError>;
}

/// An ordered list of passes
pub struct Pipeline {
    passes: Vec<Box<dyn Transform>>,
}

impl Pipeline {
    pub fn new(passes: Vec<Box<dyn Transform>>) -> Self {
        Self { passes }
    }

    /// The standard pass order
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(RenderPass),
            Box::new(AsChildPass),
            Box::new(IconsPass),
            Box::new(ImportsPass),
            Box::new(TailwindVersionPass),
            Box::new(RtlPass),
            Box::new(PrefixPass),
        ])
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Run every pass. Files that are not scripts, or that fail to parse,
    /// come back unchanged.
    pub fn run(&self, source: &str, ctx: &TransformContext<'_>) -> String {
        if !is_script(ctx.path) {
            return source.to_string();
        }
        let mut current = source.to_string();
        for pass in &self.passes {
            match pass.apply(&current, ctx) {
                Ok(next) => current = next,
                Err(error) => {
                    warn!(
                        path = %ctx.path.display(),
                        pass = pass.name(),
                        %error,
                        "could not parse file, leaving it unchanged"
                    );
                    return source.to_string();
                }
            }
        }
        current
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

/// Run the standard pipeline over one file
pub fn apply_transforms(source: &str, ctx: &TransformContext<'_>) -> String {
    Pipeline::standard().run(source, ctx)
}

pub fn is_script(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SCRIPT_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Tailwind version an item's classes target: declared in `meta`, otherwise
/// implied by the registry style (the classic styles predate Tailwind 4)
pub fn source_tailwind_version(item: &RegistryItem, style: &str) -> TailwindVersion {
    item.declared_tailwind_version()
        .and_then(TailwindVersion::from_major)
        .unwrap_or(match style {
            "default" | "new-york" => TailwindVersion::V3,
            _ => TailwindVersion::V4,
        })
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use pretty_assertions::assert_eq;

    fn context<'a>(
        config: &'a ProjectConfig,
        tree: &'a ResolvedTree,
        path: &'a Path,
    ) -> TransformContext<'a> {
        TransformContext {
            config,
            tree,
            path,
            source_tailwind: TailwindVersion::V3,
        }
    }

    #[test]
    fn test_standard_order() {
        assert_eq!(
            Pipeline::standard().pass_names(),
            vec!["render", "as-child", "icons", "imports", "tailwind-version", "rtl", "prefix"]
        );
    }

    #[test]
    fn test_non_script_files_pass_through() {
        let mut config = test_config();
        config.rtl = true;
        let tree = ResolvedTree::default();
        let source = ".a { @apply ml-2; }";
        let ctx = context(&config, &tree, Path::new("styles/a.css"));
        assert_eq!(apply_transforms(source, &ctx), source);
    }

    #[test]
    fn test_parse_failure_leaves_file_unchanged() {
        let mut config = test_config();
        config.rtl = true;
        let tree = ResolvedTree::default();
        let source = "export const A = () => <div className=\"ml-2\">\n";
        let ctx = context(&config, &tree, Path::new("components/a.tsx"));
        assert_eq!(apply_transforms(source, &ctx), source);
    }

    #[test]
    fn test_full_pipeline() {
        let mut config = test_config();
        config.rtl = true;
        config.tailwind_version = TailwindVersion::V4;
        config.aliases.ui = "~/ui".to_string();
        let tree = ResolvedTree::default();
        let source = r#"import { Button } from "@/registry/new-york/ui/button"

export function Card() {
  return <Button className="ml-2 shadow-sm">Go</Button>
}
"#;
        let ctx = context(&config, &tree, Path::new("components/card.tsx"));
        assert_eq!(
            apply_transforms(source, &ctx),
            r#"import { Button } from "~/ui/button"

export function Card() {
  return <Button className="ms-2 shadow-xs">Go</Button>
}
"#
        );
    }

    #[test]
    fn test_source_tailwind_version() {
        let item = RegistryItem::from_json(
            br#"{ "name": "x", "type": "registry:ui", "files": [{ "path": "x.tsx", "content": "" }] }"#,
        )
        .unwrap();
        assert_eq!(source_tailwind_version(&item, "new-york"), TailwindVersion::V3);
        assert_eq!(source_tailwind_version(&item, "base-nova"), TailwindVersion::V4);
    }
}
