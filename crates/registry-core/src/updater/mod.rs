//! Updates to existing project files
//!
//! Each `plan_*` function reads the file it would change and returns the new
//! content, or `None` when the resolved tree asks for nothing. Writing is
//! left to the caller so dry runs and reports go through one path.

pub mod css;
pub mod css_vars;
pub mod env;
pub mod fonts;
mod js_object;
mod stylesheet;
pub mod tailwind_config;

pub use css::update_css_rules;
pub use css_vars::update_css_vars;
pub use env::{env_file, merge_env};
pub use fonts::{apply_font_requirements, transform_layout_fonts};
pub use tailwind_config::update_tailwind_config;

use crate::config::ProjectConfig;
use crate::project::{find_layout_file, Framework, TailwindVersion};
use crate::resolver::ResolvedTree;
use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// New content for one project file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpdate {
    pub path: PathBuf,
    pub content: String,
}

/// Read `path`, treating a missing file as empty
async fn read_or_empty(path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// CSS variables and item rules for the project's Tailwind CSS file. A
/// missing stylesheet starts out empty.
pub async fn plan_css_update(config: &ProjectConfig, tree: &ResolvedTree) -> Result<Option<FileUpdate>> {
    let has_vars = config.css_variables && tree.css_vars.values().any(|vars| !vars.is_empty());
    if !has_vars && tree.css.is_empty() {
        debug!("no css to update");
        return Ok(None);
    }

    let path = config.resolved_paths.tailwind_css.clone();
    let mut content = read_or_empty(&path).await?;
    if has_vars {
        content = update_css_vars(&content, &tree.css_vars, config.tailwind_version);
    }
    if !tree.css.is_empty() {
        content = update_css_rules(&content, &tree.css);
    }
    Ok(Some(FileUpdate { path, content }))
}

/// Environment variables the items need, appended to `.env.local` or `.env`
pub async fn plan_env_update(config: &ProjectConfig, tree: &ResolvedTree) -> Result<Option<FileUpdate>> {
    if tree.env_vars.is_empty() {
        return Ok(None);
    }
    let path = env_file(&config.resolved_paths.cwd);
    let current = read_or_empty(&path).await?;
    Ok(Some(FileUpdate {
        content: merge_env(&current, &tree.env_vars),
        path,
    }))
}

/// Item `tailwind.config` fragments merged into an existing v3 config file
pub async fn plan_tailwind_config_update(
    config: &ProjectConfig,
    tree: &ResolvedTree,
) -> Result<Option<FileUpdate>> {
    let Some(fragment) = &tree.tailwind else {
        return Ok(None);
    };
    if config.tailwind_version != TailwindVersion::V3 {
        debug!("tailwind config fragments only apply to v3 projects");
        return Ok(None);
    }
    let path = config.resolved_paths.tailwind_config.clone();
    let current = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no tailwind config to update");
            return Ok(None);
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };
    Ok(Some(FileUpdate {
        content: update_tailwind_config(&current, fragment),
        path,
    }))
}

/// Font loading in the root layout of a Next.js app router project
pub async fn plan_layout_update(
    config: &ProjectConfig,
    tree: &ResolvedTree,
    framework: Framework,
) -> Result<Option<FileUpdate>> {
    if tree.fonts.is_empty() || framework != Framework::NextApp {
        return Ok(None);
    }
    let Some(path) = find_layout_file(&config.resolved_paths.cwd, config.tsx) else {
        debug!("no root layout found for fonts");
        return Ok(None);
    };
    let current = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let content = transform_layout_fonts(&current, &tree.fonts, &config.aliases.utils)
        .with_context(|| format!("Failed to update fonts in {}", path.display()))?;
    Ok(Some(FileUpdate { path, content }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::schema::FontSpec;
    use indexmap::IndexMap;
    use serde_json::json;
    use tempfile::TempDir;

    fn tree_with_radius() -> ResolvedTree {
        let mut tree = ResolvedTree::default();
        let mut light = IndexMap::new();
        light.insert("radius".to_string(), "0.5rem".to_string());
        tree.css_vars.insert("light".to_string(), light);
        tree
    }

    fn project_config(dir: &TempDir) -> ProjectConfig {
        let mut config = test_config();
        config.resolved_paths.cwd = dir.path().to_path_buf();
        config.resolved_paths.tailwind_css = dir.path().join("globals.css");
        config.resolved_paths.tailwind_config = dir.path().join("tailwind.config.ts");
        config
    }

    #[tokio::test]
    async fn test_skipped_without_css_variables() {
        let mut config = test_config();
        config.css_variables = false;
        assert!(plan_css_update(&config, &tree_with_radius()).await.unwrap().is_none());

        let config = test_config();
        assert!(plan_css_update(&config, &ResolvedTree::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reads_existing_stylesheet() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("globals.css"), "@import \"tailwindcss\";\n").unwrap();

        let mut config = project_config(&dir);
        config.tailwind_version = TailwindVersion::V4;

        let update = plan_css_update(&config, &tree_with_radius()).await.unwrap().unwrap();
        assert_eq!(update.path, dir.path().join("globals.css"));
        assert_eq!(
            update.content,
            "@import \"tailwindcss\";\n\n:root {\n  --radius: 0.5rem;\n}\n"
        );
    }

    #[tokio::test]
    async fn test_css_rules_apply_without_css_variables() {
        let dir = TempDir::new().unwrap();
        let mut config = project_config(&dir);
        config.css_variables = false;
        let mut tree = tree_with_radius();
        tree.css.insert(
            "@utility content-auto".to_string(),
            json!({ "content-visibility": "auto" }),
        );

        let update = plan_css_update(&config, &tree).await.unwrap().unwrap();
        assert_eq!(update.content, "@utility content-auto {\n  content-visibility: auto;\n}\n");
    }

    #[tokio::test]
    async fn test_env_update_keeps_existing_values() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".env"), "API_URL=http://mine\n").unwrap();
        let mut tree = ResolvedTree::default();
        tree.env_vars.insert("API_URL".to_string(), "http://theirs".to_string());
        tree.env_vars.insert("API_KEY".to_string(), String::new());

        let update = plan_env_update(&project_config(&dir), &tree).await.unwrap().unwrap();
        assert_eq!(update.path, dir.path().join(".env"));
        assert_eq!(update.content, "API_URL=http://mine\n\nAPI_KEY=\n");

        assert!(plan_env_update(&project_config(&dir), &ResolvedTree::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_tailwind_config_only_for_existing_v3_configs() {
        let dir = TempDir::new().unwrap();
        let mut tree = ResolvedTree::default();
        tree.tailwind = Some(json!({ "config": { "darkMode": ["class"] } }));

        let mut config = project_config(&dir);
        config.tailwind_version = TailwindVersion::V3;
        assert!(plan_tailwind_config_update(&config, &tree).await.unwrap().is_none());

        std::fs::write(
            dir.path().join("tailwind.config.ts"),
            "export default {\n  content: [],\n}\n",
        )
        .unwrap();
        let update = plan_tailwind_config_update(&config, &tree).await.unwrap().unwrap();
        assert_eq!(
            update.content,
            "export default {\n  content: [],\n  darkMode: [\"class\"],\n}\n"
        );

        config.tailwind_version = TailwindVersion::V4;
        assert!(plan_tailwind_config_update(&config, &tree).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_layout_update_for_next_app() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("app")).unwrap();
        std::fs::write(
            dir.path().join("app/layout.tsx"),
            "export default function Layout() {\n  return <html><body /></html>\n}\n",
        )
        .unwrap();
        let mut tree = ResolvedTree::default();
        tree.fonts.push(FontSpec {
            family: "Inter".to_string(),
            provider: "google".to_string(),
            import: "Inter".to_string(),
            variable: "--font-sans".to_string(),
            weight: Vec::new(),
            subsets: Vec::new(),
        });
        let config = project_config(&dir);

        assert!(plan_layout_update(&config, &tree, Framework::Other).await.unwrap().is_none());
        let update = plan_layout_update(&config, &tree, Framework::NextApp)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            update.content,
            "import { Inter } from \"next/font/google\"\n\nconst inter = Inter({ variable: \"--font-sans\" })\n\nexport default function Layout() {\n  return <html className={inter.variable}><body /></html>\n}\n"
        );
    }
}
