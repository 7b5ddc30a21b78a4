//! Registry item descriptors and their validation

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of a registry item (or of a single file inside one)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ItemType {
    Ui,
    Block,
    Component,
    Style,
    Theme,
    Hook,
    Lib,
    Page,
    File,
    Example,
    Internal,
    Item,
    Font,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Ui => "registry:ui",
            ItemType::Block => "registry:block",
            ItemType::Component => "registry:component",
            ItemType::Style => "registry:style",
            ItemType::Theme => "registry:theme",
            ItemType::Hook => "registry:hook",
            ItemType::Lib => "registry:lib",
            ItemType::Page => "registry:page",
            ItemType::File => "registry:file",
            ItemType::Example => "registry:example",
            ItemType::Internal => "registry:internal",
            ItemType::Item => "registry:item",
            ItemType::Font => "registry:font",
        }
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bare = s.strip_prefix("registry:").unwrap_or(s);
        match bare {
            "ui" => Ok(ItemType::Ui),
            "block" => Ok(ItemType::Block),
            "component" => Ok(ItemType::Component),
            "style" => Ok(ItemType::Style),
            "theme" => Ok(ItemType::Theme),
            "hook" => Ok(ItemType::Hook),
            "lib" => Ok(ItemType::Lib),
            "page" => Ok(ItemType::Page),
            "file" => Ok(ItemType::File),
            "example" => Ok(ItemType::Example),
            "internal" => Ok(ItemType::Internal),
            "item" => Ok(ItemType::Item),
            "font" => Ok(ItemType::Font),
            _ => Err(format!("unknown registry item type '{}'", s)),
        }
    }
}

impl TryFrom<String> for ItemType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ItemType> for String {
    fn from(value: ItemType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single file shipped by a registry item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryItemFile {
    /// Path of the file inside the registry
    pub path: String,

    /// Source text
    pub content: String,

    /// Explicit install location; always wins over type-based placement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Per-file category, falls back to the owning item's type
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub file_type: Option<ItemType>,
}

/// CSS variables keyed by mode (`light`, `dark`, `theme`) then variable name
pub type CssVars = IndexMap<String, IndexMap<String, String>>;

/// Stylesheet rules keyed by selector or at-rule. Values are declaration
/// strings or nested rule objects.
pub type CssRules = IndexMap<String, serde_json::Value>;

/// Font requirement declared by an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    #[serde(default = "default_font_provider")]
    pub provider: String,
    /// Name used to import the font (e.g. `Inter`)
    pub import: String,
    /// CSS variable the font is bound to (e.g. `--font-sans`)
    pub variable: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weight: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsets: Vec<String>,
}

fn default_font_provider() -> String {
    "google".to_string()
}

/// Free-form descriptive metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Tailwind major version the item's class names were authored for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tailwind_version: Option<u64>,
    /// Keys registries add for their own tooling
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

/// A named artifact descriptor as served by a registry.
///
/// Fields this crate does not know are ignored, so registries can publish
/// newer schema revisions without breaking installs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryItem {
    #[serde(default, rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    pub name: String,

    #[serde(rename = "type")]
    pub item_type: ItemType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,

    /// Item this one builds on; informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    pub files: Vec<RegistryItemFile>,

    /// External packages, optionally pinned as `name@version`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dev_dependencies: Vec<String>,

    /// Other registry items this one needs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub registry_dependencies: Vec<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub css_vars: CssVars,

    /// Rules merged into the project stylesheet
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub css: CssRules,

    /// Environment variables appended to the project's env file
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env_vars: IndexMap<String, String>,

    /// Tailwind config fragment, merged as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tailwind: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fonts: Vec<FontSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ItemMeta>,
}

impl RegistryItem {
    /// Parse and validate an item payload
    pub fn from_json(bytes: &[u8]) -> Result<Self, String> {
        let item: RegistryItem = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        item.validate()?;
        Ok(item)
    }

    /// Check the invariants serde cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("item name must not be empty".to_string());
        }
        if self.files.is_empty() {
            return Err(format!("item '{}' declares no files", self.name));
        }
        for file in &self.files {
            if file.path.trim().is_empty() {
                return Err(format!("item '{}' has a file with an empty path", self.name));
            }
            if file.path.starts_with('/') || file.path.split('/').any(|seg| seg == "..") {
                return Err(format!(
                    "item '{}' file path '{}' must be relative and stay inside the registry",
                    self.name, file.path
                ));
            }
        }
        Ok(())
    }

    /// Docs text, preferring the top-level field over `meta.docs`
    pub fn docs_text(&self) -> Option<&str> {
        self.docs
            .as_deref()
            .or_else(|| self.meta.as_ref().and_then(|m| m.docs.as_deref()))
    }

    pub fn description_text(&self) -> Option<&str> {
        self.description
            .as_deref()
            .or_else(|| self.meta.as_ref().and_then(|m| m.description.as_deref()))
    }

    /// Tailwind major version the item declares, if any
    pub fn declared_tailwind_version(&self) -> Option<u64> {
        self.meta.as_ref().and_then(|m| m.tailwind_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button_json() -> &'static str {
        r#"{
            "name": "button",
            "type": "registry:ui",
            "files": [{ "path": "ui/button.tsx", "content": "export {}" }],
            "dependencies": ["@radix-ui/react-slot"],
            "registryDependencies": ["utils"],
            "cssVars": { "light": { "radius": "0.5rem" } }
        }"#
    }

    #[test]
    fn test_parses_valid_item() {
        let item = RegistryItem::from_json(button_json().as_bytes()).unwrap();
        assert_eq!(item.name, "button");
        assert_eq!(item.item_type, ItemType::Ui);
        assert_eq!(item.registry_dependencies, vec!["utils"]);
        assert_eq!(item.css_vars["light"]["radius"], "0.5rem");
    }

    #[test]
    fn test_item_type_accepts_bare_and_prefixed_names() {
        assert_eq!("ui".parse::<ItemType>().unwrap(), ItemType::Ui);
        assert_eq!("registry:hook".parse::<ItemType>().unwrap(), ItemType::Hook);
        assert!("registry:widget".parse::<ItemType>().is_err());
        assert_eq!(String::from(ItemType::Lib), "registry:lib");
    }

    #[test]
    fn test_rejects_item_without_files() {
        let json = r#"{ "name": "empty", "type": "registry:lib", "files": [] }"#;
        let err = RegistryItem::from_json(json.as_bytes()).unwrap_err();
        assert!(err.contains("declares no files"));
    }

    #[test]
    fn test_rejects_missing_files_field() {
        let json = r#"{ "name": "empty", "type": "registry:lib" }"#;
        assert!(RegistryItem::from_json(json.as_bytes()).is_err());
    }

    #[test]
    fn test_accepts_fields_it_does_not_use() {
        let json = r#"{
            "$schema": "https://ui.shadcn.com/schema/registry-item.json",
            "name": "login-01",
            "type": "registry:block",
            "author": "shadcn (https://ui.shadcn.com)",
            "categories": ["authentication", "login"],
            "extends": "none",
            "envVars": { "APP_URL": "https://example.com" },
            "css": { "@utility content-auto": { "content-visibility": "auto" } },
            "files": [{ "path": "blocks/login-01/page.tsx", "content": "", "type": "registry:page", "target": "app/login/page.tsx", "origin": "v0" }],
            "meta": { "iframeHeight": "870px", "container": "w-full" },
            "publishedAt": "2024-01-01"
        }"#;
        let item = RegistryItem::from_json(json.as_bytes()).unwrap();
        assert_eq!(item.categories, vec!["authentication", "login"]);
        assert_eq!(item.env_vars["APP_URL"], "https://example.com");
        assert!(item.css.contains_key("@utility content-auto"));
        let meta = item.meta.unwrap();
        assert_eq!(meta.extra["iframeHeight"], "870px");
    }

    #[test]
    fn test_wrong_field_types_are_still_errors() {
        let json = r#"{
            "name": "x", "type": "registry:ui",
            "files": [{ "path": "x.tsx", "content": "" }],
            "dependencies": "clsx"
        }"#;
        assert!(RegistryItem::from_json(json.as_bytes()).is_err());

        let json = r#"{
            "name": "x", "type": "registry:ui",
            "files": [{ "path": "x.tsx", "content": "" }],
            "envVars": { "PORT": 3000 }
        }"#;
        assert!(RegistryItem::from_json(json.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_escaping_file_paths() {
        let json = r#"{
            "name": "x", "type": "registry:ui",
            "files": [{ "path": "../etc/passwd", "content": "" }]
        }"#;
        let err = RegistryItem::from_json(json.as_bytes()).unwrap_err();
        assert!(err.contains("must be relative"));
    }

    #[test]
    fn test_docs_falls_back_to_meta() {
        let json = r#"{
            "name": "x", "type": "registry:ui",
            "files": [{ "path": "x.tsx", "content": "" }],
            "meta": { "docs": "see https://example.com", "tailwindVersion": 3 }
        }"#;
        let item = RegistryItem::from_json(json.as_bytes()).unwrap();
        assert_eq!(item.docs_text(), Some("see https://example.com"));
        assert_eq!(item.declared_tailwind_version(), Some(3));
    }
}
