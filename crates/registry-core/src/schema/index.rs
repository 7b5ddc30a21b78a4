//! Registry index types
//!
//! An index lists item summaries so the resolver can tell which names exist
//! without downloading file content.

use super::item::ItemType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Summary of one item in a registry index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub name: String,

    #[serde(rename = "type")]
    pub item_type: ItemType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub registry_dependencies: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dev_dependencies: Vec<String>,

    /// File listing without content, as published in `registry.json`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<IndexFile>,
}

/// File reference inside an index entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexFile {
    pub path: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub file_type: Option<ItemType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Document form published by third-party registries (`registry.json`)
#[derive(Debug, Clone, Deserialize)]
struct RegistryDocument {
    #[serde(default, rename = "$schema")]
    _schema: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    homepage: Option<String>,
    items: Vec<IndexEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum IndexPayload {
    Entries(Vec<IndexEntry>),
    Document(RegistryDocument),
}

/// Ordered collection of item summaries with name lookup
#[derive(Debug, Clone, Default)]
pub struct RegistryIndex {
    /// Registry display name, when the payload carries one
    pub name: Option<String>,
    pub homepage: Option<String>,
    entries: Vec<IndexEntry>,
    by_name: HashMap<String, usize>,
}

impl RegistryIndex {
    pub fn new(entries: Vec<IndexEntry>) -> Self {
        let by_name = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name.clone(), i))
            .collect();
        Self {
            name: None,
            homepage: None,
            entries,
            by_name,
        }
    }

    /// Parse either a bare entry array or a `{ name, homepage, items }` document
    pub fn from_json(bytes: &[u8]) -> Result<Self, String> {
        let payload: IndexPayload = serde_json::from_slice(bytes).map_err(|e| {
            format!("payload is neither an index array nor a registry document: {}", e)
        })?;
        let index = match payload {
            IndexPayload::Entries(entries) => Self::new(entries),
            IndexPayload::Document(doc) => {
                let mut index = Self::new(doc.items);
                index.name = doc.name;
                index.homepage = doc.homepage;
                index
            }
        };
        for entry in &index.entries {
            if entry.name.trim().is_empty() {
                return Err("index entry with an empty name".to_string());
            }
        }
        Ok(index)
    }

    pub fn get(&self, name: &str) -> Option<&IndexEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_bare_array() {
        let json = r#"[
            { "name": "button", "type": "registry:ui", "registryDependencies": ["utils"] },
            { "name": "utils", "type": "registry:lib" }
        ]"#;
        let index = RegistryIndex::from_json(json.as_bytes()).unwrap();
        assert_eq!(index.len(), 2);
        assert!(index.contains("utils"));
        assert_eq!(index.get("button").unwrap().registry_dependencies, vec!["utils"]);
        assert_eq!(index.entries()[0].name, "button");
    }

    #[test]
    fn test_parses_registry_document() {
        let json = r#"{
            "name": "acme",
            "homepage": "https://acme.dev",
            "items": [{ "name": "header", "type": "registry:component", "description": "A header" }]
        }"#;
        let index = RegistryIndex::from_json(json.as_bytes()).unwrap();
        assert_eq!(index.name.as_deref(), Some("acme"));
        assert_eq!(index.get("header").unwrap().item_type, ItemType::Component);
    }

    #[test]
    fn test_ignores_fields_it_does_not_use() {
        let json = r#"{
            "$schema": "https://ui.shadcn.com/schema/registry.json",
            "name": "shadcn",
            "homepage": "https://ui.shadcn.com",
            "items": [{
                "name": "login-01",
                "type": "registry:block",
                "categories": ["authentication", "login"],
                "author": "shadcn (https://ui.shadcn.com)",
                "files": [{ "path": "blocks/login-01/page.tsx", "type": "registry:page", "target": "app/login/page.tsx" }],
                "meta": { "iframeHeight": "870px" }
            }, {
                "name": "button-demo",
                "type": "registry:example"
            }]
        }"#;
        let index = RegistryIndex::from_json(json.as_bytes()).unwrap();
        assert_eq!(index.get("login-01").unwrap().categories, vec!["authentication", "login"]);
        assert_eq!(index.get("button-demo").unwrap().item_type, ItemType::Example);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(RegistryIndex::from_json(br#"{ "nope": 1 }"#).is_err());
        assert!(RegistryIndex::from_json(br#"[{ "name": "x", "type": "registry:bogus" }]"#).is_err());
    }
}
