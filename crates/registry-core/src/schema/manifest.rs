//! Project manifest (`components.json`) schema
//!
//! Every field is optional: the manifest is a partial configuration that is
//! layered over defaults by [`crate::config`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// File name of the project manifest
pub const MANIFEST_FILE: &str = "components.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TailwindManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_variables: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AliasesManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utils: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lib: Option<String>,
}

/// A registry entry: either a bare URL template or a full object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegistryManifest {
    Url(String),
    Detailed(RegistryManifestEntry),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryManifestEntry {
    /// Item URL template with `{name}` and optional `{style}` placeholders
    pub url: String,
    /// Explicit index URL; defaults to the template expanded with `registry`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub params: IndexMap<String, String>,
}

/// The on-disk manifest, any subset of fields present
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectManifest {
    #[serde(default, rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsc: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsx: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tailwind: Option<TailwindManifest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<AliasesManifest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_library: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtl: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registries: Option<IndexMap<String, RegistryManifest>>,
}

impl ProjectManifest {
    pub fn from_json(bytes: &[u8]) -> Result<Self, String> {
        let manifest: ProjectManifest =
            serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        if let Some(registries) = &manifest.registries {
            for (name, entry) in registries {
                if !name.starts_with('@') || name.len() < 2 {
                    return Err(format!(
                        "registry name '{}' must start with '@' followed by a name",
                        name
                    ));
                }
                let url = match entry {
                    RegistryManifest::Url(url) => url,
                    RegistryManifest::Detailed(entry) => &entry.url,
                };
                if !url.contains("{name}") {
                    return Err(format!(
                        "registry '{}' url must contain the {{name}} placeholder",
                        name
                    ));
                }
            }
        }
        Ok(manifest)
    }
}
