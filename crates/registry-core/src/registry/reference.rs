//! Parsing of item references
//!
//! A reference is what a user types (`button`, `@acme/header`,
//! `https://example.com/r/card.json`, `./local/item.json`) or what an item
//! lists in `registryDependencies`.

use super::endpoint::{is_url, Location, RegistryMap, DEFAULT_REGISTRY};
use crate::error::RegistryError;
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Where an item is served from
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemSource {
    /// A configured registry namespace such as `@shadcn`
    Registry(String),
    /// A direct URL to the item payload
    Url(Url),
    /// A local JSON file
    Local(PathBuf),
}

/// Identity of an item: its source plus its name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemRef {
    pub source: ItemSource,
    pub name: String,
}

impl ItemRef {
    pub fn registry(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            source: ItemSource::Registry(namespace.into()),
            name: name.into(),
        }
    }

    /// Registry namespace, for registry-sourced items
    pub fn namespace(&self) -> Option<&str> {
        match &self.source {
            ItemSource::Registry(ns) => Some(ns),
            _ => None,
        }
    }

    /// Argument that would re-add this item from the command line
    pub fn to_argument(&self) -> String {
        match &self.source {
            ItemSource::Registry(ns) if ns == DEFAULT_REGISTRY => self.name.clone(),
            ItemSource::Registry(ns) => format!("{}/{}", ns, self.name),
            ItemSource::Url(url) => url.to_string(),
            ItemSource::Local(path) => path.display().to_string(),
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            ItemSource::Registry(ns) => write!(f, "{}/{}", ns, self.name),
            ItemSource::Url(url) => write!(f, "{}", url),
            ItemSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Parse a reference.
///
/// `context` is the registry bare names resolve against: the default
/// registry for requested names, the parent's registry for dependencies.
/// Namespaced references must name a configured registry; nothing is guessed.
/// Local paths are accepted from the user and from local items only, so a
/// remote payload cannot make the installer read project files.
pub fn parse_item_ref(
    raw: &str,
    context: Option<&ItemRef>,
    registries: &RegistryMap,
) -> Result<ItemRef, RegistryError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(RegistryError::InvalidReference {
            reference: raw.to_string(),
            reason: "empty reference".to_string(),
        });
    }

    if is_url(raw) {
        let url = Url::parse(raw).map_err(|e| RegistryError::InvalidReference {
            reference: raw.to_string(),
            reason: e.to_string(),
        })?;
        let name = name_from_path(url.path());
        return Ok(ItemRef {
            source: ItemSource::Url(url),
            name,
        });
    }

    if let Some(stripped) = raw.strip_prefix('@') {
        let (ns, name) = match stripped.split_once('/') {
            Some((ns, name)) if !ns.is_empty() && !name.is_empty() => (format!("@{}", ns), name),
            _ => {
                return Err(RegistryError::InvalidReference {
                    reference: raw.to_string(),
                    reason: "expected @registry/name".to_string(),
                })
            }
        };
        if !registries.contains(&ns) {
            return Err(RegistryError::UnknownRegistry { namespace: ns });
        }
        return Ok(ItemRef::registry(ns, name));
    }

    if is_local_path(raw) {
        if let Some(parent) = context.filter(|parent| !matches!(parent.source, ItemSource::Local(_))) {
            return Err(RegistryError::InvalidReference {
                reference: raw.to_string(),
                reason: format!("remote item {} cannot depend on a local path", parent),
            });
        }
        let path = PathBuf::from(raw);
        let name = name_from_path(raw);
        return Ok(ItemRef {
            source: ItemSource::Local(path),
            name,
        });
    }

    let namespace = context
        .and_then(ItemRef::namespace)
        .unwrap_or(DEFAULT_REGISTRY)
        .to_string();
    Ok(ItemRef::registry(namespace, raw))
}

/// Resolve an item reference to a fetchable location
pub fn item_location(
    item: &ItemRef,
    registries: &RegistryMap,
    style: &str,
) -> Result<Location, RegistryError> {
    match &item.source {
        ItemSource::Registry(ns) => registries
            .get(ns)
            .ok_or_else(|| RegistryError::UnknownRegistry {
                namespace: ns.clone(),
            })?
            .item_location(&item.name, style),
        ItemSource::Url(url) => Ok(Location::Remote(url.clone())),
        ItemSource::Local(path) => Ok(Location::Local(path.clone())),
    }
}

fn is_local_path(raw: &str) -> bool {
    raw.ends_with(".json")
        || raw.starts_with("./")
        || raw.starts_with("../")
        || raw.starts_with('/')
}

fn name_from_path(path: &str) -> String {
    let last = path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path);
    last.strip_suffix(".json").unwrap_or(last).to_string()
}
