//! Registry endpoints: where a named registry lives and how to authenticate

use crate::error::RegistryError;
use indexmap::IndexMap;
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Namespace of the built-in registry
pub const DEFAULT_REGISTRY: &str = "@shadcn";

/// Base URL of the built-in registry
pub const DEFAULT_REGISTRY_URL: &str = "https://ui.shadcn.com/r";

/// Name substituted into a URL template to address the registry index
const INDEX_ITEM_NAME: &str = "registry";

/// Where a payload lives - either a remote URL or a local file.
///
/// Display and Debug hide query values and URL credentials, which may hold
/// tokens expanded from the environment. The wrapped [`Url`] is sent as is.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Location {
    Remote(Url),
    Local(PathBuf),
}

impl Location {
    /// Parse a URL or treat anything without an http(s) scheme as a path
    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        if is_url(raw) {
            let url = Url::parse(raw).map_err(|e| RegistryError::InvalidReference {
                reference: raw.to_string(),
                reason: e.to_string(),
            })?;
            Ok(Location::Remote(url))
        } else {
            Ok(Location::Local(PathBuf::from(raw)))
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Remote(url) => f.write_str(&redact_url(url)),
            Location::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Remote(_) => f.debug_tuple("Remote").field(&self.to_string()).finish(),
            Location::Local(path) => f.debug_tuple("Local").field(path).finish(),
        }
    }
}

/// URL text for logs and errors, with credentials and query values masked
pub fn redact_url(url: &Url) -> String {
    const MASK: &str = "***";
    let mut shown = url.clone();
    if !shown.username().is_empty() {
        let _ = shown.set_username(MASK);
    }
    if shown.password().is_some() {
        let _ = shown.set_password(Some(MASK));
    }
    if shown.query().is_some() {
        let keys: Vec<String> = shown.query_pairs().map(|(key, _)| key.into_owned()).collect();
        shown
            .query_pairs_mut()
            .clear()
            .extend_pairs(keys.iter().map(|key| (key.as_str(), MASK)));
    }
    shown.to_string()
}

pub fn is_url(raw: &str) -> bool {
    raw.starts_with("http://") || raw.starts_with("https://")
}

/// A configured registry
#[derive(Clone, PartialEq)]
pub struct RegistryEndpoint {
    /// Item URL template with `{name}` and optional `{style}` placeholders
    pub item_template: String,
    /// Explicit index location
    pub index: Option<String>,
    /// Request headers, already expanded from the environment
    pub headers: IndexMap<String, String>,
    /// Query parameters appended to every request
    pub params: IndexMap<String, String>,
}

impl RegistryEndpoint {
    pub fn new(item_template: impl Into<String>) -> Self {
        Self {
            item_template: item_template.into(),
            index: None,
            headers: IndexMap::new(),
            params: IndexMap::new(),
        }
    }

    /// Endpoint rooted at a registry base URL laid out like the built-in one
    pub fn from_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            item_template: format!("{}/styles/{{style}}/{{name}}.json", base),
            index: Some(format!("{}/index.json", base)),
            headers: IndexMap::new(),
            params: IndexMap::new(),
        }
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Location of a named item for the given style
    pub fn item_location(&self, name: &str, style: &str) -> Result<Location, RegistryError> {
        let raw = self
            .item_template
            .replace("{name}", name)
            .replace("{style}", style);
        self.with_params(Location::parse(&raw)?)
    }

    /// Location of the registry index
    pub fn index_location(&self, style: &str) -> Result<Location, RegistryError> {
        let raw = match &self.index {
            Some(index) => index.replace("{style}", style),
            None => self
                .item_template
                .replace("{name}", INDEX_ITEM_NAME)
                .replace("{style}", style),
        };
        self.with_params(Location::parse(&raw)?)
    }

    /// Location of the registry-supplied default configuration
    pub fn config_location(&self, style: &str) -> Result<Location, RegistryError> {
        let raw = self
            .item_template
            .replace("{name}", "config")
            .replace("{style}", style);
        self.with_params(Location::parse(&raw)?)
    }

    fn with_params(&self, location: Location) -> Result<Location, RegistryError> {
        match location {
            Location::Remote(mut url) => {
                if !self.params.is_empty() {
                    let mut pairs = url.query_pairs_mut();
                    for (key, value) in &self.params {
                        pairs.append_pair(key, value);
                    }
                }
                Ok(Location::Remote(url))
            }
            local => Ok(local),
        }
    }
}

impl fmt::Debug for RegistryEndpoint {
    // Header values carry credentials and are never printed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header_names: Vec<&str> = self.headers.keys().map(String::as_str).collect();
        f.debug_struct("RegistryEndpoint")
            .field("item_template", &self.item_template)
            .field("index", &self.index)
            .field("headers", &header_names)
            .field("params", &self.params.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Namespace → endpoint map, always containing the built-in registry
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryMap {
    endpoints: IndexMap<String, RegistryEndpoint>,
}

impl RegistryMap {
    /// Map with only the built-in registry rooted at `default_base`
    pub fn with_default(default_base: &str) -> Self {
        let mut endpoints = IndexMap::new();
        endpoints.insert(
            DEFAULT_REGISTRY.to_string(),
            RegistryEndpoint::from_base_url(default_base),
        );
        Self { endpoints }
    }

    pub fn insert(&mut self, namespace: impl Into<String>, endpoint: RegistryEndpoint) {
        self.endpoints.insert(namespace.into(), endpoint);
    }

    pub fn get(&self, namespace: &str) -> Option<&RegistryEndpoint> {
        self.endpoints.get(namespace)
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.endpoints.contains_key(namespace)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }
}

impl Default for RegistryMap {
    fn default() -> Self {
        Self::with_default(DEFAULT_REGISTRY_URL)
    }
}

/// Expand `${VAR}` references using `lookup`; unknown variables expand to ""
pub fn expand_env<F>(value: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                out.push_str(&lookup(var).unwrap_or_default());
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
