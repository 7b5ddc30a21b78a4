//! Registry client: typed, validated access to indexes and items

use super::endpoint::{Location, RegistryMap};
use super::fetcher::{FetchClient, FetchRequest};
use super::reference::{item_location, parse_item_ref, ItemRef, ItemSource};
use crate::config::PartialConfig;
use crate::error::RegistryError;
use crate::schema::{ProjectManifest, RegistryIndex, RegistryItem};
use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

/// Upper bound on in-flight requests during a batch fetch
pub const MAX_CONCURRENT_FETCHES: usize = 8;

/// Client over a set of registries sharing one fetch capability
#[derive(Clone)]
pub struct RegistryClient {
    fetcher: Arc<dyn FetchClient>,
    registries: RegistryMap,
    style: String,
}

impl RegistryClient {
    pub fn new(fetcher: Arc<dyn FetchClient>, registries: RegistryMap, style: impl Into<String>) -> Self {
        Self {
            fetcher,
            registries,
            style: style.into(),
        }
    }

    pub fn registries(&self) -> &RegistryMap {
        &self.registries
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    /// Parse a reference against this client's registries
    pub fn parse_ref(&self, raw: &str, context: Option<&ItemRef>) -> Result<ItemRef, RegistryError> {
        parse_item_ref(raw, context, &self.registries)
    }

    /// Fetch and validate the index of a registry namespace (`@name`) or a
    /// direct index URL
    pub async fn fetch_index(&self, registry: &str) -> Result<RegistryIndex, RegistryError> {
        let request = if registry.starts_with('@') {
            let endpoint = self
                .registries
                .get(registry)
                .ok_or_else(|| RegistryError::UnknownRegistry {
                    namespace: registry.to_string(),
                })?;
            FetchRequest {
                location: endpoint.index_location(&self.style)?,
                headers: endpoint.headers.clone(),
            }
        } else {
            FetchRequest::new(Location::parse(registry)?)
        };

        let bytes = self.fetcher.fetch(&request).await?;
        RegistryIndex::from_json(&bytes).map_err(|reason| RegistryError::InvalidSchema {
            location: request.location.to_string(),
            reason,
        })
    }

    /// Fetch and validate a single item
    pub async fn fetch_item(&self, item: &ItemRef) -> Result<RegistryItem, RegistryError> {
        let request = self.item_request(item)?;
        let bytes = self.fetcher.fetch(&request).await?;
        RegistryItem::from_json(&bytes).map_err(|reason| RegistryError::InvalidSchema {
            location: request.location.to_string(),
            reason,
        })
    }

    /// Fetch many items concurrently.
    ///
    /// Results come back in request order and are independent: one failure
    /// never cancels or hides its siblings.
    pub async fn fetch_items(&self, items: &[ItemRef]) -> Vec<Result<RegistryItem, RegistryError>> {
        debug!(count = items.len(), "fetching registry items");
        stream::iter(items.iter())
            .map(|item| self.fetch_item(item))
            .buffered(MAX_CONCURRENT_FETCHES)
            .collect::<Vec<_>>()
            .await
    }

    /// Fetch a registry's `config.json` defaults, if it publishes one
    pub async fn fetch_registry_defaults(&self, namespace: &str) -> Option<PartialConfig> {
        let endpoint = self.registries.get(namespace)?;
        let request = FetchRequest {
            location: endpoint.config_location(&self.style).ok()?,
            headers: endpoint.headers.clone(),
        };
        let bytes = self.fetcher.fetch(&request).await.ok()?;
        match ProjectManifest::from_json(&bytes) {
            Ok(manifest) => Some(PartialConfig::from(manifest)),
            Err(reason) => {
                debug!(%reason, "ignoring invalid registry config.json");
                None
            }
        }
    }

    fn item_request(&self, item: &ItemRef) -> Result<FetchRequest, RegistryError> {
        let location = item_location(item, &self.registries, &self.style)?;
        let headers = match &item.source {
            ItemSource::Registry(ns) => self
                .registries
                .get(ns)
                .map(|endpoint| endpoint.headers.clone())
                .unwrap_or_default(),
            _ => IndexMap::new(),
        };
        Ok(FetchRequest { location, headers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::endpoint::{RegistryEndpoint, DEFAULT_REGISTRY};
    use crate::registry::fetcher::testing::MemoryFetcher;
    use serde_json::json;

    const BASE: &str = "https://ui.shadcn.com/r";

    fn item_json(name: &str) -> serde_json::Value {
        json!({
            "name": name,
            "type": "registry:ui",
            "files": [{ "path": format!("ui/{}.tsx", name), "content": "export {}" }]
        })
    }

    fn client(fetcher: MemoryFetcher) -> RegistryClient {
        let mut registries = RegistryMap::with_default(BASE);
        registries.insert(
            "@acme",
            RegistryEndpoint::new("https://acme.dev/r/{name}.json").with_header("x-api-key", "k"),
        );
        RegistryClient::new(Arc::new(fetcher), registries, "new-york")
    }

    #[tokio::test]
    async fn test_fetch_item_validates_payload() {
        let fetcher = MemoryFetcher::new()
            .with_json(&format!("{}/styles/new-york/button.json", BASE), item_json("button"))
            .with_json(
                &format!("{}/styles/new-york/broken.json", BASE),
                json!({ "name": "broken", "type": "registry:ui", "files": [] }),
            );
        let client = client(fetcher);

        let item = client
            .fetch_item(&ItemRef::registry(DEFAULT_REGISTRY, "button"))
            .await
            .unwrap();
        assert_eq!(item.name, "button");

        let err = client
            .fetch_item(&ItemRef::registry(DEFAULT_REGISTRY, "broken"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidSchema");
    }

    #[tokio::test]
    async fn test_fetch_items_isolates_failures() {
        let fetcher = MemoryFetcher::new()
            .with_json(&format!("{}/styles/new-york/a.json", BASE), item_json("a"))
            .with_status(&format!("{}/styles/new-york/b.json", BASE), 401)
            .with_json("https://acme.dev/r/c.json", item_json("c"));
        let client = client(fetcher);

        let results = client
            .fetch_items(&[
                ItemRef::registry(DEFAULT_REGISTRY, "a"),
                ItemRef::registry(DEFAULT_REGISTRY, "b"),
                ItemRef::registry("@acme", "c"),
            ])
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().name, "a");
        assert_eq!(results[1].as_ref().unwrap_err().kind(), "Unauthorized");
        assert_eq!(results[2].as_ref().unwrap().name, "c");
    }

    #[tokio::test]
    async fn test_fetch_index_by_namespace_and_unknown_namespace() {
        let fetcher = MemoryFetcher::new().with_json(
            "https://acme.dev/r/registry.json",
            json!({ "name": "acme", "items": [{ "name": "c", "type": "registry:ui" }] }),
        );
        let client = client(fetcher);

        let index = client.fetch_index("@acme").await.unwrap();
        assert!(index.contains("c"));

        let err = client.fetch_index("@ghost").await.unwrap_err();
        assert_eq!(err.kind(), "UnknownRegistry");
    }

    #[tokio::test]
    async fn test_fetch_index_invalid_schema() {
        let fetcher = MemoryFetcher::new().with_raw(&format!("{}/index.json", BASE), "not json");
        let err = client(fetcher).fetch_index(DEFAULT_REGISTRY).await.unwrap_err();
        assert_eq!(err.kind(), "InvalidSchema");
    }
}
