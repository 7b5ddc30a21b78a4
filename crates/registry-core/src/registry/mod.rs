//! Registry access
//!
//! This module provides:
//! - Registry endpoints and the namespace map (RegistryEndpoint, RegistryMap)
//! - Item reference parsing (`name`, `@registry/name`, URLs, local files)
//! - The fetch capability and its reqwest-backed implementation
//! - A validating client with concurrent batch fetching
//! - Search across registry indexes

pub mod client;
pub mod endpoint;
pub mod fetcher;
pub mod reference;
pub mod search;

pub use client::{RegistryClient, MAX_CONCURRENT_FETCHES};
pub use endpoint::{
    expand_env, Location, RegistryEndpoint, RegistryMap, DEFAULT_REGISTRY, DEFAULT_REGISTRY_URL,
};
pub use fetcher::{FetchClient, FetchRequest, FetchSettings, RegistryFetcher};
pub use reference::{parse_item_ref, ItemRef, ItemSource};
pub use search::{search_registries, SearchItem, SearchOptions, SearchResults};
