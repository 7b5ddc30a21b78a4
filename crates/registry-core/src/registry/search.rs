//! Search and listing across registry indexes

use super::client::RegistryClient;
use super::endpoint::is_url;
use crate::schema::ItemType;
use anyhow::{Context, Result};
use serde::Serialize;

/// Search filters and pagination
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub query: Option<String>,
    pub limit: Option<usize>,
    pub offset: usize,
}

/// One item in the flattened search output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub registry: String,
    pub add_command_argument: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub items: Vec<SearchItem>,
    pub pagination: Pagination,
}

/// Search one or more registries.
///
/// Registries are `@namespace` references or direct index URLs. The first
/// registry that cannot be fetched fails the whole search.
pub async fn search_registries(
    client: &RegistryClient,
    registries: &[String],
    options: &SearchOptions,
) -> Result<SearchResults> {
    let mut all_items = Vec::new();

    for registry in registries {
        let index = client
            .fetch_index(registry)
            .await
            .with_context(|| format!("Failed to fetch registry {}", registry))?;

        for entry in index.entries() {
            let add_command_argument = if is_url(registry) {
                entry.name.clone()
            } else {
                format!("{}/{}", registry, entry.name)
            };
            all_items.push(SearchItem {
                name: entry.name.clone(),
                item_type: entry.item_type,
                description: entry.description.clone(),
                registry: registry.clone(),
                add_command_argument,
            });
        }
    }

    let matched = match options.query.as_deref().map(str::trim) {
        Some(query) if !query.is_empty() => filter_items(all_items, query),
        _ => all_items,
    };

    Ok(paginate(matched, options.offset, options.limit))
}

/// Rank matches: exact name, name substring, description substring, then
/// subsequence of the name. Order within a rank follows the registries.
fn filter_items(items: Vec<SearchItem>, query: &str) -> Vec<SearchItem> {
    let query = query.to_lowercase();
    let mut ranked: Vec<(u8, usize, SearchItem)> = items
        .into_iter()
        .enumerate()
        .filter_map(|(position, item)| {
            let name = item.name.to_lowercase();
            let description = item.description.as_deref().unwrap_or("").to_lowercase();
            let rank = if name == query {
                0
            } else if name.contains(&query) {
                1
            } else if description.contains(&query) {
                2
            } else if is_subsequence(&query, &name) {
                3
            } else {
                return None;
            };
            Some((rank, position, item))
        })
        .collect();
    ranked.sort_by_key(|(rank, position, _)| (*rank, *position));
    ranked.into_iter().map(|(_, _, item)| item).collect()
}

fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut chars = haystack.chars();
    needle.chars().all(|c| chars.any(|h| h == c))
}

fn paginate(items: Vec<SearchItem>, offset: usize, limit: Option<usize>) -> SearchResults {
    let total = items.len();
    let page: Vec<SearchItem> = items
        .into_iter()
        .skip(offset)
        .take(limit.unwrap_or(usize::MAX))
        .collect();
    let has_more = offset + page.len() < total;
    SearchResults {
        pagination: Pagination {
            total,
            offset,
            limit: limit.unwrap_or(page.len()),
            has_more,
        },
        items: page,
    }
}
