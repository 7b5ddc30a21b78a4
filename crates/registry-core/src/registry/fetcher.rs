//! Payload fetching from remote registries or local files
//!
//! The [`FetchClient`] trait is the only capability the rest of the crate uses
//! to reach a registry. [`RegistryFetcher`] is the production implementation:
//! HTTP(S) through reqwest, local paths through `tokio::fs`.

use super::endpoint::{redact_url, Location};
use crate::error::RegistryError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Explicit transport settings; nothing is read from the process environment
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub user_agent: String,
    /// Proxy URL applied to every request
    pub proxy: Option<String>,
    pub timeout: Option<Duration>,
    /// Directory relative local paths are resolved against
    pub local_root: PathBuf,
}

impl FetchSettings {
    pub fn new(user_agent: impl Into<String>, local_root: PathBuf) -> Self {
        Self {
            user_agent: user_agent.into(),
            proxy: None,
            timeout: Some(Duration::from_secs(30)),
            local_root,
        }
    }
}

/// One request: a location plus the headers of the registry it belongs to
#[derive(Clone)]
pub struct FetchRequest {
    pub location: Location,
    pub headers: IndexMap<String, String>,
}

impl fmt::Debug for FetchRequest {
    // Header values carry credentials and are never printed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header_names: Vec<&str> = self.headers.keys().map(String::as_str).collect();
        f.debug_struct("FetchRequest")
            .field("location", &self.location)
            .field("headers", &header_names)
            .finish()
    }
}

impl FetchRequest {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            headers: IndexMap::new(),
        }
    }
}

/// Fetch capability returning raw bytes or a classified error
#[async_trait]
pub trait FetchClient: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<u8>, RegistryError>;
}

/// Fetcher for remote URLs and local files
pub struct RegistryFetcher {
    client: reqwest::Client,
    local_root: PathBuf,
}

impl RegistryFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(settings.user_agent.as_str());
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(proxy) = &settings.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .with_context(|| format!("Invalid proxy URL: {}", proxy))?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            local_root: settings.local_root.clone(),
        })
    }

    async fn fetch_remote(
        &self,
        url: &url::Url,
        headers: &IndexMap<String, String>,
    ) -> Result<Vec<u8>, RegistryError> {
        let mut request = self.client.get(url.clone());
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(|e| RegistryError::Network {
            location: redact_url(url),
            message: e.without_url().to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message_from_body(&body).unwrap_or_else(|| {
                status.canonical_reason().unwrap_or("request failed").to_string()
            });
            return Err(RegistryError::from_status(redact_url(url), status.as_u16(), message));
        }

        let bytes = response.bytes().await.map_err(|e| RegistryError::Network {
            location: redact_url(url),
            message: e.without_url().to_string(),
        })?;
        Ok(bytes.to_vec())
    }

    async fn fetch_local(&self, path: &PathBuf) -> Result<Vec<u8>, RegistryError> {
        let full_path = if path.is_absolute() {
            path.clone()
        } else {
            self.local_root.join(path)
        };
        tokio::fs::read(&full_path).await.map_err(|e| {
            let location = full_path.display().to_string();
            if e.kind() == std::io::ErrorKind::NotFound {
                RegistryError::NotFound { location }
            } else {
                RegistryError::Io {
                    location,
                    message: e.to_string(),
                }
            }
        })
    }
}

#[async_trait]
impl FetchClient for RegistryFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<u8>, RegistryError> {
        debug!(location = %request.location, "fetching registry payload");
        match &request.location {
            Location::Remote(url) => self.fetch_remote(url, &request.headers).await,
            Location::Local(path) => self.fetch_local(path).await,
        }
    }
}

/// Registries report failures as `{ "error": "..." }` or `{ "message": "..." }`
fn error_message_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::to_string))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_body() {
        assert_eq!(
            error_message_from_body(r#"{"error":"token expired"}"#).as_deref(),
            Some("token expired")
        );
        assert_eq!(
            error_message_from_body(r#"{"message":"slow down"}"#).as_deref(),
            Some("slow down")
        );
        assert_eq!(error_message_from_body("<html>"), None);
    }

    #[tokio::test]
    async fn test_local_fetch_reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("item.json"), "{}").unwrap();
        let fetcher =
            RegistryFetcher::new(&FetchSettings::new("test", dir.path().to_path_buf())).unwrap();

        let bytes = fetcher
            .fetch(&FetchRequest::new(Location::Local(PathBuf::from("item.json"))))
            .await
            .unwrap();
        assert_eq!(bytes, b"{}");

        let missing = fetcher
            .fetch(&FetchRequest::new(Location::Local(PathBuf::from("nope.json"))))
            .await
            .unwrap_err();
        assert_eq!(missing.kind(), "NotFound");
    }

    #[test]
    fn test_request_debug_hides_secrets() {
        let mut request = FetchRequest::new(
            Location::parse("https://acme.dev/r/button.json?token=s3cret").unwrap(),
        );
        request
            .headers
            .insert("Authorization".to_string(), "Bearer s3cret".to_string());

        let debug = format!("{:?}", request);
        assert!(debug.contains("Authorization"));
        assert!(debug.contains("button.json"));
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn test_rejects_invalid_proxy() {
        let mut settings = FetchSettings::new("test", PathBuf::from("."));
        settings.proxy = Some("::not a url::".to_string());
        assert!(RegistryFetcher::new(&settings).is_err());
    }
}
