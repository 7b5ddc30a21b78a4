//! Error types for registry access and configuration

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while fetching or validating registry payloads.
///
/// Every variant describes a single request; callers aggregate them instead of
/// aborting sibling work.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("'{location}' was not found; it may not exist in the registry")]
    NotFound { location: String },

    #[error("not authorized to access '{location}'; the registry may require authentication")]
    Unauthorized { location: String },

    #[error("access to '{location}' is forbidden; check the registry token or permissions")]
    Forbidden { location: String },

    #[error("failed to fetch '{location}': HTTP {status} {message}")]
    ServerError {
        location: String,
        status: u16,
        message: String,
    },

    #[error("network error fetching '{location}': {message}")]
    Network { location: String, message: String },

    #[error("failed to read '{location}': {message}")]
    Io { location: String, message: String },

    #[error("invalid payload from '{location}': {reason}")]
    InvalidSchema { location: String, reason: String },

    #[error("unknown registry '{namespace}'; add it to the registries map in components.json")]
    UnknownRegistry { namespace: String },

    #[error("invalid registry reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },
}

impl RegistryError {
    /// Short machine-friendly name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::NotFound { .. } => "NotFound",
            RegistryError::Unauthorized { .. } => "Unauthorized",
            RegistryError::Forbidden { .. } => "Forbidden",
            RegistryError::ServerError { .. } => "ServerError",
            RegistryError::Network { .. } => "Network",
            RegistryError::Io { .. } => "Io",
            RegistryError::InvalidSchema { .. } => "InvalidSchema",
            RegistryError::UnknownRegistry { .. } => "UnknownRegistry",
            RegistryError::InvalidReference { .. } => "InvalidReference",
        }
    }

    /// Map an HTTP status to the matching error kind
    pub fn from_status(location: impl Into<String>, status: u16, message: String) -> Self {
        let location = location.into();
        match status {
            401 => RegistryError::Unauthorized { location },
            403 => RegistryError::Forbidden { location },
            404 | 410 => RegistryError::NotFound { location },
            _ => RegistryError::ServerError {
                location,
                status,
                message,
            },
        }
    }
}

/// Errors raised while reading or persisting project configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration in {}: {reason}", path.display())]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(RegistryError::from_status("x", 401, String::new()).kind(), "Unauthorized");
        assert_eq!(RegistryError::from_status("x", 403, String::new()).kind(), "Forbidden");
        assert_eq!(RegistryError::from_status("x", 404, String::new()).kind(), "NotFound");
        assert_eq!(RegistryError::from_status("x", 500, String::new()).kind(), "ServerError");
        assert_eq!(RegistryError::from_status("x", 400, String::new()).kind(), "ServerError");
    }

    #[test]
    fn test_messages_name_the_location() {
        let err = RegistryError::from_status("https://acme.dev/r/x.json", 404, String::new());
        assert!(err.to_string().contains("https://acme.dev/r/x.json"));
    }
}
