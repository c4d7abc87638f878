//! Error types for the component registry
//!
//! All modules use `RegistryResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// All errors that can occur while resolving or mutating registries
#[derive(Error, Debug)]
pub enum RegistryError {
    // Lookup errors
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    // Backend errors
    #[error("Registry unavailable at {address}: {reason}")]
    RegistryUnavailable { address: String, reason: String },

    #[error("Backend IO error: {context}")]
    BackendIo {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Remote call to {url} failed: {reason}")]
    Remote { url: String, reason: String },

    #[error("Artifact for {component} version {version} unavailable: {reason}")]
    ArtifactUnavailable {
        component: String,
        version: u32,
        reason: String,
    },

    // Mutation conflicts
    #[error("Component already exists: {0}")]
    ComponentAlreadyExists(String),

    #[error("Family already exists: {0}")]
    FamilyAlreadyExists(String),

    #[error("Unknown license: {0}")]
    UnknownLicense(String),

    #[error("Operation not supported by {backend} registries: {operation}")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

impl RegistryError {
    /// Create a backend IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::BackendIo {
            context: context.into(),
            source,
        }
    }

    /// Create a not-found error for the given entity kind
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Create a remote call error
    pub fn remote(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Remote {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a registry-unavailable error
    pub fn unavailable(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RegistryUnavailable {
            address: address.into(),
            reason: reason.into(),
        }
    }

    /// Whether a caller could reasonably retry the same operation later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RegistryUnavailable { .. } | Self::Remote { .. } | Self::ArtifactUnavailable { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::RegistryUnavailable { .. } => {
                Some("Check the registry address and the credentials in your config")
            }
            Self::ComponentAlreadyExists(_) => Some("Use add-version to publish a new version"),
            Self::ConfigInvalid { .. } => Some("Run: compreg config init --force"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = RegistryError::not_found("Family", "text-mining");
        assert_eq!(err.to_string(), "Family not found: text-mining");
    }

    #[test]
    fn error_hint() {
        let err = RegistryError::ComponentAlreadyExists("foo".to_string());
        assert_eq!(err.hint(), Some("Use add-version to publish a new version"));
        assert!(RegistryError::User("x".to_string()).hint().is_none());
    }

    #[test]
    fn error_retryable() {
        assert!(RegistryError::unavailable("http://example.org", "down").is_retryable());
        assert!(!RegistryError::ComponentAlreadyExists("foo".to_string()).is_retryable());
    }
}
