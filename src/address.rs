//! Registry addresses
//!
//! An address is an opaque locator compared by its canonical string form.
//! The scheme decides which backend serves it. Inputs without `://` are
//! plain filesystem paths.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use url::Url;

/// Base address of a registry instance
#[derive(Debug, Clone)]
pub struct RegistryAddress {
    canonical: String,
    /// Parsed form; `None` for plain paths and unparseable URLs
    url: Option<Url>,
}

impl RegistryAddress {
    /// Parse an address, trimming whitespace and trailing slashes
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let canonical = trimmed.trim_end_matches('/');
        // Keep "/" itself and bare "file:///" meaningful
        let canonical = if canonical.is_empty() || canonical.ends_with(':') {
            trimmed
        } else {
            canonical
        };
        let url = if canonical.contains("://") {
            Url::parse(canonical).ok()
        } else {
            None
        };
        Self {
            canonical: canonical.to_string(),
            url,
        }
    }

    /// Build an address for a local directory
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::parse(&path.into().display().to_string())
    }

    /// Canonical string form
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Lowercased scheme; plain paths report `file`
    pub fn scheme(&self) -> String {
        match (&self.url, self.canonical.find("://")) {
            (Some(url), _) => url.scheme().to_string(),
            (None, Some(idx)) => self.canonical[..idx].to_ascii_lowercase(),
            (None, None) => "file".to_string(),
        }
    }

    /// Whether the address is served by the remote (HTTP) backend
    pub fn is_remote(&self) -> bool {
        matches!(self.scheme().as_str(), "http" | "https")
    }

    /// Lowercased host of a URL address
    pub fn host(&self) -> Option<&str> {
        self.url.as_ref()?.host_str()
    }

    /// Explicit port of a URL address
    pub fn port(&self) -> Option<u16> {
        self.url.as_ref()?.port()
    }

    /// Filesystem path of a local address
    ///
    /// `file://` URLs are percent-decoded; `localhost` is the only host
    /// accepted for them.
    pub fn to_local_path(&self) -> Option<PathBuf> {
        if self.is_remote() {
            return None;
        }
        match &self.url {
            Some(url) if url.scheme() == "file" => url.to_file_path().ok(),
            Some(_) => None,
            None if self.canonical.contains("://") => None,
            None => Some(PathBuf::from(&self.canonical)),
        }
    }

    /// Join a relative API path onto the address
    ///
    /// A query or fragment on the base address is not carried over.
    pub fn join(&self, path: &str) -> String {
        let base = match &self.url {
            Some(url) if url.query().is_some() || url.fragment().is_some() => {
                let mut url = url.clone();
                url.set_query(None);
                url.set_fragment(None);
                url.as_str().trim_end_matches('/').to_string()
            }
            _ => self.canonical.clone(),
        };
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

impl PartialEq for RegistryAddress {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for RegistryAddress {}

impl Hash for RegistryAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for RegistryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl From<&str> for RegistryAddress {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}
