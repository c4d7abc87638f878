//! Base profile location with HTTP freshness checks
//!
//! The base profile is fetched from a well-known URI and mirrored to a file
//! under the configuration directory. Resolution order:
//!
//! 1. `HEAD` the remote document for its `Last-Modified` time
//! 2. If that is strictly newer than the cached file (or there is no cached
//!    file), `GET` the document, parse it and overwrite the cache
//! 3. Otherwise, or if the fetch failed, load the cached file
//! 4. With neither, there is no base profile
//!
//! Once a profile has been obtained it is kept for the life of the locator.

use crate::error::{RegistryError, RegistryResult};
use crate::http::HttpClient;
use crate::profile::Profile;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// File name of the cached base profile
pub const BASE_PROFILE_FILE: &str = "BaseProfile.json";

/// Where the canonical base profile is published
pub const DEFAULT_BASE_PROFILE_URI: &str = "http://build.mygrid.org.uk/taverna/BaseProfile.json";

const TIMESTAMP_FORMAT: &str = "%d %b %Y %H:%M:%S %z";

/// Parse a `Last-Modified` value.
///
/// Only the `GMT` and `BST` zone names are understood; any other suffix
/// yields `None`. The leading weekday is ignored, so a server that gets it
/// wrong still yields the date it names.
pub fn parse_http_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let (stamp, offset) = if let Some(stamp) = value.strip_suffix(" GMT") {
        (stamp, "+0000")
    } else if let Some(stamp) = value.strip_suffix(" BST") {
        (stamp, "+0100")
    } else {
        return None;
    };
    let stamp = stamp.split_once(", ").map_or(stamp, |(_, date)| date);

    DateTime::parse_from_str(&format!("{} {}", stamp, offset), TIMESTAMP_FORMAT)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Locates the shared base profile, preferring a fresh remote copy
pub struct BaseProfileLocator {
    http: Arc<dyn HttpClient>,
    uri: String,
    cache_file: PathBuf,
    profile: Mutex<Option<Arc<Profile>>>,
}

impl BaseProfileLocator {
    /// Create a locator caching into `cache_dir/BaseProfile.json`
    pub fn new(http: Arc<dyn HttpClient>, uri: impl Into<String>, cache_dir: &Path) -> Self {
        Self {
            http,
            uri: uri.into(),
            cache_file: cache_dir.join(BASE_PROFILE_FILE),
            profile: Mutex::new(None),
        }
    }

    /// Path of the on-disk copy
    pub fn cache_file(&self) -> &Path {
        &self.cache_file
    }

    /// Remote document URI
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Whether a profile has already been obtained
    pub fn is_resolved(&self) -> bool {
        self.profile.lock().is_some()
    }

    /// Get the base profile, resolving it on first use.
    ///
    /// Concurrent callers wait for the one resolution in progress. A failed
    /// resolution is attempted again on the next call.
    pub fn get_profile(&self) -> Option<Arc<Profile>> {
        let mut slot = self.profile.lock();
        if slot.is_none() {
            *slot = self.locate();
        }
        slot.clone()
    }

    fn locate(&self) -> Option<Arc<Profile>> {
        let remote_time = match self.remote_timestamp() {
            Ok(time) => {
                info!("Base profile remote timestamp is {:?}", time);
                time
            }
            Err(e) => {
                info!("Could not check base profile freshness: {}", e);
                None
            }
        };
        let local_time = self.local_timestamp();

        let fetch = match (remote_time, local_time) {
            (Some(remote), Some(local)) => remote > local,
            (Some(_), None) => true,
            (None, _) => false,
        };

        if fetch {
            match self.fetch_remote() {
                Ok(profile) => return Some(Arc::new(profile)),
                Err(e) => warn!("Failed to refresh base profile: {}", e),
            }
        }

        if !self.cache_file.exists() {
            debug!("No cached base profile at {}", self.cache_file.display());
            return None;
        }

        match Profile::from_file(&self.cache_file) {
            Ok(profile) => {
                debug!("Using cached base profile {}", self.cache_file.display());
                Some(Arc::new(profile))
            }
            Err(e) => {
                warn!("Cached base profile is unusable: {}", e);
                None
            }
        }
    }

    /// `Ok(None)` when the server answered without a usable timestamp
    fn remote_timestamp(&self) -> RegistryResult<Option<DateTime<Utc>>> {
        let response = self
            .http
            .head(&self.uri)
            .map_err(|e| RegistryError::remote(&self.uri, e.to_string()))?;

        if response.status != 200 {
            warn!("HTTP status {} while getting {}", response.status, self.uri);
            return Ok(None);
        }

        let Some(value) = response.last_modified else {
            return Ok(None);
        };

        parse_http_timestamp(&value).map(Some).ok_or_else(|| {
            RegistryError::remote(&self.uri, format!("unparseable Last-Modified '{}'", value))
        })
    }

    fn local_timestamp(&self) -> Option<DateTime<Utc>> {
        fs::metadata(&self.cache_file)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from)
    }

    fn fetch_remote(&self) -> RegistryResult<Profile> {
        let response = self
            .http
            .get(&self.uri, &[])
            .map_err(|e| RegistryError::remote(&self.uri, e.to_string()))?;

        if !response.is_success() {
            return Err(RegistryError::remote(
                &self.uri,
                format!("HTTP status {}", response.status),
            ));
        }

        let source = String::from_utf8(response.body)
            .map_err(|e| RegistryError::remote(&self.uri, e.to_string()))?;
        let profile = Profile::parse(&source)?;

        // A write failure still leaves a usable in-memory profile
        if let Err(e) = self.persist(&source) {
            warn!("Unable to write base profile cache: {}", e);
        }

        info!("Fetched base profile {} from {}", profile.name(), self.uri);
        Ok(profile)
    }

    fn persist(&self, source: &str) -> RegistryResult<()> {
        if let Some(parent) = self.cache_file.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                RegistryError::io(format!("creating directory {}", parent.display()), e)
            })?;
        }
        fs::write(&self.cache_file, source).map_err(|e| {
            RegistryError::io(format!("writing {}", self.cache_file.display()), e)
        })
    }
}
