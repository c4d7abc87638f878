//! Components and version selection

use crate::bundle::Bundle;
use crate::error::{RegistryError, RegistryResult};
use crate::registry::backend::{ComponentRecord, VersionRecord};
use crate::registry::context::RegistryContext;
use crate::registry::version::Version;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which version of a component to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionSelector {
    #[default]
    Latest,
    Number(u32),
}

impl FromStr for VersionSelector {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "latest" | "" => Ok(Self::Latest),
            other => other
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .map(Self::Number)
                .ok_or_else(|| {
                    RegistryError::User(format!(
                        "Invalid version '{}': expected a positive number or 'latest'",
                        other
                    ))
                }),
        }
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

/// A versioned component inside a family
pub struct Component {
    ctx: Arc<RegistryContext>,
    family: String,
    record: Arc<ComponentRecord>,
    versions: Mutex<Option<BTreeMap<u32, Arc<Version>>>>,
}

impl Component {
    pub(crate) fn new(ctx: Arc<RegistryContext>, family: &str, record: ComponentRecord) -> Self {
        Self {
            ctx,
            family: family.to_string(),
            record: Arc::new(record),
            versions: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Backend-assigned id, unique within the registry
    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn title(&self) -> &str {
        &self.record.title
    }

    pub fn description(&self) -> &str {
        &self.record.description
    }

    /// Name of the owning family
    pub fn family_name(&self) -> &str {
        &self.family
    }

    /// Where the backend keeps this component (directory or web page)
    pub fn resource(&self) -> Option<&str> {
        self.record.resource.as_deref()
    }

    pub(crate) fn record(&self) -> &ComponentRecord {
        &self.record
    }

    fn with_versions<R>(&self, f: impl FnOnce(&mut BTreeMap<u32, Arc<Version>>) -> R) -> R {
        let mut slot = self.versions.lock();
        let versions = slot.get_or_insert_with(|| {
            let records = self.ctx.backend.list_versions(&self.record);
            debug!("Found {} versions of {}", records.len(), self.name());
            records
                .into_iter()
                .map(|r| (r.number, Arc::new(self.listed(r))))
                .collect()
        });
        f(versions)
    }

    fn listed(&self, record: VersionRecord) -> Version {
        Version::listed(
            Arc::clone(&self.ctx),
            &self.family,
            Arc::clone(&self.record),
            record,
        )
    }

    /// All versions in ascending order
    pub fn versions(&self) -> Vec<Arc<Version>> {
        self.with_versions(|versions| versions.values().cloned().collect())
    }

    pub fn latest_version(&self) -> Option<Arc<Version>> {
        self.with_versions(|versions| versions.values().next_back().cloned())
    }

    pub fn get_version(&self, selector: VersionSelector) -> RegistryResult<Arc<Version>> {
        let found = match selector {
            VersionSelector::Latest => self.latest_version(),
            VersionSelector::Number(n) => self.with_versions(|versions| versions.get(&n).cloned()),
        };
        found.ok_or_else(|| {
            RegistryError::not_found("Version", format!("{} {}", self.name(), selector))
        })
    }

    /// Publish a new version; the backend assigns its number
    pub fn add_version(&self, bundle: &Bundle, comment: &str) -> RegistryResult<Arc<Version>> {
        self.with_versions(|versions| {
            let record = self.ctx.backend.add_version(&self.record, bundle, comment)?;

            if let Some(latest) = versions.keys().next_back() {
                if record.number <= *latest {
                    warn!(
                        "Backend assigned version {} to {} but {} already exists",
                        record.number,
                        self.name(),
                        latest
                    );
                }
            }

            let number = record.number;
            let version = Arc::new(self.created(record, bundle));
            versions.insert(number, Arc::clone(&version));
            info!("Added version {} of {}", number, self.name());
            Ok(version)
        })
    }

    /// Register the first version of a component this process just created
    pub(crate) fn adopt(&self, record: VersionRecord, bundle: &Bundle) -> Arc<Version> {
        let number = record.number;
        let version = Arc::new(self.created(record, bundle));
        self.versions
            .lock()
            .get_or_insert_with(BTreeMap::new)
            .insert(number, Arc::clone(&version));
        version
    }

    fn created(&self, record: VersionRecord, bundle: &Bundle) -> Version {
        Version::created(
            Arc::clone(&self.ctx),
            &self.family,
            Arc::clone(&self.record),
            record,
            bundle,
        )
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.ctx.address() == other.ctx.address() && self.record.id == other.record.id
    }
}

impl Eq for Component {}

impl Hash for Component {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ctx.address().hash(state);
        self.record.id.hash(state);
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("registry", self.ctx.address())
            .field("family", &self.family)
            .field("id", &self.record.id)
            .finish()
    }
}
