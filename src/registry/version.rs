//! Component versions and their artifacts

use crate::address::RegistryAddress;
use crate::bundle::Bundle;
use crate::error::{RegistryError, RegistryResult};
use crate::registry::artifact_cache::ArtifactKey;
use crate::registry::backend::{ArtifactLocation, ComponentRecord, Retention, VersionRecord};
use crate::registry::context::RegistryContext;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::debug;

/// Fully qualified reference to a component version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionId {
    pub registry: String,
    pub family: String,
    pub component: String,
    /// `None` selects the latest version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

impl VersionId {
    pub fn registry_address(&self) -> RegistryAddress {
        RegistryAddress::parse(&self.registry)
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.registry, self.family, self.component)?;
        match self.version {
            Some(n) => write!(f, " v{}", n),
            None => f.write_str(" (latest)"),
        }
    }
}

/// One immutable version of a component
///
/// Number and description never change. The payload is either pinned by
/// the version itself or held in the shared artifact cache, in which case
/// it is fetched again after eviction.
pub struct Version {
    ctx: Arc<RegistryContext>,
    family: String,
    component: Arc<ComponentRecord>,
    number: u32,
    description: String,
    location: OnceCell<ArtifactLocation>,
    pinned: Option<Arc<Bundle>>,
    fetch_lock: Mutex<()>,
}

impl Version {
    /// A version discovered by listing; its payload is fetched on demand
    pub(crate) fn listed(
        ctx: Arc<RegistryContext>,
        family: &str,
        component: Arc<ComponentRecord>,
        record: VersionRecord,
    ) -> Self {
        Self {
            ctx,
            family: family.to_string(),
            component,
            number: record.number,
            description: record.description,
            location: OnceCell::new(),
            pinned: None,
            fetch_lock: Mutex::new(()),
        }
    }

    /// A version this process just published, retained as the backend asks
    pub(crate) fn created(
        ctx: Arc<RegistryContext>,
        family: &str,
        component: Arc<ComponentRecord>,
        record: VersionRecord,
        bundle: &Bundle,
    ) -> Self {
        let mut version = Self::listed(ctx, family, component, record);
        let bundle = Arc::new(bundle.clone());
        match version.ctx.backend.new_artifact_retention() {
            Retention::Pinned => version.pinned = Some(bundle),
            Retention::Cached => version.ctx.artifacts.insert(version.artifact_key(), bundle),
        }
        version
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Revision comment
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn component_name(&self) -> &str {
        &self.component.name
    }

    pub fn component_id(&self) -> &str {
        &self.component.id
    }

    pub fn family_name(&self) -> &str {
        &self.family
    }

    pub fn id(&self) -> VersionId {
        VersionId {
            registry: self.ctx.address().to_string(),
            family: self.family.clone(),
            component: self.component.name.clone(),
            version: Some(self.number),
        }
    }

    /// Key of this version's payload in the artifact cache
    pub fn artifact_key(&self) -> ArtifactKey {
        ArtifactKey {
            registry: self.ctx.address().to_string(),
            family: self.component.family_id.clone(),
            component: self.component.id.clone(),
            version: self.number,
        }
    }

    /// Documentation page, when the backend publishes one
    pub fn help_url(&self) -> Option<String> {
        self.ctx.backend.help_url(&self.component, self.number)
    }

    /// Whether the payload is held by the version itself
    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }

    /// The version's payload, fetched from the backend when not in memory
    pub fn artifact(&self) -> RegistryResult<Arc<Bundle>> {
        if let Some(ref bundle) = self.pinned {
            return Ok(Arc::clone(bundle));
        }

        let key = self.artifact_key();
        if let Some(bundle) = self.ctx.artifacts.get(&key) {
            return Ok(bundle);
        }

        let _guard = self.fetch_lock.lock();
        // Another caller may have fetched while we waited
        if let Some(bundle) = self.ctx.artifacts.get(&key) {
            return Ok(bundle);
        }

        let bundle = self
            .fetch()
            .map(Arc::new)
            .map_err(|e| RegistryError::ArtifactUnavailable {
                component: self.component.name.clone(),
                version: self.number,
                reason: e.to_string(),
            })?;
        debug!("Fetched {} ({} bytes)", key, bundle.len());
        self.ctx.artifacts.insert(key, Arc::clone(&bundle));
        Ok(bundle)
    }

    fn fetch(&self) -> RegistryResult<Bundle> {
        let location = self
            .location
            .get_or_try_init(|| self.ctx.backend.artifact_location(&self.component, self.number))?;
        self.ctx.backend.fetch_artifact(location, self.number)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number
            && self.component.id == other.component.id
            && self.ctx.address() == other.ctx.address()
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ctx.address().hash(state);
        self.component.id.hash(state);
        self.number.hash(state);
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Version")
            .field("registry", self.ctx.address())
            .field("component", &self.component.id)
            .field("number", &self.number)
            .field("pinned", &self.pinned.is_some())
            .finish()
    }
}
