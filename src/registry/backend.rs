//! Backend strategy seam
//!
//! The entity graph (`Registry` → `Family` → `Component` → `Version`) is
//! backend-agnostic. Everything that touches storage goes through a
//! `RegistryBackend`, created by a `BackendFactory` chosen by address scheme.

use crate::address::RegistryAddress;
use crate::bundle::Bundle;
use crate::error::{RegistryError, RegistryResult};
use crate::profile::Profile;
use crate::registry::remote::{License, SharingPolicy};
use std::path::PathBuf;
use std::sync::Arc;

/// Revision comment given to the first version of every new component
pub const INITIAL_VERSION_COMMENT: &str = "Initial version";

/// Which backend implementation serves a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Directory tree on the local filesystem
    Local,
    /// HTTP registry service
    Remote,
}

impl BackendKind {
    /// Get a human-readable backend name
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Local => "local",
            BackendKind::Remote => "remote",
        }
    }
}

/// Backend view of a family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyRecord {
    /// Backend identity (directory name or remote id)
    pub id: String,
    pub name: String,
    pub description: String,
    /// Profile reference carried in the listing, if the backend has one
    pub profile: Option<ProfileRef>,
}

/// How a family refers to its profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileRef {
    /// Matched against `Profile::name`
    Name(String),
    /// Matched against `Profile::id`
    Id(String),
}

impl ProfileRef {
    pub fn matches(&self, profile: &Profile) -> bool {
        match self {
            ProfileRef::Name(name) => profile.name() == name,
            ProfileRef::Id(id) => profile.id() == id,
        }
    }
}

/// Backend view of a component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRecord {
    /// Backend-assigned id, unique within the registry
    pub id: String,
    /// Id of the owning family
    pub family_id: String,
    /// Lookup name within the family
    pub name: String,
    pub title: String,
    pub description: String,
    /// Backend resource locator (directory or web page)
    pub resource: Option<String>,
}

/// Backend view of a version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    pub number: u32,
    pub description: String,
}

/// Where a version's payload lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLocation {
    File(PathBuf),
    Uri(String),
}

/// How a freshly published payload is retained in memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Strong reference held by the version itself
    Pinned,
    /// Reclaimable entry in the shared artifact cache
    Cached,
}

/// Publication metadata for remote registries; local registries ignore it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishOptions {
    /// License name, as listed by the registry
    pub license: Option<String>,
    pub sharing: SharingPolicy,
}

/// Storage strategy behind a registry
pub trait RegistryBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn address(&self) -> &RegistryAddress;

    fn list_families(&self) -> RegistryResult<Vec<FamilyRecord>>;

    /// Profile documents known to this registry
    fn list_profiles(&self) -> RegistryResult<Vec<Profile>>;

    /// Profile reference of a family, read lazily when the listing lacks it
    fn family_profile(&self, family: &FamilyRecord) -> RegistryResult<Option<ProfileRef>> {
        Ok(family.profile.clone())
    }

    fn list_components(&self, family: &FamilyRecord) -> RegistryResult<Vec<ComponentRecord>>;

    /// Best-effort listing: failures and malformed entries are logged and
    /// left out.
    fn list_versions(&self, component: &ComponentRecord) -> Vec<VersionRecord>;

    fn artifact_location(
        &self,
        component: &ComponentRecord,
        version: u32,
    ) -> RegistryResult<ArtifactLocation>;

    fn fetch_artifact(&self, location: &ArtifactLocation, version: u32) -> RegistryResult<Bundle>;

    /// Create a component and its first version
    fn create_component(
        &self,
        family: &FamilyRecord,
        name: &str,
        description: &str,
        bundle: &Bundle,
        options: &PublishOptions,
    ) -> RegistryResult<(ComponentRecord, VersionRecord)>;

    /// Publish a new version; the backend assigns the number
    fn add_version(
        &self,
        component: &ComponentRecord,
        bundle: &Bundle,
        comment: &str,
    ) -> RegistryResult<VersionRecord>;

    fn delete_component(
        &self,
        family: &FamilyRecord,
        component: &ComponentRecord,
    ) -> RegistryResult<()>;

    fn new_artifact_retention(&self) -> Retention;

    fn licenses(&self) -> RegistryResult<Vec<License>> {
        Ok(Vec::new())
    }

    fn help_url(&self, _component: &ComponentRecord, _version: u32) -> Option<String> {
        None
    }

    fn create_family(
        &self,
        _name: &str,
        _profile: Option<&str>,
        _description: &str,
    ) -> RegistryResult<FamilyRecord> {
        Err(RegistryError::Unsupported {
            backend: self.kind().name(),
            operation: "create family",
        })
    }

    fn delete_family(&self, _family: &FamilyRecord) -> RegistryResult<()> {
        Err(RegistryError::Unsupported {
            backend: self.kind().name(),
            operation: "delete family",
        })
    }
}

/// Builds backends for addresses of one scheme family
pub trait BackendFactory: Send + Sync {
    /// Check that the address is usable before construction
    fn verify(&self, _address: &RegistryAddress) -> RegistryResult<()> {
        Ok(())
    }

    fn open(&self, address: &RegistryAddress) -> RegistryResult<Arc<dyn RegistryBackend>>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_ref_matching() {
        let profile = Profile::parse(r#"{"id": "urn:p1", "name": "Text"}"#).unwrap();
        assert!(ProfileRef::Name("Text".into()).matches(&profile));
        assert!(ProfileRef::Id("urn:p1".into()).matches(&profile));
        assert!(!ProfileRef::Name("urn:p1".into()).matches(&profile));
    }

    #[test]
    fn backend_kind_names() {
        assert_eq!(BackendKind::Local.name(), "local");
        assert_eq!(BackendKind::Remote.name(), "remote");
    }
}
