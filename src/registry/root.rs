//! Registry root entity

use crate::address::RegistryAddress;
use crate::error::{RegistryError, RegistryResult};
use crate::profile::{BaseProfileLocator, Profile};
use crate::registry::artifact_cache::ArtifactCache;
use crate::registry::backend::{BackendKind, RegistryBackend};
use crate::registry::context::RegistryContext;
use crate::registry::family::Family;
use crate::registry::remote::License;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// One registry instance, bound to a backend
///
/// The family map is read from the backend once and then kept up to date by
/// this instance's own mutations.
pub struct Registry {
    ctx: Arc<RegistryContext>,
    families: Mutex<Option<BTreeMap<String, Arc<Family>>>>,
}

impl Registry {
    pub fn new(
        backend: Arc<dyn RegistryBackend>,
        artifacts: Arc<ArtifactCache>,
        base_profile: Option<Arc<BaseProfileLocator>>,
    ) -> Self {
        Self {
            ctx: Arc::new(RegistryContext::new(backend, artifacts, base_profile)),
            families: Mutex::new(None),
        }
    }

    pub fn address(&self) -> &RegistryAddress {
        self.ctx.address()
    }

    pub fn kind(&self) -> BackendKind {
        self.ctx.backend.kind()
    }

    /// Shared artifact cache this registry stores payloads in
    pub fn artifact_cache(&self) -> &Arc<ArtifactCache> {
        &self.ctx.artifacts
    }

    fn with_families<R>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, Arc<Family>>) -> RegistryResult<R>,
    ) -> RegistryResult<R> {
        let mut slot = self.families.lock();
        if slot.is_none() {
            let records = self.ctx.backend.list_families()?;
            debug!("Found {} families in {}", records.len(), self.address());
            *slot = Some(
                records
                    .into_iter()
                    .map(|r| (r.name.clone(), Arc::new(Family::new(Arc::clone(&self.ctx), r))))
                    .collect(),
            );
        }
        f(slot.get_or_insert_with(BTreeMap::new))
    }

    /// All families, ordered by name
    pub fn families(&self) -> RegistryResult<Vec<Arc<Family>>> {
        self.with_families(|families| Ok(families.values().cloned().collect()))
    }

    pub fn family_names(&self) -> RegistryResult<Vec<String>> {
        self.with_families(|families| Ok(families.keys().cloned().collect()))
    }

    pub fn get_family(&self, name: &str) -> RegistryResult<Arc<Family>> {
        self.with_families(|families| {
            families
                .get(name)
                .cloned()
                .ok_or_else(|| RegistryError::not_found("Family", name))
        })
    }

    /// Profiles available to families of this registry
    pub fn profiles(&self) -> Vec<Arc<Profile>> {
        self.ctx.profiles()
    }

    pub fn licenses(&self) -> RegistryResult<Vec<License>> {
        self.ctx.backend.licenses()
    }

    pub fn license(&self, name: &str) -> RegistryResult<License> {
        self.licenses()?
            .into_iter()
            .find(|l| l.name == name)
            .ok_or_else(|| RegistryError::UnknownLicense(name.to_string()))
    }

    /// Create an empty family governed by the named profile
    pub fn create_family(
        &self,
        name: &str,
        profile: Option<&str>,
        description: &str,
    ) -> RegistryResult<Arc<Family>> {
        self.with_families(|families| {
            if families.contains_key(name) {
                return Err(RegistryError::FamilyAlreadyExists(name.to_string()));
            }
            let record = self.ctx.backend.create_family(name, profile, description)?;
            let family = Arc::new(Family::new(Arc::clone(&self.ctx), record));
            families.insert(name.to_string(), Arc::clone(&family));
            info!("Created family {} in {}", name, self.address());
            Ok(family)
        })
    }

    /// Delete a family with all its components
    pub fn remove_family(&self, name: &str) -> RegistryResult<()> {
        self.with_families(|families| {
            let family = families
                .get(name)
                .cloned()
                .ok_or_else(|| RegistryError::not_found("Family", name))?;
            self.ctx.backend.delete_family(family.record())?;
            families.remove(name);
            self.ctx
                .artifacts
                .reclaim_family(self.address().as_str(), family.id());
            info!("Removed family {} from {}", name, self.address());
            Ok(())
        })
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("address", self.address())
            .field("kind", &self.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::backend::memory::MemoryBackend;
    use crate::registry::backend::Retention;
    use std::sync::Barrier;
    use std::thread;

    fn registry() -> (Arc<MemoryBackend>, Registry) {
        let backend = Arc::new(MemoryBackend::new("/reg", Retention::Cached));
        backend.add_family("text", Some("text"));
        backend.add_family("images", None);
        let registry = Registry::new(
            backend.clone(),
            Arc::new(ArtifactCache::new(1024, 8)),
            None,
        );
        (backend, registry)
    }

    #[test]
    fn family_lookup_scans_once() {
        let (backend, registry) = registry();
        let first = registry.get_family("text").unwrap();
        let second = registry.get_family("text").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(MemoryBackend::count(&backend.family_scans), 1);
        assert_eq!(registry.family_names().unwrap(), vec!["images", "text"]);
        assert_eq!(MemoryBackend::count(&backend.family_scans), 1);
    }

    #[test]
    fn missing_family_is_not_found() {
        let (_backend, registry) = registry();
        assert!(matches!(
            registry.get_family("audio"),
            Err(RegistryError::NotFound { kind: "Family", .. })
        ));
    }

    #[test]
    fn family_profile_is_resolved_by_name() {
        let (_backend, registry) = registry();
        let family = registry.get_family("text").unwrap();
        assert_eq!(family.profile().unwrap().name(), "text");
        assert!(registry.get_family("images").unwrap().profile().is_none());
    }

    #[test]
    fn unsupported_family_creation_leaves_map_unchanged() {
        let (_backend, registry) = registry();
        assert!(matches!(
            registry.create_family("audio", None, ""),
            Err(RegistryError::Unsupported { .. })
        ));
        assert!(matches!(
            registry.create_family("text", None, ""),
            Err(RegistryError::FamilyAlreadyExists(_))
        ));
        assert_eq!(registry.families().unwrap().len(), 2);
    }

    #[test]
    fn concurrent_family_lookup_scans_once() {
        let (backend, registry) = registry();
        let registry = Arc::new(registry);
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    registry.get_family("text").unwrap()
                })
            })
            .collect();

        let families: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(families.iter().all(|f| Arc::ptr_eq(f, &families[0])));
        assert_eq!(MemoryBackend::count(&backend.family_scans), 1);
    }
}
