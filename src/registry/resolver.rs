//! Registry resolution
//!
//! Maps registry addresses to live `Registry` instances. The backend is
//! chosen by address scheme: `http`/`https` addresses are served remotely,
//! everything else from the local filesystem.
//!
//! Each address owns a once-cell, so concurrent first lookups of one address
//! construct a single registry while different addresses construct in
//! parallel. Registries are kept for the life of the resolver.

use crate::address::RegistryAddress;
use crate::config::Config;
use crate::error::{RegistryError, RegistryResult};
use crate::http::UreqClient;
use crate::profile::{BaseProfileLocator, Profile};
use crate::registry::artifact_cache::ArtifactCache;
use crate::registry::backend::BackendFactory;
use crate::registry::component::{Component, VersionSelector};
use crate::registry::family::Family;
use crate::registry::local::LocalBackendFactory;
use crate::registry::remote::RemoteBackendFactory;
use crate::registry::root::Registry;
use crate::registry::version::{Version, VersionId};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

type RegistrySlot = Arc<OnceCell<Arc<Registry>>>;

/// Process-wide registry cache and the services registries share
pub struct RegistryResolver {
    local: Arc<dyn BackendFactory>,
    remote: Arc<dyn BackendFactory>,
    artifacts: Arc<ArtifactCache>,
    base_profile: Option<Arc<BaseProfileLocator>>,
    registries: Mutex<HashMap<RegistryAddress, RegistrySlot>>,
}

impl RegistryResolver {
    pub fn new(
        local: Arc<dyn BackendFactory>,
        remote: Arc<dyn BackendFactory>,
        artifacts: Arc<ArtifactCache>,
    ) -> Self {
        Self {
            local,
            remote,
            artifacts,
            base_profile: None,
            registries: Mutex::new(HashMap::new()),
        }
    }

    /// Supply the base profile to every registry's profile set
    pub fn with_base_profile(mut self, locator: Arc<BaseProfileLocator>) -> Self {
        self.base_profile = Some(locator);
        self
    }

    /// Build a resolver with production backends from configuration
    pub fn from_config(config: &Config) -> Self {
        let profile_http = Arc::new(UreqClient::new(Duration::from_secs(
            config.network.profile_timeout_secs,
        )));
        let locator = BaseProfileLocator::new(
            profile_http,
            config.profile.base_profile_uri.clone(),
            &config.profile_cache_dir(),
        );

        let mut remote = RemoteBackendFactory::new(Duration::from_secs(
            config.network.request_timeout_secs,
        ));
        for (host, credential) in &config.credentials {
            remote = remote.with_token(host.clone(), credential.token.clone());
        }

        let artifacts = ArtifactCache::new(
            config.registry.artifact_cache_bytes,
            config.registry.artifact_cache_entries,
        )
        .with_listener(|key, bundle| {
            debug!("Artifact {} released ({} bytes)", key, bundle.len());
        });

        Self::new(
            Arc::new(LocalBackendFactory),
            Arc::new(remote),
            Arc::new(artifacts),
        )
        .with_base_profile(Arc::new(locator))
    }

    /// Get the registry at `address`, creating it on first use
    pub fn resolve(&self, address: &RegistryAddress) -> RegistryResult<Arc<Registry>> {
        let slot = {
            let mut registries = self.registries.lock();
            Arc::clone(registries.entry(address.clone()).or_default())
        };

        slot.get_or_try_init(|| self.construct(address)).map(Arc::clone)
    }

    fn construct(&self, address: &RegistryAddress) -> RegistryResult<Arc<Registry>> {
        let factory = if address.is_remote() {
            self.remote.verify(address).map_err(|e| unavailable(address, e))?;
            &self.remote
        } else {
            &self.local
        };

        let backend = factory.open(address).map_err(|e| unavailable(address, e))?;
        info!("Opened {} registry at {}", backend.kind().name(), address);
        Ok(Arc::new(Registry::new(
            backend,
            Arc::clone(&self.artifacts),
            self.base_profile.clone(),
        )))
    }

    pub fn family(&self, address: &RegistryAddress, name: &str) -> RegistryResult<Arc<Family>> {
        self.resolve(address)?.get_family(name)
    }

    pub fn component(
        &self,
        address: &RegistryAddress,
        family: &str,
        name: &str,
    ) -> RegistryResult<Arc<Component>> {
        self.family(address, family)?.get_component(name)
    }

    pub fn version(&self, id: &VersionId) -> RegistryResult<Arc<Version>> {
        let selector = id
            .version
            .map(VersionSelector::Number)
            .unwrap_or(VersionSelector::Latest);
        self.component(&id.registry_address(), &id.family, &id.component)?
            .get_version(selector)
    }

    /// The shared base profile, if one can be located
    pub fn base_profile(&self) -> Option<Arc<Profile>> {
        self.base_profile.as_ref().and_then(|l| l.get_profile())
    }

    pub fn base_profile_locator(&self) -> Option<&Arc<BaseProfileLocator>> {
        self.base_profile.as_ref()
    }

    pub fn artifact_cache(&self) -> &Arc<ArtifactCache> {
        &self.artifacts
    }

    /// Addresses with a constructed registry
    pub fn resolved_addresses(&self) -> Vec<RegistryAddress> {
        self.registries
            .lock()
            .iter()
            .filter(|(_, slot)| slot.get().is_some())
            .map(|(address, _)| address.clone())
            .collect()
    }
}

fn unavailable(address: &RegistryAddress, err: RegistryError) -> RegistryError {
    match err {
        RegistryError::RegistryUnavailable { .. } => err,
        other => RegistryError::unavailable(address.as_str(), other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::backend::memory::MemoryBackend;
    use crate::registry::backend::{RegistryBackend, Retention};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    #[derive(Default)]
    struct CountingFactory {
        opened: AtomicUsize,
        reject: AtomicBool,
    }

    impl BackendFactory for CountingFactory {
        fn verify(&self, address: &RegistryAddress) -> RegistryResult<()> {
            if self.reject.load(Ordering::SeqCst) {
                return Err(RegistryError::remote(address.join("whoami"), "401"));
            }
            Ok(())
        }

        fn open(&self, address: &RegistryAddress) -> RegistryResult<Arc<dyn RegistryBackend>> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            // Widen the race window
            thread::sleep(Duration::from_millis(20));
            let backend = MemoryBackend::new(address.as_str(), Retention::Cached);
            backend.add_family("text", None);
            Ok(Arc::new(backend))
        }
    }

    fn resolver() -> (Arc<CountingFactory>, Arc<CountingFactory>, Arc<RegistryResolver>) {
        let local = Arc::new(CountingFactory::default());
        let remote = Arc::new(CountingFactory::default());
        let resolver = Arc::new(RegistryResolver::new(
            local.clone(),
            remote.clone(),
            Arc::new(ArtifactCache::new(1024, 8)),
        ));
        (local, remote, resolver)
    }

    #[test]
    fn concurrent_resolution_constructs_once() {
        let (local, _remote, resolver) = resolver();
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    resolver.resolve(&RegistryAddress::parse("/srv/reg/")).unwrap()
                })
            })
            .collect();

        let registries: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(registries.iter().all(|r| Arc::ptr_eq(r, &registries[0])));
        assert_eq!(local.opened.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn scheme_selects_backend() {
        let (local, remote, resolver) = resolver();
        resolver.resolve(&RegistryAddress::parse("/srv/reg")).unwrap();
        resolver
            .resolve(&RegistryAddress::parse("https://registry.example.org"))
            .unwrap();
        resolver
            .resolve(&RegistryAddress::parse("file:///srv/other"))
            .unwrap();

        assert_eq!(local.opened.load(Ordering::SeqCst), 2);
        assert_eq!(remote.opened.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.resolved_addresses().len(), 3);
    }

    #[test]
    fn failed_verification_is_not_cached() {
        let (_local, remote, resolver) = resolver();
        let address = RegistryAddress::parse("http://registry.example.org");
        remote.reject.store(true, Ordering::SeqCst);

        assert!(matches!(
            resolver.resolve(&address),
            Err(RegistryError::RegistryUnavailable { .. })
        ));
        assert_eq!(remote.opened.load(Ordering::SeqCst), 0);

        remote.reject.store(false, Ordering::SeqCst);
        assert!(resolver.resolve(&address).is_ok());
        assert_eq!(remote.opened.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn version_lookup_through_resolver() {
        let (_local, _remote, resolver) = resolver();
        let family = resolver
            .family(&RegistryAddress::parse("/srv/reg"), "text")
            .unwrap();
        family
            .create_component("tokenize", "", &crate::bundle::Bundle::from_bytes("tok"))
            .unwrap();

        let id = VersionId {
            registry: "/srv/reg".to_string(),
            family: "text".to_string(),
            component: "tokenize".to_string(),
            version: None,
        };
        let version = resolver.version(&id).unwrap();
        assert_eq!(version.number(), 1);
        assert_eq!(version.id().version, Some(1));
    }
}
