//! State shared by every entity of one registry

use crate::address::RegistryAddress;
use crate::profile::{BaseProfileLocator, Profile};
use crate::registry::artifact_cache::ArtifactCache;
use crate::registry::backend::{ProfileRef, RegistryBackend};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::warn;

pub(crate) struct RegistryContext {
    pub backend: Arc<dyn RegistryBackend>,
    pub artifacts: Arc<ArtifactCache>,
    pub base_profile: Option<Arc<BaseProfileLocator>>,
    profiles: OnceCell<Vec<Arc<Profile>>>,
    /// Base profile as seen by this registry, looked up once
    base: OnceCell<Option<Arc<Profile>>>,
}

impl RegistryContext {
    pub fn new(
        backend: Arc<dyn RegistryBackend>,
        artifacts: Arc<ArtifactCache>,
        base_profile: Option<Arc<BaseProfileLocator>>,
    ) -> Self {
        Self {
            backend,
            artifacts,
            base_profile,
            profiles: OnceCell::new(),
            base: OnceCell::new(),
        }
    }

    pub fn address(&self) -> &RegistryAddress {
        self.backend.address()
    }

    /// Profiles published by the registry itself.
    ///
    /// A failed listing is logged and retried on the next call.
    fn listed_profiles(&self) -> &[Arc<Profile>] {
        let listed = self.profiles.get_or_try_init(|| {
            self.backend
                .list_profiles()
                .map(|list| list.into_iter().map(Arc::new).collect())
        });
        match listed {
            Ok(list) => list,
            Err(e) => {
                warn!("Failed to list profiles of {}: {}", self.address(), e);
                &[]
            }
        }
    }

    fn base(&self) -> Option<Arc<Profile>> {
        self.base
            .get_or_init(|| self.base_profile.as_ref().and_then(|l| l.get_profile()))
            .clone()
    }

    /// Registry profiles plus the base profile when it is not among them
    pub fn profiles(&self) -> Vec<Arc<Profile>> {
        let mut profiles = self.listed_profiles().to_vec();
        if let Some(base) = self.base() {
            if !profiles.iter().any(|p| p.id() == base.id()) {
                profiles.push(base);
            }
        }
        profiles
    }

    /// Registry profiles are searched before the base profile is consulted
    pub fn find_profile(&self, reference: &ProfileRef) -> Option<Arc<Profile>> {
        self.listed_profiles()
            .iter()
            .find(|p| reference.matches(p))
            .cloned()
            .or_else(|| self.base().filter(|base| reference.matches(base)))
    }
}
