//! Component families

use crate::bundle::Bundle;
use crate::error::{RegistryError, RegistryResult};
use crate::profile::Profile;
use crate::registry::backend::{FamilyRecord, PublishOptions};
use crate::registry::component::Component;
use crate::registry::context::RegistryContext;
use crate::registry::version::Version;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A named group of components sharing one profile
///
/// The component map is scanned from the backend on first use and never
/// again; afterwards only mutations made through this family change it.
pub struct Family {
    ctx: Arc<RegistryContext>,
    record: FamilyRecord,
    components: Mutex<Option<BTreeMap<String, Arc<Component>>>>,
    profile: OnceCell<Arc<Profile>>,
}

impl Family {
    pub(crate) fn new(ctx: Arc<RegistryContext>, record: FamilyRecord) -> Self {
        Self {
            ctx,
            record,
            components: Mutex::new(None),
            profile: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Backend identity of the family
    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn description(&self) -> &str {
        &self.record.description
    }

    pub(crate) fn record(&self) -> &FamilyRecord {
        &self.record
    }

    /// The profile governing this family, if it can be found.
    ///
    /// Lookup failures are logged and reported as no profile; a later call
    /// tries again.
    pub fn profile(&self) -> Option<Arc<Profile>> {
        if let Some(profile) = self.profile.get() {
            return Some(Arc::clone(profile));
        }

        let reference = match self.ctx.backend.family_profile(&self.record) {
            Ok(Some(reference)) => reference,
            Ok(None) => {
                debug!("Family {} names no profile", self.name());
                return None;
            }
            Err(e) => {
                warn!("Failed to read profile of family {}: {}", self.name(), e);
                return None;
            }
        };

        match self.ctx.find_profile(&reference) {
            Some(profile) => Some(Arc::clone(self.profile.get_or_init(|| profile))),
            None => {
                warn!(
                    "Family {} refers to unknown profile {:?}",
                    self.name(),
                    reference
                );
                None
            }
        }
    }

    fn with_components<R>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, Arc<Component>>) -> RegistryResult<R>,
    ) -> RegistryResult<R> {
        let mut slot = self.components.lock();
        if slot.is_none() {
            let records = self.ctx.backend.list_components(&self.record)?;
            debug!("Found {} components in family {}", records.len(), self.name());
            *slot = Some(
                records
                    .into_iter()
                    .map(|r| {
                        (
                            r.name.clone(),
                            Arc::new(Component::new(Arc::clone(&self.ctx), self.name(), r)),
                        )
                    })
                    .collect(),
            );
        }
        f(slot.get_or_insert_with(BTreeMap::new))
    }

    /// All components, ordered by name
    pub fn components(&self) -> RegistryResult<Vec<Arc<Component>>> {
        self.with_components(|components| Ok(components.values().cloned().collect()))
    }

    pub fn component_names(&self) -> RegistryResult<Vec<String>> {
        self.with_components(|components| Ok(components.keys().cloned().collect()))
    }

    pub fn get_component(&self, name: &str) -> RegistryResult<Arc<Component>> {
        self.with_components(|components| {
            components.get(name).cloned().ok_or_else(|| {
                RegistryError::not_found("Component", format!("{}/{}", self.name(), name))
            })
        })
    }

    /// Publish a new component and return its first version
    pub fn create_component(
        &self,
        name: &str,
        description: &str,
        bundle: &Bundle,
    ) -> RegistryResult<Arc<Version>> {
        self.create_component_with(name, description, bundle, &PublishOptions::default())
    }

    /// Publish a new component with explicit license and sharing policy
    pub fn create_component_with(
        &self,
        name: &str,
        description: &str,
        bundle: &Bundle,
        options: &PublishOptions,
    ) -> RegistryResult<Arc<Version>> {
        self.with_components(|components| {
            if components.contains_key(name) {
                return Err(RegistryError::ComponentAlreadyExists(name.to_string()));
            }

            let (record, first) = self.ctx.backend.create_component(
                &self.record,
                name,
                description,
                bundle,
                options,
            )?;
            let component = Arc::new(Component::new(Arc::clone(&self.ctx), self.name(), record));
            let version = component.adopt(first, bundle);
            components.insert(component.name().to_string(), component);

            info!("Created component {} in family {}", name, self.name());
            Ok(version)
        })
    }

    /// Delete a component with all of its versions
    pub fn remove_component(&self, name: &str) -> RegistryResult<()> {
        self.with_components(|components| {
            let component = components.get(name).cloned().ok_or_else(|| {
                RegistryError::not_found("Component", format!("{}/{}", self.name(), name))
            })?;

            self.ctx
                .backend
                .delete_component(&self.record, component.record())?;
            components.remove(name);
            self.ctx
                .artifacts
                .reclaim_component(self.ctx.address().as_str(), component.id());

            info!("Removed component {} from family {}", name, self.name());
            Ok(())
        })
    }
}

impl std::fmt::Debug for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Family")
            .field("registry", self.ctx.address())
            .field("name", &self.record.name)
            .finish()
    }
}
