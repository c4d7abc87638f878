//! CLI command implementations

pub mod completions;
pub mod config;
pub mod create;
pub mod delete;
pub mod family;
pub mod fetch;
pub mod list;
pub mod profile;
pub mod show;

pub use completions::execute as completions;
pub use config::execute as config;
pub use create::{add_version, create};
pub use delete::execute as delete;
pub use family::execute as family;
pub use fetch::execute as fetch;
pub use list::{components, families, licenses, versions};
pub use profile::execute as profile;
pub use show::execute as show;

use crate::address::RegistryAddress;
use crate::config::Config;
use crate::error::{RegistryError, RegistryResult};
use crate::registry::{Registry, RegistryResolver};
use std::sync::Arc;

/// Shared state for commands that talk to a registry
pub struct CommandContext {
    resolver: RegistryResolver,
    address: Option<RegistryAddress>,
}

impl CommandContext {
    /// Build the resolver from config; `--registry` wins over the configured default
    pub fn new(config: &Config, registry: Option<&str>) -> Self {
        let address = registry
            .or(config.registry.default_registry.as_deref())
            .map(RegistryAddress::parse);
        Self {
            resolver: RegistryResolver::from_config(config),
            address,
        }
    }

    pub fn resolver(&self) -> &RegistryResolver {
        &self.resolver
    }

    /// The selected registry address
    pub fn address(&self) -> RegistryResult<&RegistryAddress> {
        self.address.as_ref().ok_or_else(|| {
            RegistryError::User(
                "No registry selected. Pass --registry or set registry.default_registry".to_string(),
            )
        })
    }

    /// Resolve the selected registry
    pub fn registry(&self) -> RegistryResult<Arc<Registry>> {
        self.resolver.resolve(self.address()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_overrides_default_registry() {
        let mut config = Config::default();
        config.registry.default_registry = Some("/srv/default".to_string());

        let ctx = CommandContext::new(&config, Some("/srv/other/"));
        assert_eq!(ctx.address().unwrap().as_str(), "/srv/other");

        let ctx = CommandContext::new(&config, None);
        assert_eq!(ctx.address().unwrap().as_str(), "/srv/default");
    }

    #[test]
    fn missing_registry_is_user_error() {
        let ctx = CommandContext::new(&Config::default(), None);
        assert!(matches!(ctx.address(), Err(RegistryError::User(_))));
    }
}
