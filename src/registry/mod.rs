//! Component registries
//!
//! A registry holds families of versioned components. Lookups walk
//! `Registry` → `Family` → `Component` → `Version`; every level populates
//! its children from the backend once and caches them.

pub mod artifact_cache;
pub mod backend;
pub mod component;
mod context;
pub mod family;
pub mod local;
pub mod remote;
pub mod resolver;
pub mod root;
pub mod version;

pub use artifact_cache::{ArtifactCache, ArtifactKey};
pub use backend::{BackendFactory, BackendKind, PublishOptions, RegistryBackend};
pub use component::{Component, VersionSelector};
pub use family::Family;
pub use local::{LocalBackend, LocalBackendFactory};
pub use remote::{License, RemoteBackend, RemoteBackendFactory, SharingPolicy};
pub use resolver::RegistryResolver;
pub use root::Registry;
pub use version::{Version, VersionId};
