//! Component Registry - versioned workflow components
//!
//! Resolves registries of component families, their components and
//! numbered versions from local directories or remote registry services,
//! with a shared memory-bounded artifact cache and a cached base profile.

pub mod address;
pub mod bundle;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod profile;
pub mod registry;
pub mod ui;

pub use error::{RegistryError, RegistryResult};
