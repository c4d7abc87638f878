//! Component profiles
//!
//! A profile is a schema/policy document shared by every family that names
//! it. The registry only reads the identifying fields and hands the rest to
//! whoever turns component versions into runnable activities.

pub mod locator;

pub use locator::{
    parse_http_timestamp, BaseProfileLocator, BASE_PROFILE_FILE, DEFAULT_BASE_PROFILE_URI,
};

use crate::error::{RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parsed profile document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDocument {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Id of the profile this one refines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    #[serde(default)]
    pub ontologies: Vec<Ontology>,

    #[serde(
        default,
        rename = "exceptionHandling",
        skip_serializing_if = "Option::is_none"
    )]
    pub exception_handling: Option<ExceptionHandling>,
}

/// Ontology referenced by semantic annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ontology {
    pub id: String,
    pub uri: String,
}

/// Exception handling policy for components of a family
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExceptionHandling {
    /// Whether a failure inside a list fails the whole list
    #[serde(default, rename = "failLists")]
    pub fail_lists: bool,

    #[serde(default)]
    pub handlers: Vec<HandleException>,
}

/// One exception rewrite rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandleException {
    pub pattern: String,

    #[serde(default, rename = "pruneStack")]
    pub prune_stack: bool,

    #[serde(default, rename = "replaceWith", skip_serializing_if = "Option::is_none")]
    pub replace_with: Option<String>,
}

/// A loaded profile: the parsed document plus its source text
#[derive(Debug, Clone)]
pub struct Profile {
    document: ProfileDocument,
    source: String,
}

impl Profile {
    /// Parse a profile from its serialized form
    pub fn parse(source: &str) -> RegistryResult<Self> {
        let document: ProfileDocument = serde_json::from_str(source)?;
        Ok(Self {
            document,
            source: source.to_string(),
        })
    }

    /// Load a profile from a file
    pub fn from_file(path: &Path) -> RegistryResult<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::io(format!("reading profile {}", path.display()), e))?;
        Self::parse(&source)
    }

    pub fn id(&self) -> &str {
        &self.document.id
    }

    pub fn name(&self) -> &str {
        &self.document.name
    }

    pub fn description(&self) -> &str {
        &self.document.description
    }

    pub fn document(&self) -> &ProfileDocument {
        &self.document
    }

    pub fn exception_handling(&self) -> Option<&ExceptionHandling> {
        self.document.exception_handling.as_ref()
    }

    /// Serialized form, exactly as loaded
    pub fn source(&self) -> &str {
        &self.source
    }
}
