//! Licenses and sharing policies of a remote registry

use super::api::Permission;
use serde::{Deserialize, Serialize};
use std::fmt;

/// License a component can be published under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    #[serde(default)]
    pub title: String,
}

/// Who may see a published component
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SharingPolicy {
    #[default]
    Private,
    Public,
    /// Visible to members of one group
    Group { id: String },
}

impl SharingPolicy {
    /// Derive the policy from a component's current permissions.
    ///
    /// Public access wins over group access; no matching entry is private.
    pub fn from_permissions(permissions: &[Permission]) -> Self {
        if permissions.iter().any(|p| p.category == "public") {
            return Self::Public;
        }
        permissions
            .iter()
            .filter(|p| p.category == "group")
            .find_map(|p| p.id.clone())
            .map(|id| Self::Group { id })
            .unwrap_or_default()
    }

    /// Parse the command-line form (`private`, `public`, `group:<id>`)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "private" => Some(Self::Private),
            "public" => Some(Self::Public),
            other => other
                .strip_prefix("group:")
                .filter(|id| !id.is_empty())
                .map(|id| Self::Group { id: id.to_string() }),
        }
    }

    /// Query-parameter form
    pub fn as_param(&self) -> String {
        match self {
            Self::Private => "private".to_string(),
            Self::Public => "public".to_string(),
            Self::Group { id } => format!("group:{}", id),
        }
    }
}

impl fmt::Display for SharingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_param())
    }
}
