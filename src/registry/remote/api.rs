//! JSON bodies exchanged with a remote registry

use crate::registry::backend::{ComponentRecord, FamilyRecord, ProfileRef, VersionRecord};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Elements requested per call
pub const FAMILY_ELEMENTS: &str = "id,title,description,profile";
pub const COMPONENT_ELEMENTS: &str = "title,description";
pub const PROFILE_ELEMENTS: &str = "id,name,content-uri";
pub const VERSIONS_ELEMENT: &str = "versions";
pub const CONTENT_URI_ELEMENT: &str = "content-uri";
pub const PUBLISH_ELEMENTS: &str = "license-type,permissions";

#[derive(Debug, Clone, Deserialize)]
pub struct FamilyDescription {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub profile: Option<String>,
}

impl FamilyDescription {
    pub fn into_record(self) -> FamilyRecord {
        FamilyRecord {
            id: self.id.trim().to_string(),
            name: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            profile: self
                .profile
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .map(ProfileRef::Id),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComponentDescription {
    pub id: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl ComponentDescription {
    pub fn into_record(self, family_id: &str) -> ComponentRecord {
        let title = self.title.trim().to_string();
        ComponentRecord {
            id: self.id.trim().to_string(),
            family_id: family_id.to_string(),
            name: title.clone(),
            title,
            description: self.description.trim().to_string(),
            resource: self.resource.or(self.uri),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileDescription {
    pub id: String,
    pub name: String,
    #[serde(rename = "content-uri", alias = "content_uri")]
    pub content_uri: String,
}

/// One entry of a component's permission list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Permission {
    pub category: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// Answer to `GET /components/<id>?elements=...`; only requested
/// elements are present
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComponentElements {
    #[serde(default)]
    pub id: Option<String>,

    /// Kept untyped so one bad entry does not discard the listing
    #[serde(default)]
    pub versions: Option<Vec<Value>>,

    #[serde(default, rename = "content-uri", alias = "content_uri")]
    pub content_uri: Option<String>,

    #[serde(default, rename = "license-type", alias = "license_type")]
    pub license_type: Option<String>,

    #[serde(default)]
    pub permissions: Option<Vec<Permission>>,
}

impl ComponentElements {
    /// Well-formed version entries, in listing order
    pub fn version_records(&self, component: &str) -> Vec<VersionRecord> {
        self.versions
            .iter()
            .flatten()
            .filter_map(|entry| match parse_version_entry(entry) {
                Some(record) => Some(record),
                None => {
                    warn!("Skipping malformed version entry of {}: {}", component, entry);
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVersionResponse {
    pub version: u32,
    #[serde(default)]
    pub description: String,
}

impl From<NewVersionResponse> for VersionRecord {
    fn from(response: NewVersionResponse) -> Self {
        VersionRecord {
            number: response.version,
            description: response.description,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewComponentResponse {
    pub component: ComponentDescription,
    pub version: NewVersionResponse,
}

/// `{"version": n, "description": "..."}` with `n > 0`
fn parse_version_entry(entry: &Value) -> Option<VersionRecord> {
    let number = entry.get("version")?.as_u64()?;
    let number = u32::try_from(number).ok().filter(|n| *n > 0)?;
    let description = entry
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();
    Some(VersionRecord {
        number,
        description,
    })
}
