//! Filesystem registry backend
//!
//! Layout under the registry root:
//!
//! ```text
//! <root>/
//!   <name>.profile.json       profile documents
//!   <family>/
//!     profile                 name of the family's profile
//!     description
//!     <component>/
//!       description
//!       <n>/
//!         workflow.bundle     version payload
//!         description         revision comment
//! ```

use crate::address::RegistryAddress;
use crate::bundle::Bundle;
use crate::error::{RegistryError, RegistryResult};
use crate::profile::Profile;
use crate::registry::backend::{
    ArtifactLocation, BackendFactory, BackendKind, ComponentRecord, FamilyRecord, ProfileRef,
    PublishOptions, RegistryBackend, Retention, VersionRecord, INITIAL_VERSION_COMMENT,
};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// File holding a version's payload
pub const BUNDLE_FILE: &str = "workflow.bundle";

const DESCRIPTION_FILE: &str = "description";
const PROFILE_FILE: &str = "profile";
const PROFILE_SUFFIX: &str = ".profile.json";

/// Backend for registries stored in a local directory tree
pub struct LocalBackend {
    address: RegistryAddress,
    root: PathBuf,
}

impl LocalBackend {
    /// Open the registry rooted at `root`, creating the directory if needed
    pub fn open(address: RegistryAddress, root: PathBuf) -> RegistryResult<Self> {
        if root.exists() && !root.is_dir() {
            return Err(RegistryError::unavailable(
                address.as_str(),
                format!("{} is not a directory", root.display()),
            ));
        }
        fs::create_dir_all(&root)
            .map_err(|e| RegistryError::io(format!("creating registry {}", root.display()), e))?;
        Ok(Self { address, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn family_dir(&self, family: &FamilyRecord) -> PathBuf {
        self.root.join(&family.id)
    }

    fn component_dir(&self, component: &ComponentRecord) -> PathBuf {
        self.root.join(&component.family_id).join(&component.name)
    }

    fn version_numbers(&self, dir: &Path) -> Vec<u32> {
        subdirectories(dir)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(name, _)| match name.parse::<u32>() {
                Ok(n) if n > 0 => Some(n),
                _ => {
                    warn!("Ignoring non-version entry {} in {}", name, dir.display());
                    None
                }
            })
            .collect()
    }

    fn write_version(&self, dir: &Path, bundle: &Bundle, comment: &str) -> RegistryResult<()> {
        fs::create_dir(dir)
            .map_err(|e| RegistryError::io(format!("creating {}", dir.display()), e))?;
        bundle.write_to(&dir.join(BUNDLE_FILE))?;
        write_text(&dir.join(DESCRIPTION_FILE), comment)
    }
}

impl RegistryBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn address(&self) -> &RegistryAddress {
        &self.address
    }

    fn list_families(&self) -> RegistryResult<Vec<FamilyRecord>> {
        Ok(subdirectories(&self.root)?
            .into_iter()
            .map(|(name, path)| FamilyRecord {
                id: name.clone(),
                name,
                description: read_optional(&path.join(DESCRIPTION_FILE)),
                profile: None,
            })
            .collect())
    }

    fn list_profiles(&self) -> RegistryResult<Vec<Profile>> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| RegistryError::io(format!("reading {}", self.root.display()), e))?;

        let mut profiles = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let is_profile = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(PROFILE_SUFFIX) && !n.starts_with('.'));
            if !is_profile || !path.is_file() {
                continue;
            }
            match Profile::from_file(&path) {
                Ok(profile) => profiles.push(profile),
                Err(e) => warn!("Skipping unreadable profile {}: {}", path.display(), e),
            }
        }
        profiles.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(profiles)
    }

    fn family_profile(&self, family: &FamilyRecord) -> RegistryResult<Option<ProfileRef>> {
        let path = self.family_dir(family).join(PROFILE_FILE);
        match fs::read_to_string(&path) {
            Ok(content) => {
                let name = content.trim();
                Ok((!name.is_empty()).then(|| ProfileRef::Name(name.to_string())))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RegistryError::io(format!("reading {}", path.display()), e)),
        }
    }

    fn list_components(&self, family: &FamilyRecord) -> RegistryResult<Vec<ComponentRecord>> {
        Ok(subdirectories(&self.family_dir(family))?
            .into_iter()
            .map(|(name, path)| ComponentRecord {
                id: format!("{}/{}", family.id, name),
                family_id: family.id.clone(),
                title: name.clone(),
                description: read_optional(&path.join(DESCRIPTION_FILE)),
                resource: Some(path.display().to_string()),
                name,
            })
            .collect())
    }

    fn list_versions(&self, component: &ComponentRecord) -> Vec<VersionRecord> {
        let dir = self.component_dir(component);
        self.version_numbers(&dir)
            .into_iter()
            .map(|number| VersionRecord {
                number,
                description: read_optional(&dir.join(number.to_string()).join(DESCRIPTION_FILE)),
            })
            .collect()
    }

    fn artifact_location(
        &self,
        component: &ComponentRecord,
        version: u32,
    ) -> RegistryResult<ArtifactLocation> {
        Ok(ArtifactLocation::File(
            self.component_dir(component)
                .join(version.to_string())
                .join(BUNDLE_FILE),
        ))
    }

    fn fetch_artifact(&self, location: &ArtifactLocation, _version: u32) -> RegistryResult<Bundle> {
        match location {
            ArtifactLocation::File(path) => Bundle::read_from(path),
            ArtifactLocation::Uri(uri) => Err(RegistryError::User(format!(
                "local registry cannot load {}",
                uri
            ))),
        }
    }

    fn create_component(
        &self,
        family: &FamilyRecord,
        name: &str,
        description: &str,
        bundle: &Bundle,
        _options: &PublishOptions,
    ) -> RegistryResult<(ComponentRecord, VersionRecord)> {
        validate_name("Component", name)?;
        let dir = self.family_dir(family).join(name);
        fs::create_dir(&dir).map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => RegistryError::ComponentAlreadyExists(name.to_string()),
            _ => RegistryError::io(format!("creating {}", dir.display()), e),
        })?;
        write_text(&dir.join(DESCRIPTION_FILE), description)?;

        let component = ComponentRecord {
            id: format!("{}/{}", family.id, name),
            family_id: family.id.clone(),
            name: name.to_string(),
            title: name.to_string(),
            description: description.to_string(),
            resource: Some(dir.display().to_string()),
        };
        let version = self.add_version(&component, bundle, INITIAL_VERSION_COMMENT)?;
        info!("Created component directory {}", dir.display());
        Ok((component, version))
    }

    fn add_version(
        &self,
        component: &ComponentRecord,
        bundle: &Bundle,
        comment: &str,
    ) -> RegistryResult<VersionRecord> {
        let dir = self.component_dir(component);
        let number = self.version_numbers(&dir).into_iter().max().unwrap_or(0) + 1;
        self.write_version(&dir.join(number.to_string()), bundle, comment)?;
        debug!("Wrote version {} of {}", number, component.id);
        Ok(VersionRecord {
            number,
            description: comment.to_string(),
        })
    }

    fn delete_component(
        &self,
        _family: &FamilyRecord,
        component: &ComponentRecord,
    ) -> RegistryResult<()> {
        let dir = self.component_dir(component);
        fs::remove_dir_all(&dir)
            .map_err(|e| RegistryError::io(format!("deleting {}", dir.display()), e))
    }

    fn new_artifact_retention(&self) -> Retention {
        Retention::Pinned
    }

    fn create_family(
        &self,
        name: &str,
        profile: Option<&str>,
        description: &str,
    ) -> RegistryResult<FamilyRecord> {
        validate_name("Family", name)?;
        let dir = self.root.join(name);
        fs::create_dir(&dir).map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => RegistryError::FamilyAlreadyExists(name.to_string()),
            _ => RegistryError::io(format!("creating {}", dir.display()), e),
        })?;
        if let Some(profile) = profile {
            write_text(&dir.join(PROFILE_FILE), profile)?;
        }
        write_text(&dir.join(DESCRIPTION_FILE), description)?;

        Ok(FamilyRecord {
            id: name.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            profile: None,
        })
    }

    fn delete_family(&self, family: &FamilyRecord) -> RegistryResult<()> {
        let dir = self.family_dir(family);
        fs::remove_dir_all(&dir)
            .map_err(|e| RegistryError::io(format!("deleting {}", dir.display()), e))
    }
}

/// Opens `file://` and plain-path registries
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalBackendFactory;

impl BackendFactory for LocalBackendFactory {
    fn open(&self, address: &RegistryAddress) -> RegistryResult<Arc<dyn RegistryBackend>> {
        let root = address.to_local_path().ok_or_else(|| {
            RegistryError::unavailable(address.as_str(), "not a filesystem address")
        })?;
        Ok(Arc::new(LocalBackend::open(address.clone(), root)?))
    }
}

/// Visible subdirectories of `dir`, sorted by name
fn subdirectories(dir: &Path) -> RegistryResult<Vec<(String, PathBuf)>> {
    let entries =
        fs::read_dir(dir).map_err(|e| RegistryError::io(format!("reading {}", dir.display()), e))?;

    let mut dirs: Vec<(String, PathBuf)> = entries
        .flatten()
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            (!name.starts_with('.')).then(|| (name, entry.path()))
        })
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn read_optional(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content.trim().to_string(),
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            String::new()
        }
    }
}

fn write_text(path: &Path, content: &str) -> RegistryResult<()> {
    fs::write(path, content)
        .map_err(|e| RegistryError::io(format!("writing {}", path.display()), e))
}

/// Names become directory names, so keep them to one safe path segment
fn validate_name(kind: &str, name: &str) -> RegistryResult<()> {
    if name.is_empty() {
        return Err(RegistryError::User(format!("{} name cannot be empty", kind)));
    }
    if name.starts_with('.') {
        return Err(RegistryError::User(format!(
            "Invalid {} name '{}': must not start with '.'",
            kind.to_lowercase(),
            name
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(RegistryError::User(format!(
            "Invalid {} name '{}': must contain only alphanumeric characters, dots, hyphens, or underscores",
            kind.to_lowercase(),
            name
        )));
    }
    Ok(())
}
