//! Remote registry backend
//!
//! Talks JSON to an HTTP registry service. Every call asks for the smallest
//! element set it needs; licenses and permissions are read again right
//! before publishing because they may have been changed on the server.

pub mod api;
pub mod policy;

pub use policy::{License, SharingPolicy};

use crate::address::RegistryAddress;
use crate::bundle::Bundle;
use crate::error::{RegistryError, RegistryResult};
use crate::http::{HttpClient, UreqClient};
use crate::profile::Profile;
use crate::registry::backend::{
    ArtifactLocation, BackendFactory, BackendKind, ComponentRecord, FamilyRecord, PublishOptions,
    RegistryBackend, Retention, VersionRecord,
};
use api::{
    ComponentDescription, ComponentElements, FamilyDescription, NewComponentResponse,
    NewVersionResponse, ProfileDescription, COMPONENT_ELEMENTS, CONTENT_URI_ELEMENT,
    FAMILY_ELEMENTS, PROFILE_ELEMENTS, PUBLISH_ELEMENTS, VERSIONS_ELEMENT,
};
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Backend for `http://` and `https://` registries
pub struct RemoteBackend {
    address: RegistryAddress,
    http: Arc<dyn HttpClient>,
    licenses: OnceCell<Vec<License>>,
}

impl RemoteBackend {
    pub fn new(address: RegistryAddress, http: Arc<dyn HttpClient>) -> Self {
        Self {
            address,
            http,
            licenses: OnceCell::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        self.address.join(path)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> RegistryResult<T> {
        debug!("GET {} {:?}", url, query);
        let response = self
            .http
            .get(url, query)
            .map_err(|e| RegistryError::remote(url, e.to_string()))?;
        if !response.is_success() {
            return Err(RegistryError::remote(
                url,
                format!("HTTP status {}", response.status),
            ));
        }
        response
            .json()
            .map_err(|e| RegistryError::remote(url, format!("malformed response: {}", e)))
    }

    fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        body: &[u8],
    ) -> RegistryResult<T> {
        debug!("POST {} {:?} ({} bytes)", url, query, body.len());
        let response = self
            .http
            .post(url, query, body)
            .map_err(|e| RegistryError::remote(url, e.to_string()))?;
        if !response.is_success() {
            return Err(RegistryError::remote(
                url,
                format!("HTTP status {}", response.status),
            ));
        }
        response
            .json()
            .map_err(|e| RegistryError::remote(url, format!("malformed response: {}", e)))
    }

    /// Current state of one component, restricted to `elements`
    fn component_elements(
        &self,
        id: &str,
        version: Option<u32>,
        elements: &str,
    ) -> RegistryResult<ComponentElements> {
        let url = self.url(&format!("components/{}", id));
        match version {
            Some(n) => {
                let n = n.to_string();
                self.get_json(&url, &[("elements", elements), ("version", &n)])
            }
            None => self.get_json(&url, &[("elements", elements)]),
        }
    }

    fn license(&self, name: &str) -> RegistryResult<License> {
        self.licenses()?
            .into_iter()
            .find(|l| l.name == name)
            .ok_or_else(|| RegistryError::UnknownLicense(name.to_string()))
    }

    fn load_profile(&self, description: &ProfileDescription) -> RegistryResult<Profile> {
        let url = &description.content_uri;
        let response = self
            .http
            .get(url, &[])
            .map_err(|e| RegistryError::remote(url, e.to_string()))?;
        if !response.is_success() {
            return Err(RegistryError::remote(
                url,
                format!("HTTP status {}", response.status),
            ));
        }
        let source = String::from_utf8(response.body)
            .map_err(|e| RegistryError::remote(url, e.to_string()))?;
        Profile::parse(&source)
    }
}

impl RegistryBackend for RemoteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    fn address(&self) -> &RegistryAddress {
        &self.address
    }

    fn list_families(&self) -> RegistryResult<Vec<FamilyRecord>> {
        let families: Vec<FamilyDescription> =
            self.get_json(&self.url("families"), &[("elements", FAMILY_ELEMENTS)])?;
        Ok(families.into_iter().map(FamilyDescription::into_record).collect())
    }

    fn list_profiles(&self) -> RegistryResult<Vec<Profile>> {
        let descriptions: Vec<ProfileDescription> =
            self.get_json(&self.url("profiles"), &[("elements", PROFILE_ELEMENTS)])?;

        let mut profiles = Vec::with_capacity(descriptions.len());
        for description in &descriptions {
            match self.load_profile(description) {
                Ok(profile) => profiles.push(profile),
                Err(e) => warn!("Skipping profile {}: {}", description.name, e),
            }
        }
        Ok(profiles)
    }

    fn list_components(&self, family: &FamilyRecord) -> RegistryResult<Vec<ComponentRecord>> {
        let url = self.url(&format!("families/{}/components", family.id));
        let components: Vec<ComponentDescription> =
            self.get_json(&url, &[("elements", COMPONENT_ELEMENTS)])?;
        Ok(components
            .into_iter()
            .map(|c| c.into_record(&family.id))
            .collect())
    }

    fn list_versions(&self, component: &ComponentRecord) -> Vec<VersionRecord> {
        match self.component_elements(&component.id, None, VERSIONS_ELEMENT) {
            Ok(elements) => elements.version_records(&component.id),
            Err(e) => {
                warn!("Failed to retrieve version list of {}: {}", component.id, e);
                Vec::new()
            }
        }
    }

    fn artifact_location(
        &self,
        component: &ComponentRecord,
        version: u32,
    ) -> RegistryResult<ArtifactLocation> {
        let elements =
            self.component_elements(&component.id, Some(version), CONTENT_URI_ELEMENT)?;
        elements
            .content_uri
            .map(|uri| ArtifactLocation::Uri(uri.trim().to_string()))
            .ok_or_else(|| {
                RegistryError::remote(
                    self.url(&format!("components/{}", component.id)),
                    "response has no content-uri",
                )
            })
    }

    fn fetch_artifact(&self, location: &ArtifactLocation, version: u32) -> RegistryResult<Bundle> {
        let uri = match location {
            ArtifactLocation::Uri(uri) => uri,
            ArtifactLocation::File(path) => {
                return Err(RegistryError::remote(
                    path.display().to_string(),
                    "remote registries only serve artifacts over HTTP",
                ))
            }
        };

        let n = version.to_string();
        let response = self
            .http
            .get(uri, &[("version", &n)])
            .map_err(|e| RegistryError::remote(uri, e.to_string()))?;
        if !response.is_success() {
            return Err(RegistryError::remote(
                uri,
                format!("HTTP status {}", response.status),
            ));
        }
        Bundle::decode(response.body).map_err(|reason| RegistryError::remote(uri, reason))
    }

    fn create_component(
        &self,
        family: &FamilyRecord,
        name: &str,
        description: &str,
        bundle: &Bundle,
        options: &PublishOptions,
    ) -> RegistryResult<(ComponentRecord, VersionRecord)> {
        let license = options
            .license
            .as_deref()
            .map(|name| self.license(name))
            .transpose()?;
        let sharing = options.sharing.as_param();

        let mut query = vec![("title", name), ("description", description)];
        if let Some(ref license) = license {
            query.push(("license", license.name.as_str()));
        }
        query.push(("sharing", sharing.as_str()));

        let url = self.url(&format!("families/{}/components", family.id));
        let created: NewComponentResponse = self.post_json(&url, &query, bundle.as_bytes())?;
        let component = created.component.into_record(&family.id);
        info!("Created remote component {} ({})", component.name, component.id);
        Ok((component, created.version.into()))
    }

    fn add_version(
        &self,
        component: &ComponentRecord,
        bundle: &Bundle,
        comment: &str,
    ) -> RegistryResult<VersionRecord> {
        let current = self.component_elements(&component.id, None, PUBLISH_ELEMENTS)?;
        let license = current
            .license_type
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| self.license(name))
            .transpose()?;
        let sharing = SharingPolicy::from_permissions(current.permissions.as_deref().unwrap_or(&[]));
        let sharing = sharing.as_param();

        let mut query = vec![("title", component.title.as_str()), ("comment", comment)];
        if let Some(ref license) = license {
            query.push(("license", license.name.as_str()));
        }
        query.push(("sharing", sharing.as_str()));

        let url = self.url(&format!("components/{}/versions", component.id));
        let created: NewVersionResponse = self.post_json(&url, &query, bundle.as_bytes())?;
        Ok(created.into())
    }

    fn delete_component(
        &self,
        _family: &FamilyRecord,
        component: &ComponentRecord,
    ) -> RegistryResult<()> {
        let url = self.url(&format!("components/{}", component.id));
        let response = self
            .http
            .delete(&url)
            .map_err(|e| RegistryError::remote(&url, e.to_string()))?;
        if !response.is_success() {
            return Err(RegistryError::remote(
                &url,
                format!("HTTP status {}", response.status),
            ));
        }
        Ok(())
    }

    fn new_artifact_retention(&self) -> Retention {
        Retention::Cached
    }

    fn licenses(&self) -> RegistryResult<Vec<License>> {
        self.licenses
            .get_or_try_init(|| self.get_json(&self.url("licenses"), &[]))
            .cloned()
    }

    fn help_url(&self, component: &ComponentRecord, version: u32) -> Option<String> {
        Some(format!(
            "{}/workflows/{}/versions/{}.html",
            self.address, component.id, version
        ))
    }
}

/// Opens remote backends, one HTTP client per registry host
pub struct RemoteBackendFactory {
    timeout: Duration,
    tokens: HashMap<String, String>,
    shared: Option<Arc<dyn HttpClient>>,
}

impl RemoteBackendFactory {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            tokens: HashMap::new(),
            shared: None,
        }
    }

    /// Route every backend through one client
    pub fn with_client(http: Arc<dyn HttpClient>) -> Self {
        Self {
            timeout: Duration::ZERO,
            tokens: HashMap::new(),
            shared: Some(http),
        }
    }

    /// Use `token` for requests to `host` (`name` or `name:port`)
    pub fn with_token(mut self, host: impl Into<String>, token: impl Into<String>) -> Self {
        self.tokens.insert(host.into().to_ascii_lowercase(), token.into());
        self
    }

    /// Token for an address; `host:port` wins over a bare host entry
    fn token(&self, address: &RegistryAddress) -> Option<&str> {
        let host = address.host()?;
        address
            .port()
            .and_then(|port| self.tokens.get(&format!("{}:{}", host, port)))
            .or_else(|| self.tokens.get(host))
            .map(String::as_str)
    }

    fn client(&self, address: &RegistryAddress) -> Arc<dyn HttpClient> {
        if let Some(ref http) = self.shared {
            return Arc::clone(http);
        }
        Arc::new(UreqClient::new(self.timeout).with_token(self.token(address)))
    }
}

impl BackendFactory for RemoteBackendFactory {
    fn verify(&self, address: &RegistryAddress) -> RegistryResult<()> {
        let url = address.join("whoami");
        match self.client(address).get(&url, &[]) {
            Ok(response) if response.is_success() => Ok(()),
            Ok(response) => Err(RegistryError::unavailable(
                address.as_str(),
                format!("HTTP status {} from {}", response.status, url),
            )),
            Err(e) => Err(RegistryError::unavailable(address.as_str(), e.to_string())),
        }
    }

    fn open(&self, address: &RegistryAddress) -> RegistryResult<Arc<dyn RegistryBackend>> {
        Ok(Arc::new(RemoteBackend::new(
            address.clone(),
            self.client(address),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::fake::FakeHttp;
    use crate::http::{HttpResponse, TransportError};
    use crate::registry::{ArtifactCache, Registry, VersionSelector};
    use serde_json::json;

    const BASE: &str = "http://registry.example.org/api";

    fn fixture() -> (Arc<FakeHttp>, Arc<Registry>) {
        let fake = Arc::new(FakeHttp::new());
        fake.on_get_json(
            &format!("{}/families?elements={}", BASE, FAMILY_ELEMENTS),
            json!([{"id": "3", "title": "Text", "description": "text tools"}]),
        );
        fake.on_get_json(
            &format!("{}/families/3/components?elements={}", BASE, COMPONENT_ELEMENTS),
            json!([{"id": "17", "title": "tokenize", "description": "splits"}]),
        );
        fake.on_get_json(
            &format!("{}/components/17?elements=versions", BASE),
            json!({"id": "17", "versions": [
                {"version": 1, "description": "first"},
                {"version": "broken"},
                {"version": 2, "description": "second"}
            ]}),
        );
        fake.on_get_json(
            &format!("{}/licenses", BASE),
            json!([{"name": "by-sa", "title": "CC BY-SA"}]),
        );

        let backend = Arc::new(RemoteBackend::new(RegistryAddress::parse(BASE), fake.clone()));
        let registry = Arc::new(Registry::new(
            backend,
            Arc::new(ArtifactCache::new(1 << 20, 16)),
            None,
        ));
        (fake, registry)
    }

    #[test]
    fn malformed_version_is_left_out() {
        let (_fake, registry) = fixture();
        let component = registry
            .get_family("Text")
            .unwrap()
            .get_component("tokenize")
            .unwrap();

        let numbers: Vec<u32> = component.versions().iter().map(|v| v.number()).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn failed_version_listing_is_empty() {
        let (fake, registry) = fixture();
        fake.on(
            "GET",
            &format!("{}/components/17?elements=versions", BASE),
            Err(TransportError::Timeout),
        );
        let component = registry
            .get_family("Text")
            .unwrap()
            .get_component("tokenize")
            .unwrap();
        assert!(component.versions().is_empty());
    }

    #[test]
    fn reclaimed_artifact_is_fetched_again() {
        let (fake, registry) = fixture();
        fake.on_get_json(
            &format!("{}/components/17?elements=content-uri&version=2", BASE),
            json!({"content-uri": "http://registry.example.org/files/17"}),
        );
        let content = "http://registry.example.org/files/17?version=2";
        fake.on("GET", content, Ok(HttpResponse::ok("bundle-v2")));

        let version = registry
            .get_family("Text")
            .unwrap()
            .get_component("tokenize")
            .unwrap()
            .get_version(VersionSelector::Number(2))
            .unwrap();

        let first = version.artifact().unwrap();
        assert_eq!(fake.count("GET", content), 1);

        assert!(registry.artifact_cache().reclaim(&version.artifact_key()));
        let second = version.artifact().unwrap();

        assert_eq!(fake.count("GET", content), 2);
        assert_eq!(first.as_bytes(), second.as_bytes());
        // Location is resolved once per version
        assert_eq!(
            fake.count(
                "GET",
                &format!("{}/components/17?elements=content-uri&version=2", BASE)
            ),
            1
        );
    }

    #[test]
    fn failed_fetch_is_artifact_unavailable() {
        let (fake, registry) = fixture();
        fake.on_get_json(
            &format!("{}/components/17?elements=content-uri&version=1", BASE),
            json!({"content-uri": "http://registry.example.org/files/17"}),
        );
        fake.on(
            "GET",
            "http://registry.example.org/files/17?version=1",
            Ok(HttpResponse::with_status(500)),
        );

        let version = registry
            .get_family("Text")
            .unwrap()
            .get_component("tokenize")
            .unwrap()
            .get_version(VersionSelector::Number(1))
            .unwrap();

        assert!(matches!(
            version.artifact(),
            Err(RegistryError::ArtifactUnavailable { version: 1, .. })
        ));
        assert_eq!(version.description(), "first");
    }

    #[test]
    fn new_version_reads_license_and_permissions_each_time() {
        let (fake, registry) = fixture();
        let publish = format!("{}/components/17?elements={}", BASE, PUBLISH_ELEMENTS);
        fake.on_get_json(
            &publish,
            json!({"license-type": "by-sa", "permissions": [{"category": "group", "id": "5"}]}),
        );
        let post = format!(
            "{}/components/17/versions?title=tokenize&comment=faster&license=by-sa&sharing=group:5",
            BASE
        );
        fake.on(
            "POST",
            &post,
            Ok(HttpResponse::ok(r#"{"version": 3, "description": "faster"}"#)),
        );

        let component = registry
            .get_family("Text")
            .unwrap()
            .get_component("tokenize")
            .unwrap();
        let bundle = Bundle::from_bytes("v3");

        let version = component.add_version(&bundle, "faster").unwrap();
        assert_eq!(version.number(), 3);
        assert_eq!(component.latest_version().unwrap().number(), 3);
        // Retained in the shared cache, served without a download
        assert_eq!(version.artifact().unwrap().as_bytes(), b"v3");

        component.add_version(&bundle, "faster").unwrap();
        assert_eq!(fake.count("GET", &publish), 2);
        assert_eq!(fake.count("POST", &post), 2);
    }

    #[test]
    fn unknown_license_blocks_new_version() {
        let (fake, registry) = fixture();
        fake.on_get_json(
            &format!("{}/components/17?elements={}", BASE, PUBLISH_ELEMENTS),
            json!({"license-type": "proprietary"}),
        );
        let component = registry
            .get_family("Text")
            .unwrap()
            .get_component("tokenize")
            .unwrap();

        let result = component.add_version(&Bundle::from_bytes("x"), "c");
        assert!(matches!(result, Err(RegistryError::UnknownLicense(_))));
        assert_eq!(fake.total_calls("POST"), 0);
    }

    #[test]
    fn help_page_per_version() {
        let (_fake, registry) = fixture();
        let version = registry
            .get_family("Text")
            .unwrap()
            .get_component("tokenize")
            .unwrap()
            .get_version(VersionSelector::Latest)
            .unwrap();
        assert_eq!(
            version.help_url().as_deref(),
            Some("http://registry.example.org/api/workflows/17/versions/2.html")
        );
    }

    #[test]
    fn verify_requires_success_from_whoami() {
        let fake = Arc::new(FakeHttp::new());
        let factory = RemoteBackendFactory::with_client(fake.clone());
        let address = RegistryAddress::parse(BASE);

        assert!(matches!(
            factory.verify(&address),
            Err(RegistryError::RegistryUnavailable { .. })
        ));

        fake.on_get_json(&format!("{}/whoami", BASE), json!({"user": "me"}));
        assert!(factory.verify(&address).is_ok());
    }

    #[test]
    fn tokens_are_matched_by_host_and_port() {
        let factory = RemoteBackendFactory::new(Duration::from_secs(1))
            .with_token("Registry.Example.org", "plain")
            .with_token("registry.example.org:8443", "tls");

        let address = RegistryAddress::parse("https://REGISTRY.example.org/api?tenant=1");
        assert_eq!(factory.token(&address), Some("plain"));
        let address = RegistryAddress::parse("https://registry.example.org:8443/api");
        assert_eq!(factory.token(&address), Some("tls"));
        let address = RegistryAddress::parse("https://mirror.example.org/api");
        assert_eq!(factory.token(&address), None);
    }
}
