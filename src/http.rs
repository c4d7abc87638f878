//! Blocking HTTP transport
//!
//! Everything network-facing goes through the `HttpClient` trait so the
//! remote backend and the profile locator can be driven without a server.
//! `UreqClient` is the production implementation.

use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Header carrying the remote modification time
pub const LAST_MODIFIED: &str = "last-modified";

/// Transport-level failure (no HTTP status was obtained)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Failed(String),
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Timeout(_) => Self::Timeout,
            other => Self::Failed(other.to_string()),
        }
    }
}

/// Response with the parts the registry cares about
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub last_modified: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Response with the given status and no body
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// 200 response carrying `body`
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            last_modified: None,
            body: body.into(),
        }
    }

    /// Attach a `Last-Modified` header value
    pub fn last_modified(mut self, value: impl Into<String>) -> Self {
        self.last_modified = Some(value.into());
        self
    }

    /// 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Blocking HTTP client with a bounded timeout per request
pub trait HttpClient: Send + Sync {
    /// Issue a body-less request, keeping status and headers
    fn head(&self, url: &str) -> Result<HttpResponse, TransportError>;

    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, TransportError>;

    fn post(
        &self,
        url: &str,
        query: &[(&str, &str)],
        body: &[u8],
    ) -> Result<HttpResponse, TransportError>;

    fn delete(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// `HttpClient` backed by a `ureq` agent
pub struct UreqClient {
    agent: ureq::Agent,
    authorization: Option<String>,
}

impl UreqClient {
    /// Create a client whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        Self {
            agent: ureq::Agent::new_with_config(config),
            authorization: None,
        }
    }

    /// Send `token` as a bearer credential on every request
    pub fn with_token(mut self, token: Option<&str>) -> Self {
        self.authorization = token.map(|t| format!("Bearer {}", t));
        self
    }

    fn prepare<B>(
        &self,
        mut request: ureq::RequestBuilder<B>,
        query: &[(&str, &str)],
    ) -> ureq::RequestBuilder<B> {
        for (key, value) in query {
            request = request.query(*key, *value);
        }
        if let Some(ref auth) = self.authorization {
            request = request.header("Authorization", auth.as_str());
        }
        request
    }

    fn finish(
        result: Result<ureq::http::Response<ureq::Body>, ureq::Error>,
        read_body: bool,
    ) -> Result<HttpResponse, TransportError> {
        let mut response = result?;
        let status = response.status().as_u16();
        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = if read_body {
            response
                .body_mut()
                .with_config()
                .limit(u64::MAX)
                .read_to_vec()?
        } else {
            Vec::new()
        };

        Ok(HttpResponse {
            status,
            last_modified,
            body,
        })
    }
}

impl HttpClient for UreqClient {
    fn head(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let request = self.prepare(self.agent.head(url), &[]);
        Self::finish(request.call(), false)
    }

    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        let request = self.prepare(self.agent.get(url), query);
        Self::finish(request.call(), true)
    }

    fn post(
        &self,
        url: &str,
        query: &[(&str, &str)],
        body: &[u8],
    ) -> Result<HttpResponse, TransportError> {
        let request = self
            .prepare(self.agent.post(url), query)
            .header("Content-Type", "application/octet-stream");
        Self::finish(request.send(body), true)
    }

    fn delete(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let request = self.prepare(self.agent.delete(url), &[]);
        Self::finish(request.call(), false)
    }
}

/// Scripted in-memory `HttpClient` for tests
#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    type Reply = Result<HttpResponse, TransportError>;

    /// Routes are keyed by method and URL with the query appended in call order
    #[derive(Default)]
    pub struct FakeHttp {
        routes: Mutex<HashMap<(String, String), Reply>>,
        calls: Mutex<Vec<(String, String)>>,
    }

    pub fn route(url: &str, query: &[(&str, &str)]) -> String {
        if query.is_empty() {
            return url.to_string();
        }
        let pairs: Vec<String> = query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        format!("{}?{}", url, pairs.join("&"))
    }

    impl FakeHttp {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn on(&self, method: &str, url: &str, reply: Reply) {
            self.routes
                .lock()
                .insert((method.to_string(), url.to_string()), reply);
        }

        pub fn on_get_json(&self, url: &str, body: serde_json::Value) {
            self.on("GET", url, Ok(HttpResponse::ok(body.to_string())));
        }

        /// Number of calls made for the method and routed URL
        pub fn count(&self, method: &str, url: &str) -> usize {
            self.calls
                .lock()
                .iter()
                .filter(|(m, u)| m == method && u == url)
                .count()
        }

        pub fn total_calls(&self, method: &str) -> usize {
            self.calls.lock().iter().filter(|(m, _)| m == method).count()
        }

        fn reply(&self, method: &str, url: String) -> Reply {
            self.calls.lock().push((method.to_string(), url.clone()));
            self.routes
                .lock()
                .get(&(method.to_string(), url.clone()))
                .cloned()
                .unwrap_or_else(|| Ok(HttpResponse::with_status(404)))
        }
    }

    impl HttpClient for FakeHttp {
        fn head(&self, url: &str) -> Reply {
            self.reply("HEAD", url.to_string())
        }

        fn get(&self, url: &str, query: &[(&str, &str)]) -> Reply {
            self.reply("GET", route(url, query))
        }

        fn post(&self, url: &str, query: &[(&str, &str)], _body: &[u8]) -> Reply {
            self.reply("POST", route(url, query))
        }

        fn delete(&self, url: &str) -> Reply {
            self.reply("DELETE", url.to_string())
        }
    }
}
