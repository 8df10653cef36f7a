use std::collections::BTreeMap;
use std::time::Duration;

/// Transport configuration for agent-host requests.
#[derive(Debug, Clone, Default)]
pub struct HostApiConfig {
    /// Base URL of the agent host, e.g. `http://127.0.0.1:4096`.
    pub base_url: String,
    /// Optional bearer token passed to `Authorization`.
    pub bearer_token: Option<String>,
    /// Additional headers merged into every request.
    pub extra_headers: BTreeMap<String, String>,
    /// Optional timeout applied to plain request/response calls. The push
    /// event stream is exempt; it stays open for the lifetime of a running
    /// session.
    pub request_timeout: Option<Duration>,
}

impl HostApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }
}
