use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::config::HostApiConfig;
use crate::error::{parse_error_message, HostApiError};
use crate::events::PushEvent;
use crate::sse::PushStreamParser;
use crate::types::{
    AgentDefinition, MessageWithParts, ProviderCatalog, SessionConfig, SessionRecord,
};
use crate::url;

/// HTTP client for the agent host's session endpoints and push stream.
#[derive(Debug, Clone)]
pub struct HostApiClient {
    http: Client,
    config: HostApiConfig,
}

impl HostApiClient {
    pub fn new(config: HostApiConfig) -> Result<Self, HostApiError> {
        if config.base_url.trim().is_empty() {
            return Err(HostApiError::MissingBaseUrl);
        }

        // No client-wide timeout: it would also cap the push stream. The
        // configured timeout is applied per plain request instead.
        let http = Client::builder().build().map_err(HostApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &HostApiConfig {
        &self.config
    }

    fn base(&self) -> &str {
        &self.config.base_url
    }

    fn request_headers(&self) -> Result<HeaderMap, HostApiError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.config.bearer_token.as_deref() {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| HostApiError::InvalidHeader("bearer token".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }
        for (key, value) in &self.config.extra_headers {
            headers.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| HostApiError::InvalidHeader(format!("key: {key}")))?,
                HeaderValue::from_str(value)
                    .map_err(|_| HostApiError::InvalidHeader(format!("value for {key}")))?,
            );
        }
        Ok(headers)
    }

    async fn expect_success(response: Response) -> Result<Response, HostApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(HostApiError::Status(status, parse_error_message(status, &body)))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, HostApiError> {
        let mut request = self.http.get(url).headers(self.request_headers()?);
        if let Some(timeout) = self.config.request_timeout {
            request = request.timeout(timeout);
        }
        let response = Self::expect_success(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn post_json(&self, url: String, body: Value) -> Result<Response, HostApiError> {
        let mut request = self
            .http
            .post(url)
            .headers(self.request_headers()?)
            .json(&body);
        if let Some(timeout) = self.config.request_timeout {
            request = request.timeout(timeout);
        }
        Self::expect_success(request.send().await?).await
    }

    /// Launches an agent session; the host answers with a `Starting` record.
    pub async fn launch(
        &self,
        agent_id: &str,
        project_dir: &str,
    ) -> Result<SessionRecord, HostApiError> {
        let response = self
            .post_json(
                url::sessions_url(self.base()),
                json!({ "agent": agent_id, "directory": project_dir }),
            )
            .await?;
        Ok(response.json::<SessionRecord>().await?)
    }

    pub async fn stop(&self, session_id: &str) -> Result<(), HostApiError> {
        self.post_json(url::session_stop_url(self.base(), session_id), json!({}))
            .await?;
        Ok(())
    }

    pub async fn sessions(&self) -> Result<Vec<SessionRecord>, HostApiError> {
        self.get_json(url::sessions_url(self.base())).await
    }

    pub async fn agents(&self) -> Result<Vec<AgentDefinition>, HostApiError> {
        self.get_json(url::agents_url(self.base())).await
    }

    /// Full existing history, fetched once before the push channel opens.
    pub async fn messages(
        &self,
        session_id: &str,
        conversation_id: &str,
    ) -> Result<Vec<MessageWithParts>, HostApiError> {
        self.get_json(url::messages_url(self.base(), session_id, conversation_id))
            .await
    }

    pub async fn session_config(&self, session_id: &str) -> Result<SessionConfig, HostApiError> {
        self.get_json(url::session_config_url(self.base(), session_id))
            .await
    }

    pub async fn providers(&self, session_id: &str) -> Result<ProviderCatalog, HostApiError> {
        self.get_json(url::providers_url(self.base(), session_id))
            .await
    }

    /// Fire-and-forget prompt submission. The reply is never read from this
    /// response; it arrives through subsequent `message.*` push events.
    pub async fn prompt(
        &self,
        session_id: &str,
        conversation_id: &str,
        text: &str,
    ) -> Result<(), HostApiError> {
        self.post_json(
            url::prompt_url(self.base(), session_id, conversation_id),
            json!({ "text": text }),
        )
        .await?;
        Ok(())
    }

    /// Reads the per-session push stream, forwarding typed events through
    /// `events` until the stream ends or the receiver is dropped.
    ///
    /// No timeout and no retry: the stream stays open for the lifetime of
    /// `Running`, and reconnection decisions belong to the caller.
    pub async fn stream_events(
        &self,
        session_id: &str,
        events: mpsc::UnboundedSender<PushEvent>,
    ) -> Result<(), HostApiError> {
        let response = self
            .http
            .get(url::event_stream_url(self.base(), session_id))
            .headers(self.request_headers()?)
            .send()
            .await?;
        let response = Self::expect_success(response).await?;

        let mut bytes = response.bytes_stream();
        let mut parser = PushStreamParser::default();
        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(HostApiError::from)?;
            for event in parser.feed(&chunk) {
                if events.send(event).is_err() {
                    // Receiver gone: the channel was closed locally.
                    return Ok(());
                }
            }
        }

        Ok(())
    }
}
