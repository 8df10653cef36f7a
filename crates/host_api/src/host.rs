use std::future::Future;

use tokio::sync::mpsc;

use crate::client::HostApiClient;
use crate::error::HostApiError;
use crate::events::PushEvent;
use crate::types::{
    AgentDefinition, MessageWithParts, ProviderCatalog, SessionConfig, SessionRecord,
};

/// Host operations the engine depends on.
///
/// [`HostApiClient`] is the production implementation; tests script one
/// in-process. Every method is a plain request/response except
/// [`AgentHost::open_events`], whose future runs for as long as the push
/// stream is open and is cancelled by aborting the task that drives it.
pub trait AgentHost: Send + Sync + 'static {
    fn launch(
        &self,
        agent_id: &str,
        project_dir: &str,
    ) -> impl Future<Output = Result<SessionRecord, HostApiError>> + Send;

    fn stop(&self, session_id: &str) -> impl Future<Output = Result<(), HostApiError>> + Send;

    fn sessions(&self) -> impl Future<Output = Result<Vec<SessionRecord>, HostApiError>> + Send;

    fn agents(&self) -> impl Future<Output = Result<Vec<AgentDefinition>, HostApiError>> + Send;

    fn messages(
        &self,
        session_id: &str,
        conversation_id: &str,
    ) -> impl Future<Output = Result<Vec<MessageWithParts>, HostApiError>> + Send;

    fn session_config(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<SessionConfig, HostApiError>> + Send;

    fn providers(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<ProviderCatalog, HostApiError>> + Send;

    fn prompt(
        &self,
        session_id: &str,
        conversation_id: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), HostApiError>> + Send;

    fn open_events(
        &self,
        session_id: &str,
        events: mpsc::UnboundedSender<PushEvent>,
    ) -> impl Future<Output = Result<(), HostApiError>> + Send;
}

impl AgentHost for HostApiClient {
    async fn launch(
        &self,
        agent_id: &str,
        project_dir: &str,
    ) -> Result<SessionRecord, HostApiError> {
        HostApiClient::launch(self, agent_id, project_dir).await
    }

    async fn stop(&self, session_id: &str) -> Result<(), HostApiError> {
        HostApiClient::stop(self, session_id).await
    }

    async fn sessions(&self) -> Result<Vec<SessionRecord>, HostApiError> {
        HostApiClient::sessions(self).await
    }

    async fn agents(&self) -> Result<Vec<AgentDefinition>, HostApiError> {
        HostApiClient::agents(self).await
    }

    async fn messages(
        &self,
        session_id: &str,
        conversation_id: &str,
    ) -> Result<Vec<MessageWithParts>, HostApiError> {
        HostApiClient::messages(self, session_id, conversation_id).await
    }

    async fn session_config(&self, session_id: &str) -> Result<SessionConfig, HostApiError> {
        HostApiClient::session_config(self, session_id).await
    }

    async fn providers(&self, session_id: &str) -> Result<ProviderCatalog, HostApiError> {
        HostApiClient::providers(self, session_id).await
    }

    async fn prompt(
        &self,
        session_id: &str,
        conversation_id: &str,
        text: &str,
    ) -> Result<(), HostApiError> {
        HostApiClient::prompt(self, session_id, conversation_id, text).await
    }

    async fn open_events(
        &self,
        session_id: &str,
        events: mpsc::UnboundedSender<PushEvent>,
    ) -> Result<(), HostApiError> {
        self.stream_events(session_id, events).await
    }
}
