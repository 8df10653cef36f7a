//! Scripted in-process host used by the integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{mpsc, Notify};

use agent_console::controller::SessionController;
use agent_console::host_api::error::HostApiError;
use agent_console::host_api::events::PushEvent;
use agent_console::host_api::host::AgentHost;
use agent_console::host_api::types::{
    AgentDefinition, MessageWithParts, ProviderCatalog, SessionConfig, SessionRecord,
    SessionStatus,
};

#[derive(Default)]
pub struct MockHostState {
    /// Scripted `sessions` responses, consumed front to back; once drained,
    /// every further poll sees `steady_sessions`.
    pub sessions_responses: VecDeque<Result<Vec<SessionRecord>, String>>,
    pub steady_sessions: Vec<SessionRecord>,
    pub sessions_calls: usize,

    pub launch_record: Option<SessionRecord>,
    pub history: Vec<MessageWithParts>,
    pub history_error: Option<String>,
    /// When set, `messages` parks on this gate after recording the request,
    /// so a test can interleave other work with an in-flight history pull.
    pub history_gate: Option<Arc<Notify>>,
    /// Events pushed on every stream open, in order. The stream then stays
    /// open until the driving task is aborted.
    pub scripted_events: Vec<PushEvent>,
    pub agents: Vec<AgentDefinition>,
    pub agents_calls: usize,
    pub config: Option<SessionConfig>,
    pub catalog: Option<ProviderCatalog>,
    pub prompt_error: Option<String>,

    pub stopped: Vec<String>,
    pub prompts: Vec<(String, String, String)>,
    pub history_requests: Vec<(String, String)>,
    pub opened_streams: Vec<String>,
    /// One sender per opened stream, kept so tests can inject frames that
    /// were "in flight" when a channel closed.
    pub event_senders: Vec<mpsc::UnboundedSender<PushEvent>>,
}

pub struct MockHost {
    state: Mutex<MockHostState>,
}

impl MockHost {
    pub fn new(state: MockHostState) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(state),
        })
    }

    pub fn state(&self) -> MutexGuard<'_, MockHostState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AgentHost for MockHost {
    async fn launch(
        &self,
        agent_id: &str,
        project_dir: &str,
    ) -> Result<SessionRecord, HostApiError> {
        let state = self.state();
        Ok(state.launch_record.clone().unwrap_or_else(|| SessionRecord {
            id: "s1".to_string(),
            agent_name: agent_id.to_string(),
            project_dir: project_dir.to_string(),
            status: SessionStatus::Starting,
            error: None,
        }))
    }

    async fn stop(&self, session_id: &str) -> Result<(), HostApiError> {
        self.state().stopped.push(session_id.to_string());
        Ok(())
    }

    async fn sessions(&self) -> Result<Vec<SessionRecord>, HostApiError> {
        let mut state = self.state();
        state.sessions_calls += 1;
        match state.sessions_responses.pop_front() {
            Some(Ok(records)) => Ok(records),
            Some(Err(message)) => Err(HostApiError::Unknown(message)),
            None => Ok(state.steady_sessions.clone()),
        }
    }

    async fn agents(&self) -> Result<Vec<AgentDefinition>, HostApiError> {
        let mut state = self.state();
        state.agents_calls += 1;
        Ok(state.agents.clone())
    }

    async fn messages(
        &self,
        session_id: &str,
        conversation_id: &str,
    ) -> Result<Vec<MessageWithParts>, HostApiError> {
        let gate = {
            let mut state = self.state();
            state
                .history_requests
                .push((session_id.to_string(), conversation_id.to_string()));
            state.history_gate.clone()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let state = self.state();
        match &state.history_error {
            Some(message) => Err(HostApiError::Unknown(message.clone())),
            None => Ok(state.history.clone()),
        }
    }

    async fn session_config(&self, _session_id: &str) -> Result<SessionConfig, HostApiError> {
        match self.state().config.clone() {
            Some(config) => Ok(config),
            None => Err(HostApiError::Unknown("config not available".to_string())),
        }
    }

    async fn providers(&self, _session_id: &str) -> Result<ProviderCatalog, HostApiError> {
        match self.state().catalog.clone() {
            Some(catalog) => Ok(catalog),
            None => Err(HostApiError::Unknown("catalog not available".to_string())),
        }
    }

    async fn prompt(
        &self,
        session_id: &str,
        conversation_id: &str,
        text: &str,
    ) -> Result<(), HostApiError> {
        let mut state = self.state();
        if let Some(message) = state.prompt_error.clone() {
            return Err(HostApiError::Unknown(message));
        }
        state.prompts.push((
            session_id.to_string(),
            conversation_id.to_string(),
            text.to_string(),
        ));
        Ok(())
    }

    async fn open_events(
        &self,
        session_id: &str,
        events: mpsc::UnboundedSender<PushEvent>,
    ) -> Result<(), HostApiError> {
        let scripted = {
            let mut state = self.state();
            state.opened_streams.push(session_id.to_string());
            state.event_senders.push(events.clone());
            state.scripted_events.clone()
        };
        for event in scripted {
            if events.send(event).is_err() {
                return Ok(());
            }
        }
        // Hold the stream open until the driving task is cancelled.
        std::future::pending::<()>().await;
        Ok(())
    }
}

pub fn record(id: &str, status: SessionStatus) -> SessionRecord {
    SessionRecord {
        id: id.to_string(),
        agent_name: "claude".to_string(),
        project_dir: "/work/demo".to_string(),
        status,
        error: None,
    }
}

/// Waits, under paused time, until `condition` holds or a generous number of
/// simulated polling intervals has elapsed.
pub async fn wait_until<H, F>(controller: &Arc<SessionController<H>>, mut condition: F)
where
    H: AgentHost,
    F: FnMut(&Arc<SessionController<H>>) -> bool,
{
    let mut revisions = controller.subscribe();
    for _ in 0..200 {
        if condition(controller) {
            return;
        }
        tokio::select! {
            _ = revisions.changed() => {}
            _ = tokio::time::sleep(Duration::from_millis(250)) => {}
        }
    }
    panic!("condition not reached in time");
}
