//! Session lifecycle against the host: launch, refresh, stop, and the
//! agent catalog. Status is owned by the host; this store tracks the last
//! observed record and applies refreshes with a stale-poll guard.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::OnceCell;

use host_api::host::AgentHost;
use host_api::types::{AgentDefinition, SessionRecord, SessionStatus};

use crate::error::LaunchError;

/// Cadence of the lifecycle poll while a session starts up.
pub const SESSION_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct SessionStore<H: AgentHost> {
    host: Arc<H>,
    current: Mutex<Option<SessionRecord>>,
    active_by_agent: Mutex<HashMap<String, String>>,
    agents: OnceCell<Vec<AgentDefinition>>,
}

impl<H: AgentHost> SessionStore<H> {
    pub fn new(host: Arc<H>) -> Self {
        Self {
            host,
            current: Mutex::new(None),
            active_by_agent: Mutex::new(HashMap::new()),
            agents: OnceCell::new(),
        }
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    /// Agent catalog, fetched from the host once and cached for the process
    /// lifetime.
    pub async fn agents(&self) -> Result<&[AgentDefinition], host_api::HostApiError> {
        self.agents
            .get_or_try_init(|| self.host.agents())
            .await
            .map(Vec::as_slice)
    }

    /// Launches a session for `agent_id` in `project_dir` and adopts the
    /// returned record as current. The directory is validated locally before
    /// any request goes out.
    pub async fn launch(
        &self,
        agent_id: &str,
        project_dir: &str,
    ) -> Result<SessionRecord, LaunchError> {
        if project_dir.trim().is_empty() {
            return Err(LaunchError::MissingProjectDir);
        }

        let record = self.host.launch(agent_id, project_dir).await?;
        tracing::info!(session_id = %record.id, agent = %record.agent_name, "session launched");

        lock_unpoisoned(&self.active_by_agent)
            .insert(agent_id.to_string(), record.id.clone());
        *lock_unpoisoned(&self.current) = Some(record.clone());
        Ok(record)
    }

    /// Adopts an already-known session record as current, e.g. when
    /// reattaching to a session that outlived the client.
    pub fn adopt(&self, record: SessionRecord) {
        *lock_unpoisoned(&self.current) = Some(record);
    }

    pub fn current(&self) -> Option<SessionRecord> {
        lock_unpoisoned(&self.current).clone()
    }

    /// Session id currently registered for `agent_id`, if one was launched
    /// through this store and not yet stopped.
    pub fn active_session_for(&self, agent_id: &str) -> Option<String> {
        lock_unpoisoned(&self.active_by_agent).get(agent_id).cloned()
    }

    /// One lifecycle poll: the full session list as the host sees it.
    pub async fn refresh(&self) -> Result<Vec<SessionRecord>, host_api::HostApiError> {
        self.host.sessions().await
    }

    /// Applies a refresh response to the current record. Only a session still
    /// `Starting` is updated, so a response that raced a stop (or a newer
    /// launch) cannot resurrect a torn-down session. Returns the new status
    /// when it changed.
    pub fn apply_refresh(&self, records: &[SessionRecord]) -> Option<SessionStatus> {
        let mut current = lock_unpoisoned(&self.current);
        let session = current.as_mut()?;
        if session.status != SessionStatus::Starting {
            return None;
        }

        let refreshed = records.iter().find(|record| record.id == session.id)?;
        if refreshed.status == session.status {
            return None;
        }

        session.status = refreshed.status;
        session.error = refreshed.error.clone();
        Some(session.status)
    }

    /// Stops the current session. The host call is best-effort: a failure is
    /// logged and the local record still transitions to `Stopped`, because
    /// the client is done with the session either way.
    pub async fn stop(&self) {
        let record = match self.current() {
            Some(record) => record,
            None => return,
        };

        if let Err(error) = self.host.stop(&record.id).await {
            tracing::warn!(session_id = %record.id, "stop request failed: {error}");
        }

        let mut current = lock_unpoisoned(&self.current);
        if let Some(session) = current.as_mut() {
            if session.id == record.id {
                session.status = SessionStatus::Stopped;
            }
        }
        lock_unpoisoned(&self.active_by_agent)
            .retain(|_, session_id| session_id != &record.id);
    }
}

pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
