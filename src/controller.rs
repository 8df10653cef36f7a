//! Orchestrates one live session: lifecycle polling, the push event channel,
//! model resolution, and outbound prompts. All observable state is read
//! through [`SessionController::snapshot`]; change notifications go out on a
//! watch channel carrying a revision counter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use host_api::events::PushEvent;
use host_api::host::AgentHost;
use host_api::types::{MessageInfo, PartInfo, PartKind, Role, SessionRecord, SessionStatus};

use crate::conversation::Conversation;
use crate::error::LaunchError;
use crate::model_context::{self, ModelContext};
use crate::session::{lock_unpoisoned, SessionStore, SESSION_POLL_INTERVAL};

#[derive(Default)]
struct SharedState {
    conversation: Conversation,
    model_context: ModelContext,
    transient_error: Option<String>,
}

/// The open push channel and the tasks driving it. At most one exists at a
/// time; the epoch lets frames from an aborted channel be discarded even if
/// they were already queued.
struct OpenChannel {
    session_id: String,
    epoch: u64,
    stream_task: JoinHandle<()>,
    pump_task: JoinHandle<()>,
}

/// Point-in-time copy of everything the presentation layer reads.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub session: Option<SessionRecord>,
    pub conversation: Conversation,
    pub model_context: ModelContext,
    pub transient_error: Option<String>,
}

pub struct SessionController<H: AgentHost> {
    store: Arc<SessionStore<H>>,
    state: Mutex<SharedState>,
    revision: watch::Sender<u64>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
    channel: Mutex<Option<OpenChannel>>,
    /// Bumped on every launch and teardown; tasks carrying an older value
    /// stop touching state.
    generation: AtomicU64,
    channel_epoch: AtomicU64,
    /// Generation whose `Running` transition already triggered model
    /// resolution, so repeated reconciliation cannot refetch.
    resolved_generation: Mutex<Option<u64>>,
    echo_seq: AtomicU64,
}

impl<H: AgentHost> SessionController<H> {
    pub fn new(host: Arc<H>) -> Arc<Self> {
        let (revision, _) = watch::channel(0);
        Arc::new(Self {
            store: Arc::new(SessionStore::new(host)),
            state: Mutex::new(SharedState::default()),
            revision,
            poll_task: Mutex::new(None),
            channel: Mutex::new(None),
            generation: AtomicU64::new(0),
            channel_epoch: AtomicU64::new(0),
            resolved_generation: Mutex::new(None),
            echo_seq: AtomicU64::new(0),
        })
    }

    pub fn store(&self) -> &Arc<SessionStore<H>> {
        &self.store
    }

    /// Receiver for the revision counter; any change to observable state
    /// bumps it.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = lock_unpoisoned(&self.state);
        Snapshot {
            session: self.store.current(),
            conversation: state.conversation.clone(),
            model_context: state.model_context.clone(),
            transient_error: state.transient_error.clone(),
        }
    }

    /// Whether a push channel is currently open.
    pub fn is_live(&self) -> bool {
        lock_unpoisoned(&self.channel).is_some()
    }

    pub fn dismiss_error(&self) {
        lock_unpoisoned(&self.state).transient_error = None;
        self.notify();
    }

    /// Tears down whatever session was active, launches a new one, and
    /// starts polling its lifecycle.
    pub async fn launch(
        self: &Arc<Self>,
        agent_id: &str,
        project_dir: &str,
    ) -> Result<SessionRecord, LaunchError> {
        self.teardown();
        *lock_unpoisoned(&self.state) = SharedState::default();

        let record = self.store.launch(agent_id, project_dir).await?;
        let generation = self.next_generation();
        if record.status == SessionStatus::Starting {
            self.start_polling(generation);
        } else {
            // Host settled the session in the launch response itself.
            self.on_status_settled(record.status, &record.id, generation)
                .await;
        }
        self.notify();
        Ok(record)
    }

    /// Stops the current session: polling and the channel go down first, then
    /// the host is asked to stop (best effort).
    pub async fn stop(&self) {
        self.teardown();
        self.store.stop().await;
        self.notify();
    }

    /// Detaches from the session without stopping it on the host, for client
    /// exit or navigation away.
    pub fn shutdown(&self) {
        self.teardown();
        self.notify();
    }

    /// One manual lifecycle refresh, reconciling the channel with whatever
    /// status the host reports now. Used when the client resumes after losing
    /// track of the session.
    pub async fn refresh_now(self: &Arc<Self>) {
        let records = match self.store.refresh().await {
            Ok(records) => records,
            Err(error) => {
                self.set_transient_error(format!("session refresh failed: {error}"));
                return;
            }
        };
        let current = match self.store.current() {
            Some(current) => current,
            None => return,
        };

        let Some(refreshed) = records.iter().find(|record| record.id == current.id) else {
            // The host no longer reports the session at all.
            self.store.adopt(SessionRecord {
                status: SessionStatus::Stopped,
                ..current
            });
            self.close_channel();
            self.notify();
            return;
        };

        self.store.adopt(refreshed.clone());
        let generation = self.generation.load(Ordering::SeqCst);
        match refreshed.status {
            SessionStatus::Running => {
                if !self.is_live() {
                    self.open_conversation(&refreshed.id, generation).await;
                    self.resolve_model_once(&refreshed.id, generation);
                }
            }
            SessionStatus::Error | SessionStatus::Stopped => self.close_channel(),
            SessionStatus::Starting => {}
        }
        self.notify();
    }

    /// Sends a prompt without waiting for delivery. The user's text is echoed
    /// into the conversation immediately; a delivery failure surfaces as a
    /// transient error and the echo stays.
    pub fn send(self: &Arc<Self>, text: &str) {
        let record = match self.store.current() {
            Some(record) => record,
            None => {
                self.set_transient_error("no active session to send to".to_string());
                return;
            }
        };

        let seq = self.echo_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let message_id = format!("local-{seq}");
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0);
        {
            let mut state = lock_unpoisoned(&self.state);
            state.conversation.apply(PushEvent::MessageUpdated {
                info: MessageInfo {
                    id: message_id.clone(),
                    role: Role::User,
                    time: Some(now_ms),
                    tokens: None,
                    provider_id: None,
                    model_id: None,
                },
            });
            state.conversation.apply(PushEvent::PartUpdated {
                part: PartInfo {
                    id: format!("{message_id}-text"),
                    message_id,
                    kind: PartKind::Text,
                    text: text.to_string(),
                    tool_name: None,
                    state: None,
                    output: None,
                },
            });
        }
        self.notify();

        let controller = Arc::clone(self);
        let text = text.to_string();
        tokio::spawn(async move {
            let host = controller.store.host();
            if let Err(error) = host.prompt(&record.id, &record.id, &text).await {
                controller.set_transient_error(format!("prompt delivery failed: {error}"));
            }
        });
    }

    fn teardown(&self) {
        self.next_generation();
        if let Some(task) = lock_unpoisoned(&self.poll_task).take() {
            task.abort();
        }
        self.close_channel();
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current_generation(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn start_polling(self: &Arc<Self>, generation: u64) {
        let controller = Arc::clone(self);
        let task = tokio::spawn(async move { controller.poll_until_settled(generation).await });
        *lock_unpoisoned(&self.poll_task) = Some(task);
    }

    /// Polls the host until the session leaves `Starting`, then reacts to the
    /// settled status and exits. Refresh failures are transient; polling
    /// keeps going.
    async fn poll_until_settled(self: Arc<Self>, generation: u64) {
        let mut ticker = tokio::time::interval(SESSION_POLL_INTERVAL);
        loop {
            ticker.tick().await;
            if !self.is_current_generation(generation) {
                return;
            }

            let records = match self.store.refresh().await {
                Ok(records) => records,
                Err(error) => {
                    self.set_transient_error(format!("session refresh failed: {error}"));
                    continue;
                }
            };
            // The response may have been in flight across a teardown.
            if !self.is_current_generation(generation) {
                return;
            }

            let Some(status) = self.store.apply_refresh(&records) else {
                continue;
            };
            let session_id = match self.store.current() {
                Some(record) => record.id,
                None => return,
            };
            tracing::info!(session_id = %session_id, status = status.as_str(), "session settled");
            self.on_status_settled(status, &session_id, generation).await;
            self.notify();
            return;
        }
    }

    async fn on_status_settled(
        self: &Arc<Self>,
        status: SessionStatus,
        session_id: &str,
        generation: u64,
    ) {
        match status {
            SessionStatus::Running => {
                self.open_conversation(session_id, generation).await;
                self.resolve_model_once(session_id, generation);
            }
            SessionStatus::Error | SessionStatus::Stopped => self.close_channel(),
            SessionStatus::Starting => {}
        }
    }

    /// Opens the push channel for `session_id`, seeding the conversation from
    /// the one-shot history pull first. Any previously open channel is fully
    /// closed before the new one starts. A failed seed leaves the
    /// conversation empty but still opens the channel.
    async fn open_conversation(self: &Arc<Self>, session_id: &str, generation: u64) {
        self.close_channel();
        let epoch = self.channel_epoch.fetch_add(1, Ordering::SeqCst) + 1;

        // The conversation id defaults to the session's own id.
        let history = self.store.host().messages(session_id, session_id).await;
        // A teardown may have completed while the pull was in flight; a
        // stale generation must not open a stream for a dead session.
        if !self.is_current_generation(generation) {
            return;
        }
        match history {
            Ok(history) => {
                let mut state = lock_unpoisoned(&self.state);
                state.conversation = Conversation::default();
                state.conversation.seed_history(history);
            }
            Err(error) => {
                self.set_transient_error(format!("conversation history unavailable: {error}"));
            }
        }

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let host = Arc::clone(self.store.host());
        let stream_session_id = session_id.to_string();
        let stream_task = tokio::spawn(async move {
            if let Err(error) = host.open_events(&stream_session_id, events_tx).await {
                tracing::warn!(session_id = %stream_session_id, "event stream closed: {error}");
            }
        });

        let controller = Arc::clone(self);
        let pump_task = tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                // Staleness is checked under the state lock, paired with the
                // barrier in close_channel, so a frame already past the
                // receive cannot apply once the channel is closed.
                let mut state = lock_unpoisoned(&controller.state);
                if !controller.is_current_generation(generation)
                    || controller.channel_epoch.load(Ordering::SeqCst) != epoch
                {
                    return;
                }
                state.conversation.apply(event);
                drop(state);
                controller.notify();
            }
        });

        {
            let mut channel = lock_unpoisoned(&self.channel);
            if !self.is_current_generation(generation) {
                stream_task.abort();
                pump_task.abort();
                return;
            }
            *channel = Some(OpenChannel {
                session_id: session_id.to_string(),
                epoch,
                stream_task,
                pump_task,
            });
        }
        self.notify();
    }

    /// Closes the channel synchronously: the epoch bump makes queued frames
    /// stale before the tasks are aborted, so nothing applies after this
    /// returns.
    fn close_channel(&self) {
        self.channel_epoch.fetch_add(1, Ordering::SeqCst);
        // Barrier: a pump that read the old epoch holds the state lock until
        // its apply finishes, so taking the lock here orders that apply
        // before this return.
        drop(lock_unpoisoned(&self.state));
        if let Some(channel) = lock_unpoisoned(&self.channel).take() {
            channel.stream_task.abort();
            channel.pump_task.abort();
            tracing::debug!(session_id = %channel.session_id, epoch = channel.epoch, "event channel closed");
        }
    }

    /// Fetches config and the provider catalog once per generation, on the
    /// transition into `Running`.
    fn resolve_model_once(self: &Arc<Self>, session_id: &str, generation: u64) {
        {
            let mut resolved = lock_unpoisoned(&self.resolved_generation);
            if *resolved == Some(generation) {
                return;
            }
            *resolved = Some(generation);
        }

        let controller = Arc::clone(self);
        let session_id = session_id.to_string();
        tokio::spawn(async move {
            let context = model_context::fetch(controller.store.host().as_ref(), &session_id).await;
            if !controller.is_current_generation(generation) {
                return;
            }
            lock_unpoisoned(&controller.state).model_context = context;
            controller.notify();
        });
    }

    fn set_transient_error(&self, message: String) {
        tracing::warn!("{message}");
        lock_unpoisoned(&self.state).transient_error = Some(message);
        self.notify();
    }

    fn notify(&self) {
        self.revision.send_modify(|revision| *revision = revision.wrapping_add(1));
    }
}

impl<H: AgentHost> Drop for SessionController<H> {
    fn drop(&mut self) {
        if let Some(task) = lock_unpoisoned(&self.poll_task).take() {
            task.abort();
        }
        if let Some(channel) = lock_unpoisoned(&self.channel).take() {
            channel.stream_task.abort();
            channel.pump_task.abort();
        }
    }
}
