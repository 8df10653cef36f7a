//! Transport-only client primitives for a remote coding-agent host.
//!
//! This crate owns request/response building and parsing for the host's
//! session endpoints plus the per-session server-push event stream. It
//! intentionally contains no conversation state and no UI coupling; the
//! engine crate folds the typed [`PushEvent`]s this crate produces.
//!
//! Push-frame normalization is defensive: recognized event names with
//! malformed payloads are dropped (logged, never fatal), and unrecognized
//! event names surface as [`PushEvent::Ignored`] for forward compatibility.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod sse;
pub mod types;
pub mod url;

pub use client::HostApiClient;
pub use config::HostApiConfig;
pub use error::HostApiError;
pub use events::PushEvent;
pub use host::AgentHost;
pub use sse::PushStreamParser;
pub use types::{
    AgentDefinition, MessageInfo, MessageWithParts, PartInfo, PartKind, ProviderCatalog,
    ProviderInfo, Role, SessionConfig, SessionRecord, SessionStatus, TokenUsage, ToolState,
};
