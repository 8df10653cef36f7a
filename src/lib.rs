//! Client-side engine for driving coding-agent sessions on a remote host.
//!
//! The host owns the agents; this crate owns everything the client needs to
//! observe and steer them: launching and polling sessions
//! ([`session::SessionStore`]), folding the push event stream into an ordered
//! conversation ([`conversation::Conversation`]), resolving the active model
//! and its context window ([`model_context`]), shaping messages for display
//! ([`projection`]), and tying it all together behind one orchestrator
//! ([`controller::SessionController`]).
//!
//! Transport lives in the `host_api` crate; the engine only sees the
//! [`host_api::AgentHost`] trait, which tests implement in-process.

pub mod controller;
pub mod conversation;
pub mod error;
pub mod model_context;
pub mod projection;
pub mod session;

pub use controller::{SessionController, Snapshot};
pub use conversation::{Conversation, Message, MessageOrigin};
pub use error::LaunchError;
pub use model_context::{ModelContext, ModelLabel, ResolvedModel};
pub use session::{SessionStore, SESSION_POLL_INTERVAL};

pub use host_api;
