//! One-shot resolution of the active provider/model and the share of its
//! context window consumed by the conversation.

use host_api::host::AgentHost;
use host_api::types::{ProviderCatalog, SessionConfig};

use crate::conversation::Conversation;

/// Provider/model pair chosen for a running session, with the catalog's
/// declared context window when one is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    pub provider_id: String,
    pub model_id: String,
    pub context_window: Option<u64>,
}

/// Provider/model identity shown in the session header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLabel {
    pub provider_id: Option<String>,
    pub model_id: String,
}

/// Outcome of the per-`Running` resolution pass. Degrades to "unknown"
/// rather than failing the session when config or catalog are unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelContext {
    resolved: Option<ResolvedModel>,
}

/// Picks the active provider/model: an explicit session config wins, else
/// the catalog's declared default (first entry when several are offered).
pub fn resolve(config: &SessionConfig, catalog: &ProviderCatalog) -> Option<ResolvedModel> {
    let (provider_id, model_id) = match (&config.provider_id, &config.model_id) {
        (Some(provider_id), Some(model_id)) => (provider_id.clone(), model_id.clone()),
        _ => {
            // First entry as the host declared it, not alphabetical order.
            let (provider_id, model_id) = catalog.default.first()?;
            (provider_id.clone(), model_id.clone())
        }
    };

    let context_window = catalog.context_window(&provider_id, &model_id);
    Some(ResolvedModel {
        provider_id,
        model_id,
        context_window,
    })
}

impl ModelContext {
    pub fn from_parts(config: Option<SessionConfig>, catalog: Option<ProviderCatalog>) -> Self {
        let resolved = match (config, catalog) {
            (Some(config), Some(catalog)) => resolve(&config, &catalog),
            _ => None,
        };
        Self { resolved }
    }

    pub fn resolved(&self) -> Option<&ResolvedModel> {
        self.resolved.as_ref()
    }

    /// Header label: the configured model until an assistant message carries
    /// its own model id, which is closer to ground truth and wins from then
    /// on.
    pub fn header_label(&self, conversation: &Conversation) -> Option<ModelLabel> {
        if let Some(info) = conversation.last_assistant_model() {
            if let Some(model_id) = info.model_id.clone() {
                return Some(ModelLabel {
                    provider_id: info.provider_id.clone(),
                    model_id,
                });
            }
        }

        self.resolved.as_ref().map(|resolved| ModelLabel {
            provider_id: Some(resolved.provider_id.clone()),
            model_id: resolved.model_id.clone(),
        })
    }

    /// Context utilization as a whole percentage, defined only once both a
    /// positive context window and a positive observed input-token count are
    /// known. Never zero-by-default.
    pub fn utilization(&self, conversation: &Conversation) -> Option<u32> {
        let window = self.resolved.as_ref()?.context_window?;
        let input = conversation.last_assistant_tokens()?.input;
        if window == 0 || input == 0 {
            return None;
        }

        Some((input as f64 / window as f64 * 100.0).round() as u32)
    }
}

/// Fetches session config and the provider catalog in parallel and resolves
/// them. Either fetch failing degrades that half to `None` instead of
/// surfacing an error.
pub async fn fetch<H: AgentHost>(host: &H, session_id: &str) -> ModelContext {
    let (config, catalog) = tokio::join!(host.session_config(session_id), host.providers(session_id));

    let config = match config {
        Ok(config) => Some(config),
        Err(error) => {
            tracing::warn!("session config unavailable, model stays unresolved: {error}");
            None
        }
    };
    let catalog = match catalog {
        Ok(catalog) => Some(catalog),
        Err(error) => {
            tracing::warn!("provider catalog unavailable, context window unknown: {error}");
            None
        }
    };

    ModelContext::from_parts(config, catalog)
}
