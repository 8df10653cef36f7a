use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Lifecycle state reported by the host for one agent session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Starting,
    Running,
    Error,
    Stopped,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Error => "error",
            Self::Stopped => "stopped",
        }
    }

    /// Returns true when no further host-side transition is expected.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error | Self::Stopped)
    }
}

/// One running/starting/errored/stopped agent instance bound to a project
/// directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub agent_name: String,
    pub project_dir: String,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Catalog entry describing an installable agent. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub installed: bool,
    /// Whether the agent can run unattended.
    #[serde(default)]
    pub headless: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(other)]
    Assistant,
}

impl Default for Role {
    fn default() -> Self {
        Self::Assistant
    }
}

/// Token counters attached to a message by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input: u64,
    #[serde(default)]
    pub output: u64,
}

/// Full message envelope carried by `message.updated` events and by the
/// conversation bootstrap endpoint. Every event carries the complete current
/// value, not a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageInfo {
    pub id: String,
    #[serde(default)]
    pub role: Role,
    /// Creation time in epoch milliseconds, when the host reports one.
    #[serde(default)]
    pub time: Option<u64>,
    #[serde(default)]
    pub tokens: Option<TokenUsage>,
    #[serde(default, rename = "providerID")]
    pub provider_id: Option<String>,
    #[serde(default, rename = "modelID")]
    pub model_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartKind {
    Text,
    Reasoning,
    ToolCall,
    ToolResult,
    #[serde(other)]
    Other,
}

impl Default for PartKind {
    fn default() -> Self {
        Self::Other
    }
}

impl PartKind {
    #[must_use]
    pub fn is_tool(&self) -> bool {
        matches!(self, Self::ToolCall | Self::ToolResult)
    }
}

/// Execution state of a tool part. Anything the host reports beyond
/// `running`/`partial` counts as settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolState {
    Running,
    Partial,
    #[serde(other)]
    Done,
}

/// One fragment of a message. Parts arrive, are amended in place, and are
/// deleted independently of their owning message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartInfo {
    pub id: String,
    #[serde(rename = "messageID")]
    pub message_id: String,
    #[serde(default, rename = "type")]
    pub kind: PartKind,
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "tool")]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub state: Option<ToolState>,
    #[serde(default)]
    pub output: Option<String>,
}

/// Bootstrap shape returned by the conversation history endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageWithParts {
    pub info: MessageInfo,
    #[serde(default)]
    pub parts: Vec<PartInfo>,
}

/// Explicit model selection stored in the session configuration, when any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default, rename = "providerID")]
    pub provider_id: Option<String>,
    #[serde(default, rename = "modelID")]
    pub model_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelLimits {
    #[serde(default)]
    pub context: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub limit: ModelLimits,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub id: String,
    #[serde(default)]
    pub models: BTreeMap<String, ModelInfo>,
}

/// Provider/model catalog with declared context-window sizes and the host's
/// default provider-to-model assignment.
///
/// `default` is a map on the wire but kept as pairs in declaration order,
/// because the fallback when no model is configured is the first entry the
/// host declared, not the alphabetically first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCatalog {
    #[serde(default)]
    pub providers: Vec<ProviderInfo>,
    #[serde(
        default,
        deserialize_with = "default_assignment::deserialize",
        serialize_with = "default_assignment::serialize"
    )]
    pub default: Vec<(String, String)>,
}

mod default_assignment {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PairVisitor;

        impl<'de> Visitor<'de> for PairVisitor {
            type Value = Vec<(String, String)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of provider ids to model ids")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, String>()? {
                    pairs.push(entry);
                }
                Ok(pairs)
            }
        }

        deserializer.deserialize_map(PairVisitor)
    }

    pub fn serialize<S>(pairs: &[(String, String)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(pairs.len()))?;
        for (provider_id, model_id) in pairs {
            map.serialize_entry(provider_id, model_id)?;
        }
        map.end()
    }
}

impl ProviderCatalog {
    /// Looks up the declared context window for a provider/model pair.
    /// Returns `None` when the pair is unknown or declares no positive limit.
    #[must_use]
    pub fn context_window(&self, provider_id: &str, model_id: &str) -> Option<u64> {
        let provider = self.providers.iter().find(|p| p.id == provider_id)?;
        let model = provider.models.get(model_id)?;
        (model.limit.context > 0).then_some(model.limit.context)
    }
}
