//! Read-time projections over the folded conversation. Nothing here mutates
//! state; these shape what the presentation layer draws.

use host_api::types::{PartInfo, PartKind, Role, ToolState};

use crate::conversation::{Conversation, Message};

/// Lines shown from a thinking block before it is collapsed.
pub const THINKING_PREVIEW_LINES: usize = 3;
/// Display cap for captured tool output; the stored value is never altered.
pub const TOOL_OUTPUT_DISPLAY_LIMIT: usize = 500;

/// Consecutive messages sharing a role, rendered as one visual block.
#[derive(Debug, PartialEq)]
pub struct MessageGroup<'a> {
    pub role: Role,
    pub messages: Vec<&'a Message>,
}

/// Groups consecutive same-role messages; a role change starts a new group.
pub fn group_by_role(conversation: &Conversation) -> Vec<MessageGroup<'_>> {
    let mut groups: Vec<MessageGroup<'_>> = Vec::new();

    for message in conversation.messages() {
        match groups.last_mut() {
            Some(group) if group.role == message.role() => group.messages.push(message),
            _ => groups.push(MessageGroup {
                role: message.role(),
                messages: vec![message],
            }),
        }
    }

    groups
}

/// Collapsible reasoning text extracted from a message's parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThinkingBlock {
    /// Full concatenated reasoning text, trimmed.
    pub text: String,
    /// Default collapsed rendering: the first [`THINKING_PREVIEW_LINES`].
    pub preview: String,
    /// Whether expansion reveals more than the preview.
    pub truncated: bool,
}

/// Concatenates a message's reasoning parts into one thinking block.
/// Returns `None` when the message carries no reasoning text.
pub fn thinking_block(message: &Message) -> Option<ThinkingBlock> {
    let text = message
        .parts
        .iter()
        .filter(|part| part.kind == PartKind::Reasoning)
        .map(|part| part.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    if text.is_empty() {
        return None;
    }

    let lines: Vec<&str> = text.lines().collect();
    let truncated = lines.len() > THINKING_PREVIEW_LINES;
    let preview = if truncated {
        lines[..THINKING_PREVIEW_LINES].join("\n")
    } else {
        text.clone()
    };

    Some(ThinkingBlock {
        text,
        preview,
        truncated,
    })
}

/// Non-reasoning parts in arrival order; reasoning routes to the thinking
/// block instead.
pub fn content_parts(message: &Message) -> Vec<&PartInfo> {
    message
        .parts
        .iter()
        .filter(|part| part.kind != PartKind::Reasoning)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolPhase {
    Running,
    Done,
}

/// Presentation state for one tool part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDisplay {
    pub name: String,
    pub phase: ToolPhase,
    /// Captured output truncated to [`TOOL_OUTPUT_DISPLAY_LIMIT`] characters.
    pub output: Option<String>,
}

/// Projects a tool part into its rendering state. Non-tool parts yield `None`.
pub fn tool_display(part: &PartInfo) -> Option<ToolDisplay> {
    if !part.kind.is_tool() {
        return None;
    }

    let phase = match part.state {
        Some(ToolState::Running) | Some(ToolState::Partial) => ToolPhase::Running,
        Some(ToolState::Done) | None => ToolPhase::Done,
    };

    let output = part
        .output
        .as_deref()
        .map(|output| output.chars().take(TOOL_OUTPUT_DISPLAY_LIMIT).collect());

    Some(ToolDisplay {
        name: part.tool_name.clone().unwrap_or_default(),
        phase,
        output,
    })
}
