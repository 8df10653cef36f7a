use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{MessageInfo, PartInfo};

/// Typed push event parsed from a raw `{type, properties}` frame.
///
/// The four recognized kinds form a closed union; everything else maps to
/// [`PushEvent::Ignored`] so unknown event names from newer hosts never break
/// the stream. Each update event carries the full current value of what it
/// touches, never a diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PushEvent {
    #[serde(rename = "message.updated")]
    MessageUpdated { info: MessageInfo },
    #[serde(rename = "message.part.updated")]
    PartUpdated { part: PartInfo },
    #[serde(rename = "message.removed")]
    MessageRemoved { message_id: String },
    #[serde(rename = "message.part.removed")]
    PartRemoved { part_id: String },
    #[serde(rename = "ignored")]
    Ignored { event_type: String },
}

/// Maps one decoded frame value to a typed event.
///
/// Returns `None` for recognized event names whose payload does not parse;
/// callers drop those frames. Unrecognized names return `Ignored`.
pub fn map_event(value: Value) -> Option<PushEvent> {
    let event_type = value.get("type")?.as_str()?.to_owned();
    let properties = value.get("properties").cloned().unwrap_or(Value::Null);

    match event_type.as_str() {
        "message.updated" => {
            let info = properties.get("info")?.clone();
            let info = serde_json::from_value::<MessageInfo>(info).ok()?;
            Some(PushEvent::MessageUpdated { info })
        }
        "message.part.updated" => {
            let part = properties.get("part")?.clone();
            let part = serde_json::from_value::<PartInfo>(part).ok()?;
            Some(PushEvent::PartUpdated { part })
        }
        "message.removed" => {
            let message_id = properties.get("messageID")?.as_str()?.to_owned();
            Some(PushEvent::MessageRemoved { message_id })
        }
        "message.part.removed" => {
            let part_id = properties.get("partID")?.as_str()?.to_owned();
            Some(PushEvent::PartRemoved { part_id })
        }
        _ => Some(PushEvent::Ignored { event_type }),
    }
}
