//! Pure fold from push events to ordered conversation state.
//!
//! `(conversation, event) -> conversation'` with upsert-by-id semantics:
//! applying the same event twice is a no-op, and because every event carries
//! the full current value of what it touches, last-received wins when events
//! arrive out of generation order.

use host_api::events::PushEvent;
use host_api::types::{MessageInfo, MessageWithParts, PartInfo, Role, TokenUsage};

/// Distinguishes messages announced by the host from placeholders created to
/// home a part whose owning message has not been seen yet. A later
/// `message.updated` for the same id promotes the placeholder in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOrigin {
    Real,
    Synthesized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub info: MessageInfo,
    pub origin: MessageOrigin,
    pub parts: Vec<PartInfo>,
}

impl Message {
    fn real(info: MessageInfo) -> Self {
        Self {
            info,
            origin: MessageOrigin::Real,
            parts: Vec::new(),
        }
    }

    fn synthesized(message_id: &str) -> Self {
        Self {
            info: MessageInfo {
                id: message_id.to_string(),
                role: Role::Assistant,
                time: None,
                tokens: None,
                provider_id: None,
                model_id: None,
            },
            origin: MessageOrigin::Synthesized,
            parts: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn role(&self) -> Role {
        self.info.role
    }
}

/// Append-ordered message list keyed by message id. Insertion order is the
/// canonical display order; grouping by role is a read-time projection in
/// [`crate::projection`], never a mutation here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn message(&self, message_id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id() == message_id)
    }

    /// Folds one push event into the conversation.
    pub fn apply(&mut self, event: PushEvent) {
        match event {
            PushEvent::MessageUpdated { info } => self.upsert_message(info),
            PushEvent::PartUpdated { part } => self.upsert_part(part),
            PushEvent::MessageRemoved { message_id } => self.remove_message(&message_id),
            PushEvent::PartRemoved { part_id } => self.remove_part(&part_id),
            PushEvent::Ignored { .. } => {}
        }
    }

    /// Seeds the conversation from the one-shot history pull by replaying it
    /// through the same fold the push channel uses.
    pub fn seed_history(&mut self, history: Vec<MessageWithParts>) {
        for message in history {
            self.apply(PushEvent::MessageUpdated { info: message.info });
            for part in message.parts {
                self.apply(PushEvent::PartUpdated { part });
            }
        }
    }

    /// Last assistant message that resolved its own model id, if any.
    pub fn last_assistant_model(&self) -> Option<&MessageInfo> {
        self.messages
            .iter()
            .rev()
            .map(|message| &message.info)
            .find(|info| info.role == Role::Assistant && info.model_id.is_some())
    }

    /// Last observed assistant token counters, if any.
    pub fn last_assistant_tokens(&self) -> Option<TokenUsage> {
        self.messages
            .iter()
            .rev()
            .filter(|message| message.role() == Role::Assistant)
            .find_map(|message| message.info.tokens)
    }

    fn upsert_message(&mut self, info: MessageInfo) {
        match self.messages.iter_mut().find(|m| m.info.id == info.id) {
            Some(existing) => {
                // Last write wins on metadata; accumulated parts stay, and a
                // synthesized placeholder is promoted in place.
                existing.info = info;
                existing.origin = MessageOrigin::Real;
            }
            None => self.messages.push(Message::real(info)),
        }
    }

    fn upsert_part(&mut self, part: PartInfo) {
        // Part ids are globally unique for lookup: strip any copy held by a
        // different message before homing the update.
        for message in &mut self.messages {
            if message.id() != part.message_id {
                message.parts.retain(|existing| existing.id != part.id);
            }
        }

        let owner_index = match self
            .messages
            .iter()
            .position(|m| m.id() == part.message_id)
        {
            Some(index) => index,
            None => {
                self.messages.push(Message::synthesized(&part.message_id));
                self.messages.len() - 1
            }
        };
        let owner = &mut self.messages[owner_index];

        match owner.parts.iter_mut().find(|existing| existing.id == part.id) {
            Some(existing) => *existing = part,
            None => owner.parts.push(part),
        }
    }

    fn remove_message(&mut self, message_id: &str) {
        // Parts die with their message.
        self.messages.retain(|message| message.id() != message_id);
    }

    fn remove_part(&mut self, part_id: &str) {
        // The message survives even with zero parts left.
        for message in &mut self.messages {
            message.parts.retain(|part| part.id != part_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use host_api::types::{PartKind, ToolState};

    use super::*;

    fn info(id: &str, role: Role) -> MessageInfo {
        MessageInfo {
            id: id.to_string(),
            role,
            time: Some(1_700_000_000_000),
            tokens: None,
            provider_id: None,
            model_id: None,
        }
    }

    fn part(id: &str, message_id: &str, text: &str) -> PartInfo {
        PartInfo {
            id: id.to_string(),
            message_id: message_id.to_string(),
            kind: PartKind::Text,
            text: text.to_string(),
            tool_name: None,
            state: None,
            output: None,
        }
    }

    #[test]
    fn message_updated_is_idempotent() {
        let mut conversation = Conversation::default();
        let event = PushEvent::MessageUpdated {
            info: info("m1", Role::User),
        };

        conversation.apply(event.clone());
        let once = conversation.clone();
        conversation.apply(event);

        assert_eq!(conversation, once);
        assert_eq!(conversation.messages().len(), 1);
    }

    #[test]
    fn message_update_preserves_existing_parts() {
        let mut conversation = Conversation::default();
        conversation.apply(PushEvent::MessageUpdated {
            info: info("m1", Role::Assistant),
        });
        conversation.apply(PushEvent::PartUpdated {
            part: part("p1", "m1", "hello"),
        });

        let mut updated = info("m1", Role::Assistant);
        updated.tokens = Some(TokenUsage {
            input: 42,
            output: 7,
        });
        conversation.apply(PushEvent::MessageUpdated { info: updated });

        let message = conversation.message("m1").expect("message kept");
        assert_eq!(message.parts.len(), 1);
        assert_eq!(message.info.tokens.map(|t| t.input), Some(42));
    }

    #[test]
    fn orphan_part_synthesizes_exactly_one_assistant_message() {
        let mut conversation = Conversation::default();
        conversation.apply(PushEvent::PartUpdated {
            part: part("p1", "m-unseen", "early"),
        });
        conversation.apply(PushEvent::PartUpdated {
            part: part("p2", "m-unseen", "more"),
        });

        assert_eq!(conversation.messages().len(), 1);
        let message = conversation.message("m-unseen").expect("synthesized home");
        assert_eq!(message.origin, MessageOrigin::Synthesized);
        assert_eq!(message.role(), Role::Assistant);
        assert_eq!(message.parts.len(), 2);
    }

    #[test]
    fn late_message_update_promotes_synthesized_placeholder() {
        let mut conversation = Conversation::default();
        conversation.apply(PushEvent::PartUpdated {
            part: part("p1", "m1", "early"),
        });
        conversation.apply(PushEvent::MessageUpdated {
            info: info("m1", Role::Assistant),
        });

        assert_eq!(conversation.messages().len(), 1);
        let message = conversation.message("m1").expect("promoted");
        assert_eq!(message.origin, MessageOrigin::Real);
        assert_eq!(message.parts.len(), 1);
    }

    #[test]
    fn part_update_amends_in_place_preserving_order() {
        let mut conversation = Conversation::default();
        conversation.apply(PushEvent::MessageUpdated {
            info: info("m1", Role::Assistant),
        });
        conversation.apply(PushEvent::PartUpdated {
            part: part("p1", "m1", "draft"),
        });
        conversation.apply(PushEvent::PartUpdated {
            part: part("p2", "m1", "second"),
        });
        conversation.apply(PushEvent::PartUpdated {
            part: part("p1", "m1", "final"),
        });

        let message = conversation.message("m1").expect("message");
        assert_eq!(message.parts.len(), 2);
        assert_eq!(message.parts[0].text, "final");
        assert_eq!(message.parts[1].text, "second");
    }

    #[test]
    fn part_update_rehomes_a_part_claimed_by_another_message() {
        let mut conversation = Conversation::default();
        conversation.apply(PushEvent::MessageUpdated {
            info: info("m1", Role::Assistant),
        });
        conversation.apply(PushEvent::MessageUpdated {
            info: info("m2", Role::Assistant),
        });
        conversation.apply(PushEvent::PartUpdated {
            part: part("p1", "m1", "first home"),
        });
        conversation.apply(PushEvent::PartUpdated {
            part: part("p1", "m2", "moved"),
        });

        assert!(conversation.message("m1").expect("m1").parts.is_empty());
        let rehomed = &conversation.message("m2").expect("m2").parts;
        assert_eq!(rehomed.len(), 1);
        assert_eq!(rehomed[0].text, "moved");
    }

    #[test]
    fn message_removal_takes_its_parts_and_later_part_removals_are_noops() {
        let mut conversation = Conversation::default();
        conversation.apply(PushEvent::MessageUpdated {
            info: info("m1", Role::Assistant),
        });
        conversation.apply(PushEvent::PartUpdated {
            part: part("p1", "m1", "gone with the message"),
        });
        conversation.apply(PushEvent::MessageUpdated {
            info: info("m2", Role::User),
        });

        conversation.apply(PushEvent::MessageRemoved {
            message_id: "m1".to_string(),
        });
        assert!(conversation.message("m1").is_none());
        assert_eq!(conversation.messages().len(), 1);

        let before = conversation.clone();
        conversation.apply(PushEvent::PartRemoved {
            part_id: "p1".to_string(),
        });
        assert_eq!(conversation, before);
    }

    #[test]
    fn part_removal_leaves_an_empty_message_intact() {
        let mut conversation = Conversation::default();
        conversation.apply(PushEvent::MessageUpdated {
            info: info("m1", Role::Assistant),
        });
        conversation.apply(PushEvent::PartUpdated {
            part: part("p1", "m1", "only part"),
        });

        conversation.apply(PushEvent::PartRemoved {
            part_id: "p1".to_string(),
        });

        let message = conversation.message("m1").expect("message survives");
        assert!(message.parts.is_empty());
    }

    #[test]
    fn unrecognized_events_do_not_disturb_state() {
        let mut conversation = Conversation::default();
        conversation.apply(PushEvent::MessageUpdated {
            info: info("m1", Role::User),
        });
        let before = conversation.clone();

        conversation.apply(PushEvent::Ignored {
            event_type: "session.idle".to_string(),
        });

        assert_eq!(conversation, before);
    }

    #[test]
    fn seed_history_uses_the_same_fold_as_the_channel() {
        let mut conversation = Conversation::default();
        conversation.seed_history(vec![
            MessageWithParts {
                info: info("m1", Role::User),
                parts: vec![part("p1", "m1", "hi")],
            },
            MessageWithParts {
                info: info("m2", Role::Assistant),
                parts: vec![part("p2", "m2", "hello")],
            },
        ]);

        assert_eq!(conversation.messages().len(), 2);
        assert_eq!(conversation.message("m1").expect("m1").parts.len(), 1);

        // A later push for a seeded id upserts instead of duplicating.
        conversation.apply(PushEvent::PartUpdated {
            part: part("p2", "m2", "hello again"),
        });
        assert_eq!(conversation.message("m2").expect("m2").parts.len(), 1);
    }

    #[test]
    fn token_and_model_lookups_prefer_the_most_recent_assistant_message() {
        let mut conversation = Conversation::default();
        let mut first = info("m1", Role::Assistant);
        first.tokens = Some(TokenUsage {
            input: 100,
            output: 5,
        });
        first.model_id = Some("old-model".to_string());
        let mut second = info("m2", Role::Assistant);
        second.tokens = Some(TokenUsage {
            input: 250,
            output: 9,
        });
        second.model_id = Some("new-model".to_string());

        conversation.apply(PushEvent::MessageUpdated { info: first });
        conversation.apply(PushEvent::MessageUpdated { info: second });
        conversation.apply(PushEvent::MessageUpdated {
            info: info("m3", Role::User),
        });

        assert_eq!(
            conversation.last_assistant_tokens().map(|t| t.input),
            Some(250)
        );
        assert_eq!(
            conversation
                .last_assistant_model()
                .and_then(|info| info.model_id.as_deref()),
            Some("new-model")
        );
    }

    #[test]
    fn tool_parts_round_trip_through_the_fold() {
        let mut conversation = Conversation::default();
        conversation.apply(PushEvent::PartUpdated {
            part: PartInfo {
                id: "p1".to_string(),
                message_id: "m1".to_string(),
                kind: PartKind::ToolCall,
                text: String::new(),
                tool_name: Some("bash".to_string()),
                state: Some(ToolState::Running),
                output: None,
            },
        });
        conversation.apply(PushEvent::PartUpdated {
            part: PartInfo {
                id: "p1".to_string(),
                message_id: "m1".to_string(),
                kind: PartKind::ToolCall,
                text: String::new(),
                tool_name: Some("bash".to_string()),
                state: Some(ToolState::Done),
                output: Some("ok".to_string()),
            },
        });

        let message = conversation.message("m1").expect("message");
        assert_eq!(message.parts.len(), 1);
        assert_eq!(message.parts[0].state, Some(ToolState::Done));
        assert_eq!(message.parts[0].output.as_deref(), Some("ok"));
    }
}
