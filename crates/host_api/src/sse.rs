use serde_json::Value;

use crate::events::{map_event, PushEvent};

/// Incremental parser for the `\n\n`-delimited SSE push stream.
///
/// Frames that fail to decode are dropped with a warning; they never stop
/// subsequent frames from being parsed.
#[derive(Debug, Default)]
pub struct PushStreamParser {
    buffer: String,
}

impl PushStreamParser {
    /// Feed arbitrary bytes into the parser and drain complete events.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<PushEvent> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));
        let mut events = Vec::new();

        while let Some(split) = self.buffer.find("\n\n") {
            let frame = self.buffer[..split].to_string();
            self.buffer.drain(0..split + 2);

            let Some(payload) = extract_data_payload(&frame) else {
                continue;
            };
            if payload.is_empty() {
                continue;
            }

            match serde_json::from_str::<Value>(&payload) {
                Ok(value) => match map_event(value) {
                    Some(event) => events.push(event),
                    None => {
                        tracing::warn!("dropping push frame with malformed payload");
                    }
                },
                Err(error) => {
                    tracing::warn!("dropping undecodable push frame: {error}");
                }
            }
        }

        events
    }

    /// Parse a complete SSE payload string in one shot.
    pub fn parse_frames(input: &str) -> Vec<PushEvent> {
        let mut parser = Self::default();
        parser.feed(input.as_bytes())
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.trim().is_empty()
    }
}

fn extract_data_payload(frame: &str) -> Option<String> {
    let data_lines: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect();

    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}
