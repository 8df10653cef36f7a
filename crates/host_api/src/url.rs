/// Normalize a host base URL by trimming whitespace and trailing slashes.
pub fn normalize_base_url(input: &str) -> String {
    input.trim().trim_end_matches('/').to_string()
}

pub fn sessions_url(base: &str) -> String {
    format!("{}/sessions", normalize_base_url(base))
}

pub fn agents_url(base: &str) -> String {
    format!("{}/agents", normalize_base_url(base))
}

pub fn session_stop_url(base: &str, session_id: &str) -> String {
    format!("{}/sessions/{session_id}/stop", normalize_base_url(base))
}

pub fn session_config_url(base: &str, session_id: &str) -> String {
    format!("{}/sessions/{session_id}/config", normalize_base_url(base))
}

pub fn providers_url(base: &str, session_id: &str) -> String {
    format!("{}/sessions/{session_id}/providers", normalize_base_url(base))
}

/// One event stream per running session, parameterized by session id.
pub fn event_stream_url(base: &str, session_id: &str) -> String {
    format!("{}/sessions/{session_id}/events", normalize_base_url(base))
}

pub fn messages_url(base: &str, session_id: &str, conversation_id: &str) -> String {
    format!(
        "{}/sessions/{session_id}/conversations/{conversation_id}/messages",
        normalize_base_url(base)
    )
}

pub fn prompt_url(base: &str, session_id: &str, conversation_id: &str) -> String {
    format!(
        "{}/sessions/{session_id}/conversations/{conversation_id}/prompt",
        normalize_base_url(base)
    )
}
