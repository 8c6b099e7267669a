use crate::event::Event;

/// Encodes one event as an SSE data frame: `data: <compact JSON>\n\n`.
/// Shared by the progress-stream endpoint and the chat endpoint — the
/// latter uses the same framing without going through the `ProgressBus`.
pub fn encode_event(event: &Event) -> String {
    let json = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    format!("data: {json}\n\n")
}

/// A keep-alive comment frame. Comment lines are invisible to SSE clients
/// but keep intermediaries from timing out an idle connection.
pub fn encode_keep_alive() -> &'static str {
    ": keep-alive\n\n"
}

/// A comment frame marking dropped events for a lagging subscriber.
/// Surfaced as a comment rather than a typed event since the wire taxonomy
/// has no field for it.
pub fn encode_lagged(skipped: u64) -> String {
    format!(": lagged {skipped}\n\n")
}
