use serde::Serialize;

/// Wire payloads for job progress streams and the retrieval chat stream.
/// Encoded as `data: <compact JSON>\n\n`; the `type` tag is the SSE
/// `event:` line when the transport cares to split on it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Sent once, synthetically, to every new subscriber so a late joiner is
    /// never silent.
    Connected {
        job_id: String,
        already_finished: bool,
        message: String,
    },
    Status {
        step: String,
        step_index: i32,
        total_steps: i32,
        message: String,
    },
    /// Same shape as `Status`, finer-grained `message`.
    Progress {
        step: String,
        step_index: i32,
        total_steps: i32,
        message: String,
    },
    Detail {
        step: String,
        counters: Counters,
        message: String,
    },
    Completed {
        message: String,
    },
    Error {
        step: String,
        message: String,
    },
    Cancelled {
        message: String,
    },
    /// Terminal: published by `Close` and nothing else.
    StreamEnd {
        reason: CloseReason,
    },
    // --- chat-only events, sharing this taxonomy but never routed through
    // the ProgressBus (delivered over a per-request channel instead).
    Context {
        chunks_found: usize,
    },
    Start {},
    Chunk {
        content: String,
    },
    Done {
        message_id: String,
    },
}

/// Job counters nested under `detail` frames.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Counters {
    pub documents_processed: i32,
    pub embeddings_created: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    Completed,
    Error,
    Cancelled,
    ClientDisconnect,
    Shutdown,
}
