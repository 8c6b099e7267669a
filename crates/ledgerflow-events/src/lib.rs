//! The ProgressBus: an in-memory, topic-per-job event dispatcher with
//! bounded per-subscriber buffering, synthetic `connected` seeding,
//! keep-alive, and idempotent terminal close-out. Also the shared SSE wire
//! encoding used by both job progress streams and the retrieval chat
//! stream.

mod bus;
mod event;
mod wire;

pub use bus::{ProgressBus, Received, Subscription};
pub use event::{CloseReason, Counters, Event};
pub use wire::{encode_event, encode_keep_alive, encode_lagged};
