//! The StepExecutor component: a fixed, ordered eight-step pipeline
//! that scrapes a company's filings page, pulls down its PDFs, extracts
//! and embeds their text, and synthesizes a snapshot, resumable from
//! wherever a prior attempt stopped and cancellable at checkpoints between
//! and within steps.

mod cancellation;
mod chunking;
mod context;
mod executor;
mod payload;
mod steps;

pub use cancellation::CancellationRegistry;
pub use executor::StepExecutor;
pub use payload::{DocumentRef, ResumePayload};
pub use steps::{STEP_NAMES, TOTAL_STEPS};
