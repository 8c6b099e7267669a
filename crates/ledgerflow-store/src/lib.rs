//! The Store: typed, transactional persistence over the ingestion data
//! model, plus three specialised queries (`CreateProjectIfAbsent`, `KNN`,
//! `AcquireJobSlot`). Cascading deletes and the partial unique index on
//! active jobs are enforced by the schema (`migrations/`), not here.

mod chats;
mod chunks;
mod documents;
pub mod error;
mod extractions;
mod jobs;
pub mod models;
mod projects;
mod store;

pub use chats::*;
pub use chunks::*;
pub use documents::*;
pub use error::{Result, StoreError};
pub use extractions::*;
pub use jobs::*;
pub use models::*;
pub use projects::*;
pub use store::Store;
