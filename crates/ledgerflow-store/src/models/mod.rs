pub mod chat;
pub mod chunk;
pub mod document;
pub mod extraction;
pub mod job;
pub mod project;

pub use chat::{Chat, Message, MessageRole, MessageRow};
pub use chunk::{KnnMatch, NewChunk, TextChunk};
pub use document::{Document, DocumentPage};
pub use extraction::{CompanySnapshot, ExtractionResult};
pub use job::{Job, JobRow, JobStatus};
pub use project::{Project, ProjectRow, ProjectState};
