pub mod config;
pub mod error;
pub mod ids;
pub mod url;

pub use config::AppConfig;
pub use error::IngestError;
pub use ids::Id;

/// Embedding vector width, fixed at build time per the vector column's
/// invariant: an Embedding and its owning TextChunk always agree on
/// dimension, and the ANN index is built against this constant.
pub const EMBEDDING_DIM: usize = 1536;
