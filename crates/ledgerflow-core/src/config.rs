use anyhow::{bail, Result};

/// Application configuration loaded from environment variables. Carries
/// the service's full env surface, with sensible defaults for everything
/// but credentials and connection strings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Database
    pub database_url: String,

    // Server
    pub port: u16,
    pub allowed_origins: Vec<String>,

    // Models
    pub embedding_model: String,
    pub chat_model: String,
    pub extraction_model: String,
    pub embedding_api_base: String,
    pub embedding_api_key: String,
    pub chat_api_base: String,
    pub chat_api_key: String,
    pub extraction_api_base: String,
    pub extraction_api_key: String,

    // Blob storage
    pub blob_storage_endpoint: String,
    pub blob_storage_bucket: String,
    pub blob_storage_access_key: String,
    pub blob_storage_secret_key: String,

    // Chunking / retrieval
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_chunks_per_page: usize,
    pub knn_k: i64,

    // Timing
    pub keep_alive_interval_secs: u64,
    pub stale_job_threshold_secs: i64,

    // Retry
    pub max_retries: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL")?,
            port: env_or("PORT", "9080").parse()?,
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            embedding_model: env_or("EMBEDDING_MODEL", "text-embedding-3-small"),
            chat_model: env_or("CHAT_MODEL", "gpt-4o"),
            extraction_model: env_or("EXTRACTION_MODEL", "gpt-4o"),
            embedding_api_base: env_or("EMBEDDING_API_BASE", "https://api.openai.com/v1"),
            embedding_api_key: std::env::var("EMBEDDING_API_KEY")?,
            chat_api_base: env_or("CHAT_API_BASE", "https://api.openai.com/v1"),
            chat_api_key: std::env::var("CHAT_API_KEY")?,
            extraction_api_base: env_or("EXTRACTION_API_BASE", "https://api.openai.com/v1"),
            extraction_api_key: std::env::var("EXTRACTION_API_KEY")?,
            blob_storage_endpoint: std::env::var("BLOB_STORAGE_ENDPOINT")?,
            blob_storage_bucket: std::env::var("BLOB_STORAGE_BUCKET")?,
            blob_storage_access_key: std::env::var("BLOB_STORAGE_ACCESS_KEY")?,
            blob_storage_secret_key: std::env::var("BLOB_STORAGE_SECRET_KEY")?,
            chunk_size: env_or("CHUNK_SIZE", "400").parse()?,
            chunk_overlap: env_or("CHUNK_OVERLAP", "80").parse()?,
            max_chunks_per_page: env_or("MAX_CHUNKS_PER_PAGE", "10").parse()?,
            knn_k: env_or("KNN_K", "10").parse()?,
            keep_alive_interval_secs: env_or("KEEP_ALIVE_INTERVAL_SECS", "30").parse()?,
            stale_job_threshold_secs: env_or("STALE_JOB_THRESHOLD_SECS", "300").parse()?,
            max_retries: env_or("MAX_RETRIES", "3").parse()?,
        };

        if let Ok(dim) = std::env::var("EMBEDDING_DIMENSION") {
            let dim: usize = dim.parse()?;
            if dim != crate::EMBEDDING_DIM {
                bail!(
                    "EMBEDDING_DIMENSION={} does not match the build-time embedding width {}",
                    dim,
                    crate::EMBEDDING_DIM
                );
            }
        }

        Ok(config)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
