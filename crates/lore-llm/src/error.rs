//! Error types for lore-llm.

/// Errors produced by embedding providers.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// Transport-level failure talking to the embedding endpoint.
    #[error("embedding request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status.
    #[error("embedding endpoint returned status {status}")]
    Status { status: u16 },

    /// Response body could not be decoded.
    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    /// Provider cannot produce embeddings (misconfigured or mock).
    #[error("embeddings not supported by provider '{provider}'")]
    Unsupported { provider: String },
}
