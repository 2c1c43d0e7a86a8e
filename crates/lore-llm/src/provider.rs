use crate::error::EmbedError;
use crate::mock::MockEmbedder;
use crate::openai::OpenAiEmbedder;

/// Provider of dense embedding vectors.
///
/// Implementations must be cheap to clone and safe to share across tasks;
/// the index engine holds one behind an `Arc` and calls it concurrently.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a piece of text into a dense vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot reach its backend or the
    /// response is malformed.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, EmbedError>> + Send;

    /// Expected embedding dimension.
    fn dimension(&self) -> usize;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

/// Enum dispatch over the concrete embedders, selected at startup.
#[derive(Debug, Clone)]
pub enum AnyEmbedder {
    OpenAi(OpenAiEmbedder),
    Mock(MockEmbedder),
}

impl EmbeddingProvider for AnyEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        match self {
            Self::OpenAi(p) => p.embed(text).await,
            Self::Mock(p) => p.embed(text).await,
        }
    }

    fn dimension(&self) -> usize {
        match self {
            Self::OpenAi(p) => p.dimension(),
            Self::Mock(p) => p.dimension(),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::OpenAi(p) => p.name(),
            Self::Mock(p) => p.name(),
        }
    }
}
