//! Test-only mock embedding provider.

use crate::error::EmbedError;
use crate::provider::EmbeddingProvider;

#[derive(Debug, Clone)]
pub struct MockEmbedder {
    pub embedding: Vec<f32>,
    pub fail: bool,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self {
            embedding: vec![0.0; 384],
            fail: false,
        }
    }
}

impl MockEmbedder {
    #[must_use]
    pub fn with_vector(embedding: Vec<f32>) -> Self {
        Self {
            embedding,
            fail: false,
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedError> {
        if self.fail {
            return Err(EmbedError::Unsupported {
                provider: "mock".into(),
            });
        }
        Ok(self.embedding.clone())
    }

    fn dimension(&self) -> usize {
        self.embedding.len()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}
