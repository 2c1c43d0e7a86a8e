//! Application configuration: TOML file with env-var overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub splitter: SplitterSettings,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct IndexConfig {
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_dimension")]
    pub embedding_dimension: u64,
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embed_base_url")]
    pub base_url: String,
    #[serde(default = "default_embed_model")]
    pub model: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Session token accepted at startup; mapped to `user_id`.
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_user")]
    pub user_id: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SplitterSettings {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,
    #[serde(default = "default_doc_chunk_size")]
    pub doc_chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_qdrant_url() -> String {
    "http://localhost:6334".into()
}
fn default_collection() -> String {
    "copilot_knowledge".into()
}
fn default_dimension() -> u64 {
    1024
}
fn default_sqlite_path() -> String {
    "lore.db".into()
}
fn default_embed_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_embed_model() -> String {
    "text-embedding-3-large".into()
}
fn default_bind() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8090
}
fn default_user() -> String {
    "default".into()
}
fn default_chunk_size() -> usize {
    2000
}
fn default_min_chunk_size() -> usize {
    100
}
fn default_doc_chunk_size() -> usize {
    500
}
fn default_chunk_overlap() -> usize {
    50
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            qdrant_url: default_qdrant_url(),
            collection: default_collection(),
            embedding_dimension: default_dimension(),
            sqlite_path: default_sqlite_path(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_embed_base_url(),
            model: default_embed_model(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            auth_token: None,
            user_id: default_user(),
        }
    }
}

impl Default for SplitterSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            min_chunk_size: default_min_chunk_size(),
            doc_chunk_size: default_doc_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str::<Self>(&content)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("LORE_QDRANT_URL") {
            self.index.qdrant_url = url;
        }
        if let Ok(path) = std::env::var("LORE_SQLITE_PATH") {
            self.index.sqlite_path = path;
        }
        if let Ok(url) = std::env::var("LORE_EMBED_BASE_URL") {
            self.embedding.base_url = url;
        }
        if let Ok(model) = std::env::var("LORE_EMBED_MODEL") {
            self.embedding.model = model;
        }
        if let Ok(token) = std::env::var("LORE_AUTH_TOKEN") {
            self.gateway.auth_token = Some(token);
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.index.embedding_dimension > 0,
            "embedding_dimension must be > 0"
        );
        anyhow::ensure!(self.splitter.chunk_size > 0, "chunk_size must be > 0");
        anyhow::ensure!(
            self.splitter.doc_chunk_size > 0,
            "doc_chunk_size must be > 0"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_missing() {
        let config = Config::load(Path::new("/no/such/config.toml")).unwrap();
        assert_eq!(config.index.collection, "copilot_knowledge");
        assert_eq!(config.index.embedding_dimension, 1024);
        assert_eq!(config.splitter.chunk_size, 2000);
        assert_eq!(config.splitter.chunk_overlap, 50);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[gateway]\nport = 9000\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.gateway.bind, "127.0.0.1");
        assert_eq!(config.index.collection, "copilot_knowledge");
    }

    #[test]
    fn invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[splitter]\nchunk_size = 0\n").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
