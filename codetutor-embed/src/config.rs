//! Configuration for embedding models

use serde::{Deserialize, Serialize};

/// Name of the default sentence-embedding model.
///
/// This is one of fastembed's built-in models; no separate download
/// configuration is needed.
pub const MINILM_L6: &str = "all-MiniLM-L6-v2";

/// Configuration for embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedConfig {
    /// Name of the embedding model to use (must be a built-in fastembed model)
    pub model_name: String,
    /// Maximum batch size for embedding generation
    pub batch_size: usize,
    /// Whether to normalize embeddings to unit length
    pub normalize: bool,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self::minilm_l6()
    }
}

impl EmbedConfig {
    /// Create a configuration for the given model name with default settings.
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            batch_size: 16,
            normalize: true,
        }
    }

    /// Configuration for the `all-MiniLM-L6-v2` sentence-embedding model.
    pub fn minilm_l6() -> Self {
        Self::new(MINILM_L6)
    }

    /// Set the batch size for embedding generation (builder style)
    pub fn with_batch_size(self, batch_size: usize) -> Self {
        Self { batch_size, ..self }
    }

    /// Set whether to normalize embeddings (builder style)
    pub fn with_normalize(self, normalize: bool) -> Self {
        Self { normalize, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_minilm() {
        let config = EmbedConfig::default();
        assert_eq!(config.model_name, "all-MiniLM-L6-v2");
        assert_eq!(config.batch_size, 16);
        assert!(config.normalize);
    }

    #[test]
    fn test_builder_style_setters() {
        let config = EmbedConfig::minilm_l6()
            .with_batch_size(4)
            .with_normalize(false);
        assert_eq!(config.batch_size, 4);
        assert!(!config.normalize);
    }
}
