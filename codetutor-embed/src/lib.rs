//! # codetutor-embed
//!
//! Text embedding generation for the codetutor pipeline, built on local ONNX
//! models via FastEmbed. The crate exposes a small async provider trait so
//! the rest of the system never touches the inference runtime directly.
//!
//! ## Features
//!
//! - **Local ONNX inference**: embeddings are computed in-process, no
//!   external API calls
//! - **Model caching**: initialized models are cached process-wide and
//!   shared between providers with the same configuration
//! - **Half-precision output**: vectors are normalized and stored as f16
//!
//! ## Quick Start
//!
//! ```no_run
//! use codetutor_embed::{EmbedConfig, EmbeddingProvider, FastEmbedProvider};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = FastEmbedProvider::create(EmbedConfig::minilm_l6()).await?;
//!
//! let texts = vec!["fn main() {}".to_string()];
//! let result = provider.embed_texts(&texts).await?;
//! println!("{} vectors of dimension {}", result.len(), result.dimension);
//! # Ok(())
//! # }
//! ```
//!
//! All operations return [`Result<T>`] using the crate's [`EmbedError`]
//! type. Unknown model names fail at initialization, before any inference.

pub mod config;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod provider;

// Re-export main types for easy access
pub use config::EmbedConfig;
pub use error::{EmbedError, Result};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbeddingProvider;
pub use provider::{EmbeddingProvider, EmbeddingResult, FastEmbedProvider};
