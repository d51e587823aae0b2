//! Session orchestration for the codetutor CLI.
//!
//! The library half of the binary: [`SessionConfig`] gathers every tunable
//! of the pipeline (filter sets, chunking limits, retrieval depth), and
//! [`Session`] sequences the two user actions over them:
//!
//! - **process**: extract → chunk → embed → install the new index
//! - **ask**: embed question → retrieve top-k → synthesize an answer
//!
//! A [`Session`] owns its index; separate sessions are fully independent.

pub mod session;

use anyhow::{Context, Result};
use codetutor_context::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use codetutor_retriever::{DEFAULT_TOP_K, ExtractConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use session::{AskOutcome, NO_INDEX_WARNING, ProcessReport, Session};

/// Pipeline configuration for one session.
///
/// Every field has a working default, so a config file only needs to name
/// what it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Archive filtering (directory denylist, extension allowlist).
    pub extract: ExtractConfig,
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Overlap between adjacent chunks of one document.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            extract: ExtractConfig::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl SessionConfig {
    /// Load a session configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}
