//! The single-session orchestrator.

use anyhow::{Context, Result};
use codetutor_context::TextSplitter;
use codetutor_embed::EmbeddingProvider;
use codetutor_llm::{LlmProvider, synthesize_answer};
use codetutor_retriever::{VectorIndex, extract_archive};
use tracing::info;

use crate::SessionConfig;

/// Warning shown when a question arrives before any archive was processed.
pub const NO_INDEX_WARNING: &str = "Please upload a .zip file first.";

/// Counts reported after a successful processing action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessReport {
    /// Accepted source documents.
    pub documents: usize,
    /// Chunks embedded into the index.
    pub chunks: usize,
    /// Allowlisted files that could not be read or decoded.
    pub skipped_files: usize,
}

/// Result of a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskOutcome {
    /// Synthesized answer text.
    Answer(String),
    /// No index exists yet; show [`NO_INDEX_WARNING`] instead of answering.
    NotReady,
}

/// Holds the one piece of per-session state - the current index - and
/// sequences user actions through the pipeline.
///
/// The index is only replaced at the end of a fully successful
/// [`process_archive`](Session::process_archive); any failure along the way
/// leaves the previous index (if any) in place.
pub struct Session<E, L> {
    config: SessionConfig,
    embedder: E,
    llm: L,
    index: Option<VectorIndex>,
}

impl<E, L> Session<E, L>
where
    E: EmbeddingProvider,
    L: LlmProvider,
{
    pub fn new(config: SessionConfig, embedder: E, llm: L) -> Self {
        Self {
            config,
            embedder,
            llm,
            index: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether a processed index is installed.
    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    /// Extract, chunk, embed and index an uploaded archive, replacing any
    /// previously installed index wholesale.
    ///
    /// # Errors
    ///
    /// Fails on a corrupt archive or an embedding failure; in both cases the
    /// prior index is untouched.
    pub async fn process_archive(&mut self, bytes: Vec<u8>) -> Result<ProcessReport> {
        let extract_config = self.config.extract.clone();
        let extraction =
            tokio::task::spawn_blocking(move || extract_archive(&bytes, &extract_config))
                .await
                .context("extraction task failed")??;

        info!("Found {} files", extraction.documents.len());

        let mut chunks = Vec::new();
        for doc in &extraction.documents {
            let splitter = TextSplitter::for_file_name(
                &doc.file_name,
                self.config.chunk_size,
                self.config.chunk_overlap,
            );
            tracing::debug!(
                file = %doc.file_name,
                kind = ?splitter.kind(),
                "splitting document"
            );
            chunks.extend(splitter.split(&doc.file_name, &doc.text));
        }

        let report = ProcessReport {
            documents: extraction.documents.len(),
            chunks: chunks.len(),
            skipped_files: extraction.skipped_files,
        };

        let index = VectorIndex::build(&self.embedder, chunks)
            .await
            .context("failed to build the vector index")?;

        // Install only after the full build succeeded.
        self.index = Some(index);

        info!(
            documents = report.documents,
            chunks = report.chunks,
            skipped = report.skipped_files,
            "archive processed"
        );

        Ok(report)
    }

    /// Answer a question from the current index.
    ///
    /// Returns [`AskOutcome::NotReady`] when nothing has been processed yet;
    /// no retrieval and no network call happens in that case.
    ///
    /// # Errors
    ///
    /// Propagates embedding and LLM failures; the index stays intact.
    pub async fn ask(&self, question: &str) -> Result<AskOutcome> {
        let Some(index) = &self.index else {
            return Ok(AskOutcome::NotReady);
        };

        let query_embedding = self
            .embedder
            .embed_text(question)
            .await
            .context("failed to embed the question")?;

        let hits = index.search(&query_embedding, self.config.top_k);
        let contexts: Vec<&str> = hits.iter().map(|h| h.chunk.text.as_str()).collect();

        tracing::debug!(retrieved = contexts.len(), "answering question");

        let answer = synthesize_answer(&self.llm, question, &contexts).await?;
        Ok(AskOutcome::Answer(answer))
    }
}
