//! Integration tests for the session orchestrator.
//!
//! These tests exercise the full upload → process → ask sequence over
//! in-memory zip fixtures, with deterministic mock providers standing in
//! for the embedding model and the hosted LLM. The live end-to-end test at
//! the bottom needs network access and a GROQ_API_KEY and is `#[ignore]`d.

use anyhow::Result;
use async_trait::async_trait;
use codetutor_app::{AskOutcome, NO_INDEX_WARNING, Session, SessionConfig};
use codetutor_embed::{
    EmbedError, EmbeddingProvider, EmbeddingResult, MockEmbeddingProvider,
};
use codetutor_llm::MockProvider;
use half::f16;
use std::io::{Cursor, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use zip::write::SimpleFileOptions;

/// Build an in-memory zip archive from (entry name, content) pairs.
fn zip_fixture(files: &[(&str, &str)]) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = zip::ZipWriter::new(&mut cursor);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
    cursor.into_inner()
}

fn mock_session() -> Session<MockEmbeddingProvider, MockProvider> {
    Session::new(
        SessionConfig::default(),
        MockEmbeddingProvider::default(),
        MockProvider::default(),
    )
}

#[tokio::test]
async fn test_single_python_file_reports_one_document() -> Result<()> {
    let mut session = mock_session();
    let archive = zip_fixture(&[("main.py", "def add(a, b): return a + b")]);

    let report = session.process_archive(archive).await?;

    assert_eq!(report.documents, 1);
    assert!(report.chunks >= 1);
    assert_eq!(report.skipped_files, 0);
    assert!(session.has_index());
    Ok(())
}

#[tokio::test]
async fn test_ask_before_processing_warns_without_network() -> Result<()> {
    let llm = MockProvider::default();
    let session = Session::new(
        SessionConfig::default(),
        MockEmbeddingProvider::default(),
        llm.clone(),
    );

    let outcome = session.ask("what does this project do?").await?;

    assert_eq!(outcome, AskOutcome::NotReady);
    assert_eq!(NO_INDEX_WARNING, "Please upload a .zip file first.");
    assert_eq!(llm.calls(), 0, "no provider call may happen without an index");
    Ok(())
}

#[tokio::test]
async fn test_retrieved_context_reaches_the_prompt() -> Result<()> {
    let llm = MockProvider::with_responses(vec!["The answer is 42.".into()]);
    let mut session = Session::new(
        SessionConfig::default(),
        MockEmbeddingProvider::default(),
        llm.clone(),
    );

    let archive = zip_fixture(&[("answer.txt", "The answer to everything is 42.")]);
    session.process_archive(archive).await?;

    let outcome = session.ask("What is the answer to everything?").await?;

    assert_eq!(outcome, AskOutcome::Answer("The answer is 42.".into()));
    assert_eq!(llm.calls(), 1);

    let sent = llm.last_messages();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].content.contains("The answer to everything is 42."));
    assert!(sent[0].content.contains("What is the answer to everything?"));
    Ok(())
}

#[tokio::test]
async fn test_reprocessing_replaces_the_index_wholesale() -> Result<()> {
    let llm = MockProvider::default();
    let mut session = Session::new(
        SessionConfig::default(),
        MockEmbeddingProvider::default(),
        llm.clone(),
    );

    let first = zip_fixture(&[("alpha.txt", "alpha describes the first upload")]);
    session.process_archive(first).await?;

    let second = zip_fixture(&[("beta.txt", "beta describes the second upload")]);
    session.process_archive(second).await?;

    session.ask("what does the upload describe?").await?;

    let sent = llm.last_messages();
    assert!(sent[0].content.contains("beta describes the second upload"));
    assert!(
        !sent[0].content.contains("alpha describes the first upload"),
        "content from a replaced index must not be retrievable"
    );
    Ok(())
}

#[tokio::test]
async fn test_corrupt_archive_is_surfaced_and_leaves_no_index() -> Result<()> {
    let mut session = mock_session();

    let result = session.process_archive(b"definitely not a zip".to_vec()).await;

    assert!(result.is_err());
    assert!(!session.has_index());
    Ok(())
}

/// Embedding provider that can be switched into a failing mode mid-test.
struct FlakyEmbedder {
    inner: MockEmbeddingProvider,
    fail: Arc<AtomicBool>,
}

#[async_trait]
impl EmbeddingProvider for FlakyEmbedder {
    async fn embed_text(&self, text: &str) -> codetutor_embed::Result<Vec<f16>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(EmbedError::invalid_config("injected embedding failure"));
        }
        self.inner.embed_text(text).await
    }

    async fn embed_texts(&self, texts: &[String]) -> codetutor_embed::Result<EmbeddingResult> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(EmbedError::invalid_config("injected embedding failure"));
        }
        self.inner.embed_texts(texts).await
    }

    fn embedding_dimension(&self) -> usize {
        self.inner.embedding_dimension()
    }

    fn provider_name(&self) -> &str {
        "flaky"
    }
}

#[tokio::test]
async fn test_failed_rebuild_keeps_the_previous_index() -> Result<()> {
    let fail = Arc::new(AtomicBool::new(false));
    let llm = MockProvider::default();
    let mut session = Session::new(
        SessionConfig::default(),
        FlakyEmbedder {
            inner: MockEmbeddingProvider::default(),
            fail: fail.clone(),
        },
        llm.clone(),
    );

    let first = zip_fixture(&[("alpha.txt", "alpha describes the first upload")]);
    session.process_archive(first).await?;

    fail.store(true, Ordering::SeqCst);
    let second = zip_fixture(&[("beta.txt", "beta describes the second upload")]);
    let result = session.process_archive(second).await;
    assert!(result.is_err());

    // The failed rebuild must not have clobbered the working index.
    fail.store(false, Ordering::SeqCst);
    assert!(session.has_index());
    session.ask("what does the upload describe?").await?;
    let sent = llm.last_messages();
    assert!(sent[0].content.contains("alpha describes the first upload"));
    Ok(())
}

#[tokio::test]
async fn test_llm_failure_propagates_but_index_survives() -> Result<()> {
    let mut session = Session::new(
        SessionConfig::default(),
        MockEmbeddingProvider::default(),
        MockProvider::failing(),
    );

    let archive = zip_fixture(&[("doc.md", "# some documentation")]);
    session.process_archive(archive).await?;

    let result = session.ask("what is documented?").await;
    assert!(result.is_err());
    assert!(session.has_index());
    Ok(())
}

#[tokio::test]
async fn test_ignored_directories_do_not_reach_the_index() -> Result<()> {
    let llm = MockProvider::default();
    let mut session = Session::new(
        SessionConfig::default(),
        MockEmbeddingProvider::default(),
        llm.clone(),
    );

    let archive = zip_fixture(&[
        ("src/app.py", "application entry point lives here"),
        ("node_modules/pkg/index.js", "vendored dependency code"),
    ]);
    let report = session.process_archive(archive).await?;

    assert_eq!(report.documents, 1);

    session.ask("where is the vendored dependency code?").await?;
    let sent = llm.last_messages();
    assert!(!sent[0].content.contains("vendored dependency code"));
    Ok(())
}

/// Live end-to-end run against the real embedding model and the hosted LLM.
///
/// Needs network access and GROQ_API_KEY. Run with:
/// `GROQ_API_KEY=... cargo test -p codetutor-app -- --ignored`
#[tokio::test]
#[ignore]
async fn test_live_answer_is_grounded_in_the_archive() -> Result<()> {
    use codetutor_embed::{EmbedConfig, FastEmbedProvider};
    use codetutor_llm::groq::{DEFAULT_BASE_URL, DEFAULT_MODEL, GroqProvider};

    let embedder = FastEmbedProvider::create(EmbedConfig::minilm_l6()).await?;
    let llm = GroqProvider::from_env(DEFAULT_BASE_URL.into(), DEFAULT_MODEL.into(), 1024)?;
    let mut session = Session::new(SessionConfig::default(), embedder, llm);

    let archive = zip_fixture(&[("facts.txt", "The answer to everything is 42.")]);
    session.process_archive(archive).await?;

    match session.ask("What is the answer to everything?").await? {
        AskOutcome::Answer(answer) => assert!(answer.contains("42"), "got: {answer}"),
        AskOutcome::NotReady => panic!("index was just built"),
    }

    // A question the archive cannot answer should be declined, not invented.
    match session.ask("What is the capital of France?").await? {
        AskOutcome::Answer(answer) => {
            assert!(answer.to_lowercase().contains("know"), "got: {answer}")
        }
        AskOutcome::NotReady => panic!("index was just built"),
    }

    Ok(())
}
