//! codetutor-retriever: archive extraction and similarity retrieval
//!
//! This crate covers the two index-facing stages of the pipeline:
//!
//! - **[`extract`]**: unpack an uploaded zip archive into scoped scratch
//!   storage, walk the tree with directory and extension filtering, and
//!   produce UTF-8 [`extract::SourceDocument`]s.
//! - **[`vector_index`]**: embed chunks and hold them in an in-memory
//!   [`vector_index::VectorIndex`] that answers cosine-similarity top-k
//!   queries.
//!
//! ```text
//! zip bytes → Extractor → SourceDocuments → Chunker → VectorIndex
//!                                                         ↓
//!                                   query embedding → top-k chunks
//! ```
//!
//! The index has no persistence and no incremental update: each build
//! replaces the previous index wholesale.

pub mod extract;
pub mod vector_index;

pub use extract::{ExtractConfig, Extraction, SourceDocument, extract_archive};
pub use vector_index::{DEFAULT_TOP_K, IndexedVector, ScoredChunk, VectorIndex};
