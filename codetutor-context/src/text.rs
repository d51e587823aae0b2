//! Delimiter-driven text splitting for retrieval.
//!
//! This module turns raw file content into bounded, overlapping chunks
//! suitable for embedding. Splitting is recursive: the text is segmented by
//! the most significant delimiter first (class/function boundaries for code,
//! paragraphs for prose) and only falls back to less significant delimiters
//! (lines, spaces) when a segment is still larger than the chunk budget.
//!
//! The two main types are:
//! - [`SplitterKind`]: picks a delimiter set from a file name suffix
//!   (`.py` and `.js` get language-aware sets, everything else is generic).
//! - [`TextSplitter`]: performs the actual segmentation and assembles
//!   segments into [`TextChunk`]s, carrying a configurable trailing overlap
//!   between adjacent chunks so context is not lost at chunk boundaries.
//!
//! # Usage
//!
//! ```
//! use codetutor_context::text::{SplitterKind, TextSplitter};
//!
//! let splitter = TextSplitter::for_file_name("src/train.py", 500, 50);
//! assert_eq!(splitter.kind(), SplitterKind::Python);
//!
//! let chunks = splitter.split("train.py", "def add(a, b):\n    return a + b\n");
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].sequence, 0);
//! ```
use regex::Regex;
use serde::Serialize;
use std::ops::Range;

/// Default maximum chunk length, in characters of input text.
pub const DEFAULT_CHUNK_SIZE: usize = 2000;

/// Default overlap between adjacent chunks of the same document.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Delimiters for Python sources, ordered from most to least significant.
///
/// Class and function definitions are the preferred break points; paragraph
/// and line breaks follow, with single spaces as the last resort.
pub const PYTHON_DELIMITERS: &[&str] = &[
    r"(?m)^class\s+\w+",    // Top-level class definitions
    r"(?m)^def\s+\w+",      // Top-level function definitions
    r"(?m)^\s+def\s+\w+",   // Methods
    r"\n\n",                // Blank-line separated blocks
    r"\n",                  // Line breaks
    r" ",                   // Spaces
];

/// Delimiters for JavaScript sources, ordered from most to least significant.
pub const JAVASCRIPT_DELIMITERS: &[&str] = &[
    r"(?m)^(export\s+)?(async\s+)?function\s*\*?\s*\w*", // Function declarations
    r"(?m)^(export\s+)?class\s+\w+",                     // Class declarations
    r"(?m)^\s*(const|let|var)\s+\w+",                    // Bindings
    r"\n\n",                                             // Blank-line separated blocks
    r"\n",                                               // Line breaks
    r" ",                                                // Spaces
];

/// Generic delimiters for everything that is not recognized source code:
/// paragraphs, then lines, then spaces.
pub const GENERIC_DELIMITERS: &[&str] = &[r"\n\n", r"\n", r" "];

/// Splitting strategy selected from a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SplitterKind {
    Python,
    JavaScript,
    Generic,
}

impl SplitterKind {
    /// Select the splitter kind for a file name.
    ///
    /// Only the suffix is inspected: `.py` gets the Python-aware set,
    /// `.js` the JavaScript-aware set, and anything else (including files
    /// without an extension) the generic set.
    pub fn for_file_name(file_name: &str) -> Self {
        if file_name.ends_with(".py") {
            SplitterKind::Python
        } else if file_name.ends_with(".js") {
            SplitterKind::JavaScript
        } else {
            SplitterKind::Generic
        }
    }

    /// The delimiter patterns this kind splits by, most significant first.
    pub fn delimiters(&self) -> &'static [&'static str] {
        match self {
            SplitterKind::Python => PYTHON_DELIMITERS,
            SplitterKind::JavaScript => JAVASCRIPT_DELIMITERS,
            SplitterKind::Generic => GENERIC_DELIMITERS,
        }
    }
}

/// A bounded span of a source document's text, produced for embedding.
///
/// Chunks from the same document are ordered by `sequence` and may share up
/// to the configured overlap with their neighbors.
#[derive(Debug, Clone, Serialize)]
pub struct TextChunk {
    /// Name of the file this chunk came from.
    pub file_name: String,
    /// 0-indexed position of this chunk within its document.
    pub sequence: usize,
    /// The chunk's text.
    pub text: String,
}

/// Splits file content into [`TextChunk`]s.
///
/// The splitter holds compiled delimiter regexes, a maximum chunk length and
/// an overlap length. Construction compiles the fixed pattern constants, so
/// it cannot fail at runtime.
pub struct TextSplitter {
    kind: SplitterKind,
    delimiters: Vec<Regex>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// Create a splitter with an explicit kind and limits.
    pub fn new(kind: SplitterKind, chunk_size: usize, chunk_overlap: usize) -> Self {
        let delimiters = kind
            .delimiters()
            .iter()
            .map(|&pattern| Regex::new(pattern).expect("fixed delimiter pattern must compile"))
            .collect();

        TextSplitter {
            kind,
            delimiters,
            chunk_size,
            chunk_overlap,
        }
    }

    /// Create a splitter whose kind is selected from the file name suffix.
    pub fn for_file_name(file_name: &str, chunk_size: usize, chunk_overlap: usize) -> Self {
        Self::new(
            SplitterKind::for_file_name(file_name),
            chunk_size,
            chunk_overlap,
        )
    }

    /// The strategy this splitter was built with.
    pub fn kind(&self) -> SplitterKind {
        self.kind
    }

    /// Split `content` into chunks of at most `chunk_size` characters.
    ///
    /// Segmentation is recursive over the delimiter list; segments are then
    /// assembled greedily. When a chunk fills up, the next chunk re-starts
    /// at an earlier segment boundary so that adjacent chunks share up to
    /// `chunk_overlap` trailing characters, without exceeding `chunk_size`.
    ///
    /// The returned chunks cover all of `content` in order; their `sequence`
    /// numbers ascend from 0.
    pub fn split(&self, file_name: &str, content: &str) -> Vec<TextChunk> {
        let segments = self.split_recursively_into_segments(content, 0, 0);

        let mut chunks: Vec<TextChunk> = Vec::new();
        let mut chunk_start_byte = 0;
        let mut chunk_end_byte = 0;

        for (idx, segment) in segments.iter().enumerate() {
            let segment_len = segment.end - segment.start;

            if chunk_end_byte > chunk_start_byte
                && chunk_end_byte - chunk_start_byte + segment_len > self.chunk_size
            {
                chunks.push(TextChunk {
                    file_name: file_name.to_string(),
                    sequence: chunks.len(),
                    text: content[chunk_start_byte..chunk_end_byte].to_string(),
                });

                // Segments are contiguous, so walking back from the current
                // segment start accumulates exactly the trailing text of the
                // chunk just closed. Stop before the overlap budget or the
                // chunk budget would be exceeded.
                let mut new_start = segment.start;
                for prev in segments[..idx].iter().rev() {
                    if segment.start - prev.start > self.chunk_overlap {
                        break;
                    }
                    if segment.end - prev.start > self.chunk_size {
                        break;
                    }
                    new_start = prev.start;
                }
                chunk_start_byte = new_start;
                chunk_end_byte = segment.end;
            } else {
                if chunk_start_byte == chunk_end_byte {
                    chunk_start_byte = segment.start;
                }
                chunk_end_byte = segment.end;
            }
        }

        if chunk_end_byte > chunk_start_byte {
            chunks.push(TextChunk {
                file_name: file_name.to_string(),
                sequence: chunks.len(),
                text: content[chunk_start_byte..chunk_end_byte].to_string(),
            });
        }

        chunks
    }

    // Recursively splits the text into byte ranges of the original content.
    // Each returned range is either small enough to fit a chunk or is a
    // delimiter match; ranges are contiguous and cover all of `text`.
    fn split_recursively_into_segments(
        &self,
        text: &str,
        delimiter_idx: usize,
        current_offset: usize,
    ) -> Vec<Range<usize>> {
        let mut result_segments: Vec<Range<usize>> = Vec::new();

        if text.is_empty() {
            return result_segments;
        }

        // Base case 1: the text already fits.
        if text.len() <= self.chunk_size {
            result_segments.push(current_offset..(current_offset + text.len()));
            return result_segments;
        }

        // Base case 2: delimiters exhausted; hard-split at char boundaries.
        if delimiter_idx >= self.delimiters.len() {
            let mut local_start = 0;
            while local_start < text.len() {
                let mut local_end = (local_start + self.chunk_size).min(text.len());
                while local_end > local_start && !text.is_char_boundary(local_end) {
                    local_end -= 1;
                }
                if local_end == local_start {
                    // A single char wider than the budget; take it whole.
                    local_end = local_start
                        + text[local_start..]
                            .chars()
                            .next()
                            .map(char::len_utf8)
                            .unwrap_or(1);
                }
                result_segments.push(current_offset + local_start..current_offset + local_end);
                local_start = local_end;
            }
            return result_segments;
        }

        let current_delimiter = &self.delimiters[delimiter_idx];
        let mut local_byte_start = 0;

        for mat in current_delimiter.find_iter(text) {
            if mat.start() > local_byte_start {
                let sub_text = &text[local_byte_start..mat.start()];
                result_segments.extend(self.split_recursively_into_segments(
                    sub_text,
                    delimiter_idx + 1,
                    current_offset + local_byte_start,
                ));
            }
            // The delimiter match itself becomes a segment.
            result_segments
                .push(current_offset + mat.range().start..current_offset + mat.range().end);
            local_byte_start = mat.end();
        }

        if local_byte_start < text.len() {
            let sub_text = &text[local_byte_start..];
            result_segments.extend(self.split_recursively_into_segments(
                sub_text,
                delimiter_idx + 1,
                current_offset + local_byte_start,
            ));
        }

        result_segments
    }
}
