//! Zip upload extraction and file filtering.
//!
//! An uploaded archive is unpacked into a [`tempfile::TempDir`]; the guard
//! removes the scratch space on every exit path, including errors. The
//! extracted tree is walked with two filters applied:
//!
//! - directories whose name is on the denylist are pruned entirely, so
//!   nothing beneath them is ever visited;
//! - only files whose extension is on the allowlist are read.
//!
//! Files that cannot be read or are not valid UTF-8 are skipped and counted,
//! never fatal. A corrupt archive, by contrast, is an error: there is
//! nothing sensible to extract from it.

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::ZipArchive;

/// Filtering configuration for archive extraction.
///
/// Both sets are data rather than hard-coded match arms so deployments can
/// adjust them (e.g. from a TOML file) without touching the walk logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Directory names pruned from traversal entirely, at any depth.
    pub ignored_dirs: BTreeSet<String>,
    /// File extensions (without the leading dot) that are read as text.
    pub allowed_extensions: BTreeSet<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        let ignored_dirs = [
            "venv",
            "env",
            ".git",
            "__pycache__",
            "node_modules",
            "etc",
            "Include",
            "Lib",
            "Scripts",
            "share",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let allowed_extensions = ["py", "js", "md", "txt", "json"]
            .into_iter()
            .map(String::from)
            .collect();

        Self {
            ignored_dirs,
            allowed_extensions,
        }
    }
}

impl ExtractConfig {
    fn is_allowed_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.allowed_extensions.contains(ext))
    }
}

/// One accepted file from an uploaded archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Path relative to the archive root.
    pub path: PathBuf,
    /// Bare file name, used for splitter selection and chunk attribution.
    pub file_name: String,
    /// The file's UTF-8 content.
    pub text: String,
}

/// Result of extracting one archive.
#[derive(Debug)]
pub struct Extraction {
    /// Accepted documents, ordered by relative path.
    pub documents: Vec<SourceDocument>,
    /// Files matching the allowlist that could not be read or decoded.
    pub skipped_files: usize,
}

/// Unpack `bytes` as a zip archive and collect its text-like files.
///
/// Documents are sorted by relative path, so the result is independent of
/// scratch-directory naming and filesystem traversal order.
///
/// # Errors
///
/// Fails if the bytes are not a readable zip archive or the scratch
/// directory cannot be created. Per-file read/decode failures are not
/// errors; they are counted in [`Extraction::skipped_files`].
pub fn extract_archive(bytes: &[u8], config: &ExtractConfig) -> Result<Extraction> {
    let scratch = TempDir::new().context("failed to create extraction scratch directory")?;

    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .context("failed to read upload as a zip archive")?;
    archive
        .extract(scratch.path())
        .context("failed to unpack the zip archive")?;

    let ignored = config.ignored_dirs.clone();
    let walker = WalkBuilder::new(scratch.path())
        .standard_filters(false)
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            if is_dir {
                let name = entry.file_name().to_string_lossy();
                return !ignored.contains(name.as_ref());
            }
            true
        })
        .build();

    let mut documents = Vec::new();
    let mut skipped_files = 0usize;

    for entry in walker {
        let entry = entry.context("failed to walk the extracted archive")?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        if !config.is_allowed_file(path) {
            continue;
        }

        let relative = path
            .strip_prefix(scratch.path())
            .unwrap_or(path)
            .to_path_buf();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match std::fs::read(path) {
            Ok(raw) => match String::from_utf8(raw) {
                Ok(text) => documents.push(SourceDocument {
                    path: relative,
                    file_name,
                    text,
                }),
                Err(_) => {
                    skipped_files += 1;
                    tracing::warn!("skipping non-UTF-8 file: {}", relative.display());
                }
            },
            Err(err) => {
                skipped_files += 1;
                tracing::warn!("skipping unreadable file {}: {err}", relative.display());
            }
        }
    }

    documents.sort_by(|a, b| a.path.cmp(&b.path));

    tracing::info!(
        documents = documents.len(),
        skipped = skipped_files,
        "archive extraction complete"
    );

    Ok(Extraction {
        documents,
        skipped_files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    /// Build an in-memory zip archive from (entry name, content) pairs.
    fn zip_fixture(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, content) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_disallowed_extensions_produce_no_documents() {
        let archive = zip_fixture(&[
            ("binary.exe", b"\x7fELF"),
            ("image.png", b"\x89PNG"),
            ("notes.rst", b"plain enough, wrong extension"),
        ]);
        let extraction = extract_archive(&archive, &ExtractConfig::default()).unwrap();
        assert!(extraction.documents.is_empty());
        assert_eq!(extraction.skipped_files, 0);
    }

    #[test]
    fn test_ignored_directories_are_pruned_at_any_depth() {
        let archive = zip_fixture(&[
            ("src/app.js", b"console.log('hi');"),
            ("node_modules/pkg/index.js", b"module.exports = {};"),
            ("venv/lib/python3/site-packages/mod.py", b"x = 1"),
            ("nested/.git/config.txt", b"[core]"),
        ]);
        let extraction = extract_archive(&archive, &ExtractConfig::default()).unwrap();

        let paths: Vec<String> = extraction
            .documents
            .iter()
            .map(|d| d.path.to_string_lossy().into_owned())
            .collect();
        assert_eq!(paths, vec!["src/app.js".to_string()]);
    }

    #[test]
    fn test_undecodable_file_is_skipped_and_counted() {
        let archive = zip_fixture(&[
            ("good.txt", b"readable text"),
            ("bad.txt", &[0xff, 0xfe, 0xfd]),
        ]);
        let extraction = extract_archive(&archive, &ExtractConfig::default()).unwrap();

        assert_eq!(extraction.documents.len(), 1);
        assert_eq!(extraction.documents[0].file_name, "good.txt");
        assert_eq!(extraction.skipped_files, 1);
    }

    #[test]
    fn test_extraction_is_idempotent_across_runs() {
        let archive = zip_fixture(&[
            ("b/second.py", b"print('second')"),
            ("a/first.md", b"# first"),
            ("readme.txt", b"hello"),
        ]);
        let config = ExtractConfig::default();

        let first = extract_archive(&archive, &config).unwrap();
        let second = extract_archive(&archive, &config).unwrap();

        assert_eq!(first.documents, second.documents);
        // Ordered by relative path, not by archive entry order.
        let paths: Vec<_> = first
            .documents
            .iter()
            .map(|d| d.path.to_string_lossy().into_owned())
            .collect();
        assert_eq!(paths, vec!["a/first.md", "b/second.py", "readme.txt"]);
    }

    #[test]
    fn test_single_python_file() {
        let archive = zip_fixture(&[("main.py", b"def add(a, b): return a + b")]);
        let extraction = extract_archive(&archive, &ExtractConfig::default()).unwrap();

        assert_eq!(extraction.documents.len(), 1);
        let doc = &extraction.documents[0];
        assert_eq!(doc.file_name, "main.py");
        assert_eq!(doc.text, "def add(a, b): return a + b");
    }

    #[test]
    fn test_corrupt_archive_is_an_error() {
        let result = extract_archive(b"definitely not a zip", &ExtractConfig::default());
        assert!(result.is_err());
    }
}
