//! Corpus aggregation: merging a batch of documents into one tagged buffer.

use crate::{ContentNormalizer, DocumentFormat, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Source-tagged text built from a batch of documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Corpus {
    text: String,
    sources: Vec<String>,
}

impl Corpus {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Names of the files that contributed text, in corpus order.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for Corpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Header line that introduces one file's text in the corpus.
pub fn section_header(name: &str) -> String {
    format!("=== {} ===", name)
}

/// Builds a [`Corpus`] from files using a [`ContentNormalizer`].
pub struct CorpusAggregator<'a> {
    normalizer: &'a ContentNormalizer,
}

impl<'a> CorpusAggregator<'a> {
    pub fn new(normalizer: &'a ContentNormalizer) -> Self {
        Self { normalizer }
    }

    /// Aggregate files in the given order.
    ///
    /// Paths that are not regular files or lack a supported suffix are
    /// skipped, as are files whose text is entirely blank.
    pub fn aggregate<P: AsRef<Path>>(&self, paths: &[P]) -> Corpus {
        let mut text = String::new();
        let mut sources = Vec::new();

        for path in paths {
            let path = path.as_ref();
            if !is_eligible(path) {
                log::debug!("Not aggregating {}", path.display());
                continue;
            }

            let content = self.normalizer.normalize(path);
            let blocks: Vec<&str> = content.non_blank_text().collect();
            if blocks.is_empty() {
                log::debug!("No text in {}", path.display());
                continue;
            }

            let name = file_name(path);
            text.push_str("\n\n");
            text.push_str(&section_header(&name));
            text.push('\n');
            text.push_str(&blocks.join("\n\n"));
            log::debug!("Added {} block(s) from {}", blocks.len(), name);
            sources.push(name);
        }

        Corpus {
            text: text.trim().to_string(),
            sources,
        }
    }

    /// Aggregate every entry of a directory, sorted by file name.
    pub fn aggregate_dir(&self, dir: &Path) -> Result<Corpus> {
        Ok(self.aggregate(&list_dir(dir)?))
    }
}

/// Directory entries sorted by file name.
pub fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

/// A regular file whose name ends in a supported suffix.
fn is_eligible(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let name = file_name(path).to_lowercase();
    DocumentFormat::ALL
        .iter()
        .any(|format| name.ends_with(&format!(".{}", format.extension())))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
