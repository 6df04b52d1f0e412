//! Content normalization: format dispatch and the extractor contract.
//!
//! [`ContentNormalizer::normalize`] is total. Transient and unsupported files
//! short-circuit to an empty value, and any adapter failure (error or panic)
//! is logged and replaced by an empty value as well.

use crate::{DocumentFormat, NormalizedContent, Result};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

/// File name prefix office editors use for lock and temporary files.
pub const TRANSIENT_PREFIX: &str = "~$";

/// A per-format adapter turning a document into [`NormalizedContent`].
pub trait Extractor: Send + Sync {
    /// The format this adapter reads.
    fn format(&self) -> DocumentFormat;

    /// Extract content, reporting decode failures.
    fn extract(&self, path: &Path) -> Result<NormalizedContent>;

    /// Extract content, mapping any failure to the empty value.
    fn normalize(&self, path: &Path) -> NormalizedContent {
        match self.extract(path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!(
                    "{} extraction failed for {}: {}",
                    self.format(),
                    path.display(),
                    e
                );
                NormalizedContent::empty()
            }
        }
    }
}

/// Dispatches files to the adapter registered for their format.
#[derive(Default)]
pub struct ContentNormalizer {
    extractors: HashMap<DocumentFormat, Box<dyn Extractor>>,
}

impl ContentNormalizer {
    /// Create a normalizer with no adapters registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter, replacing any earlier one for the same format.
    pub fn with_extractor(mut self, extractor: impl Extractor + 'static) -> Self {
        self.extractors
            .insert(extractor.format(), Box::new(extractor));
        self
    }

    /// Formats that have an adapter.
    pub fn supported_formats(&self) -> Vec<DocumentFormat> {
        DocumentFormat::ALL
            .into_iter()
            .filter(|format| self.extractors.contains_key(format))
            .collect()
    }

    /// Classify a path by extension; `None` means unsupported.
    pub fn classify(path: &Path) -> Option<DocumentFormat> {
        DocumentFormat::from_path(path)
    }

    /// True if the base name marks an editor lock/temp file.
    pub fn is_transient(path: &Path) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy().starts_with(TRANSIENT_PREFIX))
            .unwrap_or(false)
    }

    /// Normalize a file. Never fails.
    pub fn normalize(&self, path: &Path) -> NormalizedContent {
        if Self::is_transient(path) {
            log::debug!("Skipping transient file {}", path.display());
            return NormalizedContent::empty();
        }

        let Some(format) = Self::classify(path) else {
            log::debug!("Skipping unsupported file {}", path.display());
            return NormalizedContent::empty();
        };

        let Some(extractor) = self.extractors.get(&format) else {
            log::warn!("No {} extractor registered, skipping {}", format, path.display());
            return NormalizedContent::empty();
        };

        log::debug!("Extracting {} as {}", path.display(), format);

        // Third-party decoders may panic on hostile input
        match panic::catch_unwind(AssertUnwindSafe(|| extractor.normalize(path))) {
            Ok(content) => content,
            Err(_) => {
                log::warn!("{} extractor panicked on {}", format, path.display());
                NormalizedContent::empty()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::Error;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Reads the file as UTF-8 and splits blocks on form feeds.
    pub(crate) struct PlainTextExtractor {
        pub(crate) format: DocumentFormat,
        pub(crate) calls: Arc<AtomicUsize>,
    }

    impl PlainTextExtractor {
        pub(crate) fn new(format: DocumentFormat) -> Self {
            Self {
                format,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Extractor for PlainTextExtractor {
        fn format(&self) -> DocumentFormat {
            self.format
        }

        fn extract(&self, path: &Path) -> Result<NormalizedContent> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let raw = std::fs::read_to_string(path)?;
            Ok(NormalizedContent {
                text: raw.split('\u{000C}').map(str::to_string).collect(),
                ..NormalizedContent::default()
            })
        }
    }

    struct FailingExtractor;

    impl Extractor for FailingExtractor {
        fn format(&self) -> DocumentFormat {
            DocumentFormat::Docx
        }

        fn extract(&self, _path: &Path) -> Result<NormalizedContent> {
            Err(Error::DocxParseError("missing word/document.xml".to_string()))
        }
    }

    struct PanickingExtractor;

    impl Extractor for PanickingExtractor {
        fn format(&self) -> DocumentFormat {
            DocumentFormat::Pptx
        }

        fn extract(&self, _path: &Path) -> Result<NormalizedContent> {
            panic!("malformed slide");
        }
    }

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            ContentNormalizer::classify(Path::new("a/b/notes.Pdf")),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(
            ContentNormalizer::classify(Path::new("essay.docx")),
            Some(DocumentFormat::Docx)
        );
        assert_eq!(ContentNormalizer::classify(Path::new("deck.ppt")), None);
        assert_eq!(ContentNormalizer::classify(Path::new("README")), None);
    }

    #[test]
    fn test_is_transient() {
        assert!(ContentNormalizer::is_transient(Path::new("~$report.docx")));
        assert!(ContentNormalizer::is_transient(Path::new("dir/~$slides.pptx")));
        assert!(!ContentNormalizer::is_transient(Path::new("dir/report~$.docx")));
        assert!(!ContentNormalizer::is_transient(Path::new("~/report.docx")));
    }

    #[test]
    fn test_normalize_dispatches_by_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "lecture.pdf", "Page one\u{000C}Page two");

        let normalizer =
            ContentNormalizer::new().with_extractor(PlainTextExtractor::new(DocumentFormat::Pdf));
        let content = normalizer.normalize(&path);

        assert_eq!(content.text, vec!["Page one", "Page two"]);
        assert!(content.images.is_empty());
        assert!(content.tables.is_empty());
    }

    #[test]
    fn test_transient_file_skips_extractor() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "~$lecture.pdf", "Lock file contents");

        let extractor = PlainTextExtractor::new(DocumentFormat::Pdf);
        let calls = Arc::clone(&extractor.calls);
        let normalizer = ContentNormalizer::new().with_extractor(extractor);

        assert!(normalizer.normalize(&path).is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_transient_prefix_wins_for_any_extension() {
        let dir = tempfile::tempdir().unwrap();
        let normalizer = ContentNormalizer::new()
            .with_extractor(PlainTextExtractor::new(DocumentFormat::Pdf))
            .with_extractor(PlainTextExtractor::new(DocumentFormat::Docx))
            .with_extractor(PlainTextExtractor::new(DocumentFormat::Pptx));

        for name in ["~$a.pdf", "~$b.DOCX", "~$c.pptx", "~$d.txt"] {
            let path = write(dir.path(), name, "Real looking text");
            assert!(normalizer.normalize(&path).is_empty(), "{}", name);
        }
    }

    #[test]
    fn test_unsupported_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "notes.txt", "Plain notes");

        let normalizer =
            ContentNormalizer::new().with_extractor(PlainTextExtractor::new(DocumentFormat::Pdf));
        assert!(normalizer.normalize(&path).is_empty());
    }

    #[test]
    fn test_missing_extractor_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "slides.pptx", "Slide text");

        let normalizer =
            ContentNormalizer::new().with_extractor(PlainTextExtractor::new(DocumentFormat::Pdf));
        assert!(normalizer.normalize(&path).is_empty());
        assert_eq!(normalizer.supported_formats(), vec![DocumentFormat::Pdf]);
    }

    #[test]
    fn test_extractor_error_is_empty() {
        let normalizer = ContentNormalizer::new().with_extractor(FailingExtractor);
        assert!(normalizer.normalize(Path::new("broken.docx")).is_empty());
    }

    #[test]
    fn test_extractor_panic_is_empty() {
        let normalizer = ContentNormalizer::new().with_extractor(PanickingExtractor);
        assert!(normalizer.normalize(Path::new("broken.pptx")).is_empty());
    }

    #[test]
    fn test_unreadable_file_is_empty() {
        let normalizer =
            ContentNormalizer::new().with_extractor(PlainTextExtractor::new(DocumentFormat::Pdf));
        assert!(normalizer.normalize(Path::new("/nonexistent/dir/missing.pdf")).is_empty());
    }
}
