//! Error types for document ingestion, generation and quiz sessions.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or taking a quiz.
///
/// Most of these never reach the caller of the pipeline: the normalizer and
/// the generation query turn them into empty values. They are still surfaced
/// by the individual adapters so they can be logged and tested.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse the PDF document structure.
    #[error("PDF parsing error: {0}")]
    PdfParseError(String),

    /// Failed to parse the DOCX file structure.
    #[error("DOCX parsing error: {0}")]
    DocxParseError(String),

    /// Failed to parse the PPTX file structure.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// ZIP archive error (for DOCX/PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for DOCX/PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// The generation backend failed or returned an unusable response.
    #[error("Generation error: {0}")]
    GenerationError(String),

    /// The quiz was already submitted; responses are frozen.
    #[error("Quiz already submitted")]
    QuizSubmitted,

    /// Every question has been visited; there is no current question.
    #[error("Quiz already completed")]
    QuizCompleted,
}
