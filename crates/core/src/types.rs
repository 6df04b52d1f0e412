//! Domain types for normalized documents and parsed quizzes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Uniform representation any supported document is reduced to.
///
/// All three sequences may be empty; an empty value is the defined result for
/// unsupported, transient and unreadable inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedContent {
    /// Text blocks in reading order (one per page, section or slide).
    pub text: Vec<String>,

    /// Embedded images in document order.
    pub images: Vec<ImageHandle>,

    /// Tables in document order.
    pub tables: Vec<TableBlock>,
}

impl NormalizedContent {
    /// The all-empty value.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when no text, images or tables were found.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.images.is_empty() && self.tables.is_empty()
    }

    /// Text blocks that contain something other than whitespace.
    pub fn non_blank_text(&self) -> impl Iterator<Item = &str> {
        self.text
            .iter()
            .map(String::as_str)
            .filter(|block| !block.trim().is_empty())
    }

    /// True if at least one text block has non-whitespace content.
    pub fn has_text(&self) -> bool {
        self.non_blank_text().next().is_some()
    }
}

/// An embedded image, kept as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHandle {
    /// Archive path or PDF object id the image was read from.
    pub name: String,

    /// Raw (still encoded) image bytes.
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl ImageHandle {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// A table as rows of cell texts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableBlock {
    pub rows: Vec<Vec<String>>,
}

impl TableBlock {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// True if every cell is blank.
    pub fn is_blank(&self) -> bool {
        self.rows
            .iter()
            .flatten()
            .all(|cell| cell.trim().is_empty())
    }
}

/// The container formats Quizzard can ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentFormat {
    /// Portable Document Format.
    Pdf,
    /// Word (Office Open XML).
    Docx,
    /// PowerPoint (Office Open XML).
    Pptx,
}

impl DocumentFormat {
    /// Every supported format.
    pub const ALL: [DocumentFormat; 3] = [Self::Pdf, Self::Docx, Self::Pptx];

    /// Detect format from file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            _ => None,
        }
    }

    /// Detect format from the text after the last `.` of a path's file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    /// Lowercase extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Pptx => "pptx",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_ascii_uppercase())
    }
}

/// A question number exactly as it appeared in the generated text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value, if it fits in a `u64`.
    pub fn number(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuestionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One of the four option identifiers of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    A,
    B,
    C,
    D,
}

impl Label {
    /// Labels in display order.
    pub const ALL: [Label; 4] = [Self::A, Self::B, Self::C, Self::D];

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'a' => Some(Self::A),
            'b' => Some(Self::B),
            'c' => Some(Self::C),
            'd' => Some(Self::D),
            _ => None,
        }
    }

    /// Parse a single lowercase letter.
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Self::A => 'a',
            Self::B => 'b',
            Self::C => 'c',
            Self::D => 'd',
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A parsed multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: QuestionId,
    pub prompt: String,
    pub options: BTreeMap<Label, String>,
}

impl QuizQuestion {
    pub fn new(id: QuestionId, prompt: impl Into<String>) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            options: BTreeMap::new(),
        }
    }

    /// Set the text of one option, replacing any earlier text for the label.
    pub fn with_option(mut self, label: Label, text: impl Into<String>) -> Self {
        self.options.insert(label, text.into());
        self
    }

    pub fn option(&self, label: Label) -> Option<&str> {
        self.options.get(&label).map(String::as_str)
    }
}

/// Questions keyed by id, in the order their ids first appeared.
pub type QuestionSet = IndexMap<QuestionId, QuizQuestion>;

/// Correct label per question id.
pub type AnswerKey = IndexMap<QuestionId, Label>;

/// Everything recovered from one generated response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub questions: QuestionSet,
    pub answers: AnswerKey,
}

impl Quiz {
    /// True when no question was recovered.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Questions in order, ready for a session.
    pub fn question_list(&self) -> Vec<QuizQuestion> {
        self.questions.values().cloned().collect()
    }

    /// Ids of questions the answer key says nothing about.
    pub fn questions_without_answer(&self) -> Vec<&QuestionId> {
        self.questions
            .keys()
            .filter(|id| !self.answers.contains_key(*id))
            .collect()
    }

    /// Ids in the answer key that name no parsed question.
    pub fn answers_without_question(&self) -> Vec<&QuestionId> {
        self.answers
            .keys()
            .filter(|id| !self.questions.contains_key(*id))
            .collect()
    }
}

impl fmt::Display for Quiz {
    /// Plain-text listing of the questions and their options.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, question) in self.questions.values().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}. {}", question.id, question.prompt)?;
            for (label, text) in &question.options {
                writeln!(f, "{}) {}", label, text)?;
            }
        }
        Ok(())
    }
}
