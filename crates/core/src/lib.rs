//! Core domain types, content normalization, corpus aggregation, quiz output
//! parsing and quiz sessions for Quizzard.

pub mod corpus;
pub mod error;
pub mod generation;
pub mod normalize;
pub mod parser;
pub mod session;
pub mod text;
pub mod types;

pub use corpus::{list_dir, Corpus, CorpusAggregator};
pub use error::{Error, Result};
pub use generation::{
    build_prompt, mcq_instruction, query, Generator, DEFAULT_QUESTION_COUNT, NO_RESPONSE,
};
pub use normalize::{ContentNormalizer, Extractor};
pub use parser::{parse_answers, parse_questions, parse_quiz};
pub use session::{Grade, QuestionOutcome, QuizSession, SessionState};
pub use types::{
    AnswerKey, DocumentFormat, ImageHandle, Label, NormalizedContent, QuestionId, QuestionSet,
    Quiz, QuizQuestion, TableBlock,
};
