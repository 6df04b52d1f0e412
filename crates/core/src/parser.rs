//! Recovery of a typed quiz from loosely formatted generated text.
//!
//! Expected shape of the input:
//!
//! ```text
//! ### Questions:
//! 1. Question text here?
//!    a) Option 1
//!    b) Option 2
//!    c) Option 3
//!    d) Option 4
//!
//! ### Answers:
//! { "1": "b" }
//! ```
//!
//! Questions and answers are recovered by two independent passes. Neither
//! pass fails: text that does not fit the shape is ignored, so the worst case
//! is an empty [`Quiz`].

use crate::{AnswerKey, Label, QuestionId, QuestionSet, Quiz, QuizQuestion};
use regex::Regex;
use std::sync::LazyLock;

/// A numbered question followed by its four option lines, in order.
///
/// The number may sit after markup such as `**` or `Q`, but never after
/// another digit. Each piece is confined to one line so an incomplete block
/// can never swallow the lines of the next question.
static QUESTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)(?:^|[^0-9])([0-9]+)\.[ \t]+([^\n]*)\n\s*a\)([^\n]*)\n\s*b\)([^\n]*)\n\s*c\)([^\n]*)\n\s*d\)([^\n]*)",
    )
    .unwrap()
});

/// The first brace-delimited region, possibly spanning lines.
static ANSWER_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{(.*?)\}").unwrap());

/// One `"id": "label"` pair inside the answer block.
static ANSWER_ENTRY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([0-9]+)"\s*:\s*"([a-d])""#).unwrap());

/// Parse both questions and answers.
pub fn parse_quiz(text: &str) -> Quiz {
    let quiz = Quiz {
        questions: parse_questions(text),
        answers: parse_answers(text),
    };
    log::debug!(
        "Parsed {} question(s) and {} answer(s)",
        quiz.questions.len(),
        quiz.answers.len()
    );
    quiz
}

/// Extract every complete question block.
///
/// A repeated id replaces the earlier question's content.
pub fn parse_questions(text: &str) -> QuestionSet {
    let text = text.replace("\r\n", "\n");
    let mut questions = QuestionSet::new();

    for caps in QUESTION_REGEX.captures_iter(&text) {
        let id = QuestionId::new(&caps[1]);
        let mut question = QuizQuestion::new(id.clone(), strip_emphasis(&caps[2]));
        for (label, group) in Label::ALL.into_iter().zip(3usize..=6) {
            question.options.insert(label, caps[group].trim().to_string());
        }

        if questions.insert(id, question).is_some() {
            log::debug!("Question {} appears more than once, keeping the last", &caps[1]);
        }
    }

    questions
}

/// Question text without surrounding whitespace or trailing `**`/`*`.
fn strip_emphasis(prompt: &str) -> &str {
    prompt.trim().trim_end_matches('*').trim_end()
}

/// Extract the answer key from the first `{ ... }` region.
///
/// No region means no answers.
pub fn parse_answers(text: &str) -> AnswerKey {
    let mut answers = AnswerKey::new();

    let Some(block) = ANSWER_BLOCK_REGEX.captures(text) else {
        log::debug!("No answer block found");
        return answers;
    };

    for caps in ANSWER_ENTRY_REGEX.captures_iter(&block[1]) {
        if let Some(label) = Label::parse(&caps[2]) {
            answers.insert(QuestionId::new(&caps[1]), label);
        }
    }

    answers
}
