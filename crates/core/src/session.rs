//! Sequential quiz-taking session.

use crate::{AnswerKey, Error, Label, QuestionId, QuizQuestion, Result};
use indexmap::IndexMap;
use serde::Serialize;

/// Externally observable position of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    /// Showing the question at this zero-based index.
    InProgress(usize),
    /// Every question has been visited.
    Completed,
}

/// A caller-owned walk through a fixed list of questions.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    current_index: usize,
    submitted: bool,
    responses: IndexMap<QuestionId, Label>,
}

impl QuizSession {
    /// Start at the first question, not submitted.
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self {
            questions,
            current_index: 0,
            submitted: false,
            responses: IndexMap::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        if self.current_index < self.questions.len() {
            SessionState::InProgress(self.current_index)
        } else {
            SessionState::Completed
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// The question being shown, if any.
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.current_index)
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn responses(&self) -> &IndexMap<QuestionId, Label> {
        &self.responses
    }

    /// Move to the next question. No-op once completed.
    pub fn advance(&mut self) -> SessionState {
        if self.current_index < self.questions.len() {
            self.current_index += 1;
        }
        self.state()
    }

    /// Freeze the responses.
    pub fn submit(&mut self) {
        self.submitted = true;
    }

    /// Record the label chosen for the current question, replacing any
    /// earlier choice.
    pub fn select_option(&mut self, label: Label) -> Result<()> {
        if self.submitted {
            return Err(Error::QuizSubmitted);
        }
        let id = self
            .current_question()
            .map(|question| question.id.clone())
            .ok_or(Error::QuizCompleted)?;
        self.responses.insert(id, label);
        Ok(())
    }

    /// Compare the responses against an answer key.
    pub fn grade(&self, answers: &AnswerKey) -> Grade {
        let outcomes = self
            .questions
            .iter()
            .map(|question| {
                let outcome = match (answers.get(&question.id), self.responses.get(&question.id)) {
                    (None, _) => QuestionOutcome::NoKey,
                    (Some(_), None) => QuestionOutcome::Unanswered,
                    (Some(expected), Some(given)) if expected == given => QuestionOutcome::Correct,
                    (Some(_), Some(_)) => QuestionOutcome::Incorrect,
                };
                (question.id.clone(), outcome)
            })
            .collect();
        Grade { outcomes }
    }
}

/// Result of one question after grading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuestionOutcome {
    Correct,
    Incorrect,
    Unanswered,
    /// The answer key has no entry for this question.
    NoKey,
}

/// Per-question outcomes in question order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grade {
    pub outcomes: Vec<(QuestionId, QuestionOutcome)>,
}

impl Grade {
    pub fn correct(&self) -> usize {
        self.count(QuestionOutcome::Correct)
    }

    /// Questions that can be graded at all.
    pub fn gradable(&self) -> usize {
        self.outcomes.len() - self.count(QuestionOutcome::NoKey)
    }

    fn count(&self, wanted: QuestionOutcome) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == wanted)
            .count()
    }
}
