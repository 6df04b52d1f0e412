//! Prompt construction and the boundary to the text generation backend.

use crate::Result;

/// Text returned in place of a response when generation produced nothing.
///
/// The parser recovers no questions and no answers from it.
pub const NO_RESPONSE: &str = "No response from Gemini.";

/// Number of questions requested when the caller does not say otherwise.
pub const DEFAULT_QUESTION_COUNT: usize = 10;

/// A backend that turns a corpus and an instruction into raw text.
pub trait Generator {
    /// `Ok(None)` means the backend answered but produced no text.
    fn generate(&self, corpus: &str, instruction: &str) -> Result<Option<String>>;
}

/// Full prompt sent to the model.
pub fn build_prompt(corpus: &str, instruction: &str) -> String {
    format!(
        "Based on the following document:\n\n{}\n\n{}",
        corpus, instruction
    )
}

/// Instruction asking for `count` multiple-choice questions in the format
/// understood by [`parse_quiz`](crate::parse_quiz).
pub fn mcq_instruction(count: usize) -> String {
    let count = count.max(1);
    let mut instruction = format!(
        "Generate {} multiple-choice questions (MCQs) from this document. \n\n",
        count
    );
    instruction.push_str("Format the output exactly as follows:\n\n");
    instruction.push_str("### Questions:\n");
    for n in 1..=count.min(2) {
        instruction.push_str(&format!(
            "{}. Question text here?\n   a) Option 1\n   b) Option 2\n   c) Option 3\n   d) Option 4\n\n",
            n
        ));
    }
    if count > 2 {
        instruction.push_str(&format!("...(repeat for {} questions)\n\n", count));
    }
    instruction.push_str("### Answers:\n");
    instruction.push_str(&answer_example(count));
    instruction.push_str("\n\nEnsure that:\n");
    instruction.push_str("- Each question has 4 answer choices labeled (a, b, c, d).\n");
    instruction.push_str(
        "- The correct answer should be provided in a JSON dictionary format separately.\n",
    );
    instruction.push_str(
        "- Do not add extra text, explanations, or formatting beyond the requested structure.\n\n",
    );
    instruction.push_str("Return only the questions and answers in the specified format.");
    instruction
}

/// Example answer map shown to the model, e.g. `{ "1": "b", "2": "d", ..., "10": "c" }`.
fn answer_example(count: usize) -> String {
    const SAMPLE: [char; 3] = ['b', 'd', 'a'];
    let shown = count.min(3);
    let mut entries: Vec<String> = (1..=shown)
        .map(|n| format!("\"{}\": \"{}\"", n, SAMPLE[n - 1]))
        .collect();
    if count > shown {
        entries.push("...".to_string());
        entries.push(format!("\"{}\": \"c\"", count));
    }
    format!("{{ {} }}", entries.join(", "))
}

/// Ask the generator for a response, falling back to [`NO_RESPONSE`].
///
/// An empty corpus is not sent at all.
pub fn query(generator: &dyn Generator, corpus: &str, instruction: &str) -> String {
    if corpus.trim().is_empty() {
        log::warn!("Empty corpus, skipping generation");
        return NO_RESPONSE.to_string();
    }

    match generator.generate(corpus, instruction) {
        Ok(Some(text)) if !text.trim().is_empty() => text,
        Ok(_) => {
            log::warn!("Generator returned no text");
            NO_RESPONSE.to_string()
        }
        Err(e) => {
            log::warn!("Generation failed: {}", e);
            NO_RESPONSE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_quiz, Error};
    use std::cell::Cell;

    struct Scripted {
        reply: fn() -> Result<Option<String>>,
        calls: Cell<usize>,
    }

    impl Scripted {
        fn new(reply: fn() -> Result<Option<String>>) -> Self {
            Self {
                reply,
                calls: Cell::new(0),
            }
        }
    }

    impl Generator for Scripted {
        fn generate(&self, _corpus: &str, _instruction: &str) -> Result<Option<String>> {
            self.calls.set(self.calls.get() + 1);
            (self.reply)()
        }
    }

    #[test]
    fn test_build_prompt() {
        assert_eq!(
            build_prompt("=== a.pdf ===\nText", "Do it."),
            "Based on the following document:\n\n=== a.pdf ===\nText\n\nDo it."
        );
    }

    #[test]
    fn test_mcq_instruction_default_count() {
        let instruction = mcq_instruction(DEFAULT_QUESTION_COUNT);

        assert!(instruction.starts_with("Generate 10 multiple-choice questions"));
        assert!(instruction.contains("1. Question text here?\n   a) Option 1\n"));
        assert!(instruction.contains("...(repeat for 10 questions)"));
        assert!(instruction.contains("### Answers:\n{ \"1\": \"b\", \"2\": \"d\", \"3\": \"a\", ..., \"10\": \"c\" }"));
        assert!(instruction.ends_with("Return only the questions and answers in the specified format."));
    }

    #[test]
    fn test_mcq_instruction_small_count() {
        let instruction = mcq_instruction(1);

        assert!(instruction.starts_with("Generate 1 multiple-choice questions"));
        assert!(!instruction.contains("2. Question text here?"));
        assert!(!instruction.contains("repeat for"));
        assert!(instruction.contains("{ \"1\": \"b\" }"));
    }

    #[test]
    fn test_instruction_example_parses() {
        // The example in the instruction follows the format the parser expects
        let instruction = mcq_instruction(2);
        let quiz = parse_quiz(&instruction);
        assert_eq!(quiz.questions.len(), 2);
        assert_eq!(quiz.answers.len(), 2);
    }

    #[test]
    fn test_query_returns_text() {
        let generator = Scripted::new(|| Ok(Some("1. Q?\na) w\nb) x\nc) y\nd) z".to_string())));
        let raw = query(&generator, "corpus", "instruction");
        assert!(raw.starts_with("1. Q?"));
        assert_eq!(generator.calls.get(), 1);
    }

    #[test]
    fn test_query_absent_response_is_sentinel() {
        let generator = Scripted::new(|| Ok(None));
        assert_eq!(query(&generator, "corpus", "instruction"), NO_RESPONSE);

        let blank = Scripted::new(|| Ok(Some("   ".to_string())));
        assert_eq!(query(&blank, "corpus", "instruction"), NO_RESPONSE);
    }

    #[test]
    fn test_query_failure_is_sentinel() {
        let generator = Scripted::new(|| Err(Error::GenerationError("timed out".to_string())));
        assert_eq!(query(&generator, "corpus", "instruction"), NO_RESPONSE);
    }

    #[test]
    fn test_query_skips_empty_corpus() {
        let generator = Scripted::new(|| Ok(Some("unused".to_string())));
        assert_eq!(query(&generator, "  \n", "instruction"), NO_RESPONSE);
        assert_eq!(generator.calls.get(), 0);
    }
}
