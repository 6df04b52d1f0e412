//! Line-based quiz session on a terminal.

use quizzard_core::{AnswerKey, Label, QuestionOutcome, Quiz, QuizSession, SessionState};
use std::io::{self, BufRead, Write};

const HELP: &str = "Commands: a-d select an option, n next question, s submit, q quit";

/// Drive a session from `input`, writing prompts and results to `output`.
///
/// Returns when the user quits or the input ends.
pub fn run_session<R: BufRead, W: Write>(
    quiz: &Quiz,
    mut input: R,
    mut output: W,
) -> io::Result<QuizSession> {
    let mut session = QuizSession::new(quiz.question_list());

    writeln!(output, "{}", HELP)?;
    show_position(&session, &mut output)?;

    let mut line = String::new();
    loop {
        write!(output, "> ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        match line.trim() {
            "" => continue,
            "q" | "quit" => break,
            "n" | "next" => {
                session.advance();
                show_position(&session, &mut output)?;
            }
            "s" | "submit" => {
                session.submit();
                show_results(&session, &quiz.answers, &mut output)?;
            }
            choice => match Label::parse(choice) {
                Some(label) => match session.select_option(label) {
                    Ok(()) => writeln!(output, "Selected {}", label)?,
                    Err(e) => writeln!(output, "{}", e)?,
                },
                None => writeln!(output, "{}", HELP)?,
            },
        }
    }

    Ok(session)
}

fn show_position<W: Write>(session: &QuizSession, output: &mut W) -> io::Result<()> {
    match (session.state(), session.current_question()) {
        (SessionState::InProgress(idx), Some(question)) => {
            writeln!(output)?;
            writeln!(
                output,
                "Question {}/{}: {}",
                idx + 1,
                session.question_count(),
                question.prompt
            )?;
            for (label, text) in &question.options {
                writeln!(output, "  {}) {}", label, text)?;
            }
            Ok(())
        }
        _ => writeln!(output, "Quiz completed!"),
    }
}

fn show_results<W: Write>(
    session: &QuizSession,
    answers: &AnswerKey,
    output: &mut W,
) -> io::Result<()> {
    writeln!(output, "Your answers:")?;
    let grade = session.grade(answers);
    for (id, outcome) in &grade.outcomes {
        let given = session
            .responses()
            .get(id)
            .map(|label| label.to_string())
            .unwrap_or_else(|| "-".to_string());
        let verdict = match outcome {
            QuestionOutcome::Correct => "correct".to_string(),
            QuestionOutcome::Incorrect => match answers.get(id) {
                Some(expected) => format!("incorrect, answer was {}", expected),
                None => "incorrect".to_string(),
            },
            QuestionOutcome::Unanswered => "unanswered".to_string(),
            QuestionOutcome::NoKey => "no answer key".to_string(),
        };
        writeln!(output, "  {}: {} ({})", id, given, verdict)?;
    }
    writeln!(output, "Score: {}/{}", grade.correct(), grade.gradable())
}
