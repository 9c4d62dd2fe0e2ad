use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder the prompt text uses for each blank in a fill-in-blank round.
pub const BLANK_MARKER: &str = "____";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("multiple choice needs at least two options")]
    TooFewOptions,

    #[error("options do not contain the expected answer")]
    AnswerNotInOptions,

    #[error("fill-in-blank needs at least one expected answer")]
    NoExpectedAnswers,
}

//
// ─── QUESTION PACKAGE ──────────────────────────────────────────────────────────
//

/// One quiz round's question, in the exact shape the question source emits.
///
/// The union of kinds is closed: an unrecognized `kind` tag fails
/// deserialization instead of landing in a default branch. A package lives
/// for one round and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionPackage {
    MultipleChoice {
        prompt: String,
        options: Vec<String>,
        answer: String,
        explanation: String,
    },
    ShortAnswer {
        prompt: String,
        answer: String,
        explanation: String,
    },
    FillInBlank {
        prompt: String,
        /// One expected entry per `____` marker, order-significant.
        #[serde(rename = "answer")]
        answers: Vec<String>,
        explanation: String,
    },
}

/// A learner's submission for one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmittedAnswer {
    /// A single string, for multiple choice and short answer rounds.
    Text(String),
    /// One string per blank, compared positionally.
    Blanks(Vec<String>),
}

impl QuestionPackage {
    #[must_use]
    pub fn prompt(&self) -> &str {
        match self {
            Self::MultipleChoice { prompt, .. }
            | Self::ShortAnswer { prompt, .. }
            | Self::FillInBlank { prompt, .. } => prompt,
        }
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        match self {
            Self::MultipleChoice { explanation, .. }
            | Self::ShortAnswer { explanation, .. }
            | Self::FillInBlank { explanation, .. } => explanation,
        }
    }

    /// Choices to present. Empty unless this is a multiple choice round.
    #[must_use]
    pub fn options(&self) -> &[String] {
        match self {
            Self::MultipleChoice { options, .. } => options,
            _ => &[],
        }
    }

    /// Number of blanks a submission must fill; zero for single-answer kinds.
    #[must_use]
    pub fn expected_blanks(&self) -> usize {
        match self {
            Self::FillInBlank { answers, .. } => answers.len(),
            _ => 0,
        }
    }

    /// Number of `____` markers in the prompt text.
    ///
    /// May disagree with [`expected_blanks`](Self::expected_blanks) on sloppy
    /// generated questions; grading follows the expected answers, so the
    /// mismatch is tolerated rather than rejected.
    #[must_use]
    pub fn marker_count(&self) -> usize {
        match self {
            Self::FillInBlank { prompt, .. } => prompt.matches(BLANK_MARKER).count(),
            _ => 0,
        }
    }

    /// Checks the structural invariants a usable question must satisfy.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` for an empty prompt, a multiple choice round
    /// whose options miss the answer, or a fill-in-blank round with no
    /// expected answers.
    pub fn ensure_well_formed(&self) -> Result<(), QuestionError> {
        if self.prompt().trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        match self {
            Self::MultipleChoice {
                options, answer, ..
            } => {
                if options.len() < 2 {
                    return Err(QuestionError::TooFewOptions);
                }
                let expected = normalize(answer);
                if !options.iter().any(|option| normalize(option) == expected) {
                    return Err(QuestionError::AnswerNotInOptions);
                }
            }
            Self::ShortAnswer { .. } => {}
            Self::FillInBlank { answers, .. } => {
                if answers.is_empty() {
                    return Err(QuestionError::NoExpectedAnswers);
                }
            }
        }
        Ok(())
    }

    /// Grades a submission: trimmed, case-insensitive equality; blanks are
    /// compared positionally with no partial credit.
    #[must_use]
    pub fn check(&self, submission: &SubmittedAnswer) -> bool {
        match (self, submission) {
            (
                Self::MultipleChoice { answer, .. } | Self::ShortAnswer { answer, .. },
                SubmittedAnswer::Text(text),
            ) => normalize(text) == normalize(answer),
            (Self::FillInBlank { answers, .. }, SubmittedAnswer::Blanks(filled)) => {
                filled.len() == answers.len()
                    && filled
                        .iter()
                        .zip(answers)
                        .all(|(got, want)| normalize(got) == normalize(want))
            }
            // A submission of the wrong shape cannot match anything.
            _ => false,
        }
    }

    /// Renders the expected answer for feedback display.
    #[must_use]
    pub fn correct_answer_text(&self) -> String {
        match self {
            Self::MultipleChoice { answer, .. } | Self::ShortAnswer { answer, .. } => {
                answer.clone()
            }
            Self::FillInBlank { answers, .. } => answers.join(", "),
        }
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
