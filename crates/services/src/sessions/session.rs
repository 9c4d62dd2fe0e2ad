use chrono::{DateTime, Utc};

use jelajah_core::model::{Place, QuestionPackage, SubmittedAnswer};

use crate::error::SessionError;

/// Number of question/answer rounds in every session, for every place.
pub const ROUNDS_PER_SESSION: usize = 5;

const COMPLETION_MESSAGE: &str = "Kuis selesai! Hebat, kamu sudah menjawab semua pertanyaan.";

//
// ─── FEEDBACK ──────────────────────────────────────────────────────────────────
//

/// What the learner sees after a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// A graded round, carrying the explanation and a rendering of the
    /// expected answer.
    Answered {
        correct: bool,
        correct_answer: String,
        explanation: String,
    },
    /// The final round was just consumed; the score has NOT been recorded
    /// yet. Recording happens on the advance out of this state.
    SessionDone { message: String },
}

/// Where a session currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// A question is being fetched.
    Loading,
    /// A question is presented and a submission is expected.
    AwaitingAnswer,
    /// A submission was graded (or the session just finished).
    Feedback(Feedback),
    /// The result has been recorded; the session is spent.
    Completed,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One bounded run of quiz rounds for a single place visit.
///
/// Held in memory only; created when the learner opens a place, discarded
/// when they leave the result screen. All methods take `&mut self`, so a
/// session abandoned by its caller can never be advanced by a stale fetch.
#[derive(Debug)]
pub struct QuizSession {
    place: Place,
    place_index: usize,
    round: usize,
    rounds_total: usize,
    correct_count: u32,
    phase: SessionPhase,
    current_question: Option<QuestionPackage>,
    draft: SubmittedAnswer,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Create a session in `Loading`, before the first question arrives.
    #[must_use]
    pub fn new(place: Place, place_index: usize, started_at: DateTime<Utc>) -> Self {
        Self {
            place,
            place_index,
            round: 0,
            rounds_total: ROUNDS_PER_SESSION,
            correct_count: 0,
            phase: SessionPhase::Loading,
            current_question: None,
            draft: SubmittedAnswer::Text(String::new()),
            started_at,
            completed_at: None,
        }
    }

    #[must_use]
    pub fn place(&self) -> &Place {
        &self.place
    }

    /// Catalog index of the place; `index + 1` is the progress a completed
    /// session proposes.
    #[must_use]
    pub fn place_index(&self) -> usize {
        self.place_index
    }

    /// 0-based index of the round currently presented (or being fetched).
    #[must_use]
    pub fn round(&self) -> usize {
        self.round
    }

    #[must_use]
    pub fn rounds_total(&self) -> usize {
        self.rounds_total
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&QuestionPackage> {
        self.current_question.as_ref()
    }

    /// The answer being composed for the current question.
    #[must_use]
    pub fn draft(&self) -> &SubmittedAnswer {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut SubmittedAnswer {
        &mut self.draft
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.phase, SessionPhase::Completed)
    }

    /// Present the next question and reset the draft to its shape: one empty
    /// string, or one per expected blank.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotLoading` unless a question is being awaited,
    /// or `SessionError::Completed` on a spent session.
    pub fn begin_round(&mut self, question: QuestionPackage) -> Result<(), SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        if !matches!(self.phase, SessionPhase::Loading) {
            return Err(SessionError::NotLoading);
        }

        self.draft = match question.expected_blanks() {
            0 => SubmittedAnswer::Text(String::new()),
            blanks => SubmittedAnswer::Blanks(vec![String::new(); blanks]),
        };
        self.current_question = Some(question);
        self.phase = SessionPhase::AwaitingAnswer;
        Ok(())
    }

    /// Grade a submission and move into feedback.
    ///
    /// The final accepted submission yields `Feedback::SessionDone` without
    /// recording anything; recording happens on the advance that follows.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotAwaitingAnswer` outside the answering phase,
    /// or `SessionError::Completed` on a spent session.
    pub fn submit(&mut self, answer: &SubmittedAnswer) -> Result<Feedback, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        if !matches!(self.phase, SessionPhase::AwaitingAnswer) {
            return Err(SessionError::NotAwaitingAnswer);
        }
        let question = self
            .current_question
            .as_ref()
            .ok_or(SessionError::NotAwaitingAnswer)?;

        let correct = question.check(answer);
        if correct {
            self.correct_count += 1;
        }
        self.round += 1;

        let feedback = if self.round >= self.rounds_total {
            Feedback::SessionDone {
                message: COMPLETION_MESSAGE.to_owned(),
            }
        } else {
            Feedback::Answered {
                correct,
                correct_answer: question.correct_answer_text(),
                explanation: question.explanation().to_owned(),
            }
        };
        self.phase = SessionPhase::Feedback(feedback.clone());
        Ok(feedback)
    }

    /// Leave a non-terminal feedback and go back to fetching.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInFeedback` unless the session sits in
    /// `Feedback::Answered`, or `SessionError::Completed` when spent.
    pub fn begin_loading(&mut self) -> Result<(), SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        match self.phase {
            SessionPhase::Feedback(Feedback::Answered { .. }) => {
                self.phase = SessionPhase::Loading;
                self.current_question = None;
                self.draft = SubmittedAnswer::Text(String::new());
                Ok(())
            }
            _ => Err(SessionError::NotInFeedback),
        }
    }

    /// Seal the session after its result has been recorded.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInFeedback` unless the session sits in the
    /// terminal feedback, or `SessionError::Completed` when already spent.
    pub fn finish(&mut self, at: DateTime<Utc>) -> Result<(), SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        match self.phase {
            SessionPhase::Feedback(Feedback::SessionDone { .. }) => {
                self.phase = SessionPhase::Completed;
                self.current_question = None;
                self.completed_at = Some(at);
                Ok(())
            }
            _ => Err(SessionError::NotInFeedback),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use jelajah_core::model::PlaceId;
    use jelajah_core::time::fixed_now;

    fn place() -> Place {
        Place::new(PlaceId::new(7), "Kabupaten Ciamis")
    }

    fn short_answer(expected: &str) -> QuestionPackage {
        QuestionPackage::ShortAnswer {
            prompt: "?".into(),
            answer: expected.into(),
            explanation: "Karena begitu.".into(),
        }
    }

    fn fill_in_blank() -> QuestionPackage {
        QuestionPackage::FillInBlank {
            prompt: "____ dan ____".into(),
            answers: vec!["Bandung".into(), "Soreang".into()],
            explanation: String::new(),
        }
    }

    fn session() -> QuizSession {
        QuizSession::new(place(), 0, fixed_now())
    }

    #[test]
    fn new_session_loads_round_zero() {
        let session = session();
        assert_eq!(session.round(), 0);
        assert_eq!(session.rounds_total(), ROUNDS_PER_SESSION);
        assert!(matches!(session.phase(), SessionPhase::Loading));
        assert!(session.current_question().is_none());
    }

    #[test]
    fn begin_round_shapes_the_draft() {
        let mut session = session();
        session.begin_round(fill_in_blank()).unwrap();
        assert_eq!(
            session.draft(),
            &SubmittedAnswer::Blanks(vec![String::new(), String::new()])
        );
        assert!(matches!(session.phase(), SessionPhase::AwaitingAnswer));
    }

    #[test]
    fn submit_grades_and_reports_feedback() {
        let mut session = session();
        session.begin_round(short_answer("Citarum")).unwrap();

        let feedback = session
            .submit(&SubmittedAnswer::Text(" citarum ".into()))
            .unwrap();
        assert_eq!(
            feedback,
            Feedback::Answered {
                correct: true,
                correct_answer: "Citarum".into(),
                explanation: "Karena begitu.".into(),
            }
        );
        assert_eq!(session.correct_count(), 1);
        assert_eq!(session.round(), 1);
    }

    #[test]
    fn fifth_submission_is_terminal_feedback() {
        let mut session = session();
        for i in 0..ROUNDS_PER_SESSION {
            session.begin_round(short_answer("x")).unwrap();
            let feedback = session.submit(&SubmittedAnswer::Text("x".into())).unwrap();
            if i + 1 < ROUNDS_PER_SESSION {
                assert!(matches!(feedback, Feedback::Answered { .. }));
                session.begin_loading().unwrap();
            } else {
                assert!(matches!(feedback, Feedback::SessionDone { .. }));
            }
        }
        // Terminal feedback is not yet Completed; the engine records first.
        assert!(!session.is_complete());
        assert_eq!(session.correct_count(), 5);

        session.finish(fixed_now()).unwrap();
        assert!(session.is_complete());
        assert_eq!(session.completed_at(), Some(fixed_now()));
    }

    #[test]
    fn submit_outside_awaiting_answer_fails_fast() {
        let mut session = session();
        let err = session
            .submit(&SubmittedAnswer::Text("x".into()))
            .unwrap_err();
        assert!(matches!(err, SessionError::NotAwaitingAnswer));
    }

    #[test]
    fn begin_round_outside_loading_fails_fast() {
        let mut session = session();
        session.begin_round(short_answer("x")).unwrap();
        let err = session.begin_round(short_answer("y")).unwrap_err();
        assert!(matches!(err, SessionError::NotLoading));
    }

    #[test]
    fn finish_requires_terminal_feedback() {
        let mut session = session();
        session.begin_round(short_answer("x")).unwrap();
        session.submit(&SubmittedAnswer::Text("x".into())).unwrap();
        let err = session.finish(fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::NotInFeedback));
    }

    #[test]
    fn spent_session_rejects_everything() {
        let mut session = session();
        for _ in 0..ROUNDS_PER_SESSION {
            session.begin_round(short_answer("x")).unwrap();
            session.submit(&SubmittedAnswer::Text("x".into())).unwrap();
            let _ = session.begin_loading();
        }
        session.finish(fixed_now()).unwrap();

        assert!(matches!(
            session.submit(&SubmittedAnswer::Text("x".into())),
            Err(SessionError::Completed)
        ));
        assert!(matches!(
            session.begin_round(short_answer("x")),
            Err(SessionError::Completed)
        ));
        assert!(matches!(
            session.begin_loading(),
            Err(SessionError::Completed)
        ));
        assert!(matches!(
            session.finish(fixed_now()),
            Err(SessionError::Completed)
        ));
    }

    #[test]
    fn incorrect_answers_do_not_score() {
        let mut session = session();
        session.begin_round(short_answer("Citarum")).unwrap();
        let feedback = session
            .submit(&SubmittedAnswer::Text("Ciliwung".into()))
            .unwrap();
        assert!(matches!(
            feedback,
            Feedback::Answered { correct: false, .. }
        ));
        assert_eq!(session.correct_count(), 0);
        assert_eq!(session.round(), 1);
    }
}
