use std::sync::Arc;

use tracing::{debug, warn};

use jelajah_core::Clock;
use jelajah_core::model::{
    LearnerProfile, Place, PlaceCatalog, PlaceId, QuestionPackage, SubmittedAnswer,
};

use crate::error::{LedgerError, SessionError};
use crate::question_source::{QuestionSource, fallback_question};
use crate::score_ledger::ScoreLedger;
use crate::sessions::session::{Feedback, QuizSession, SessionPhase};
use crate::topics;

/// What an `advance` call did.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    /// A fresh question is presented; keep playing.
    NextRound,
    /// The session result was recorded; carries the updated profile.
    Finished(LearnerProfile),
}

/// Drives quiz sessions: fetches questions, grades answers, and hands the
/// final tally to the score ledger exactly once per session.
pub struct QuizEngine {
    catalog: PlaceCatalog,
    source: Arc<dyn QuestionSource>,
    ledger: Arc<ScoreLedger>,
    clock: Clock,
}

impl QuizEngine {
    #[must_use]
    pub fn new(
        catalog: PlaceCatalog,
        source: Arc<dyn QuestionSource>,
        ledger: Arc<ScoreLedger>,
    ) -> Self {
        Self {
            catalog,
            source,
            ledger,
            clock: Clock::default(),
        }
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &PlaceCatalog {
        &self.catalog
    }

    /// Open a session for a place and present its first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownPlace` for an id outside the catalog,
    /// `SessionError::PlaceLocked` when the place is beyond unlock progress
    /// (a caller-side precondition violation), and `LedgerError::NoProfile`
    /// when nobody is logged in. Question source trouble is NOT an error:
    /// the built-in fallback steps in.
    pub async fn start(&self, place_id: PlaceId) -> Result<QuizSession, SessionError> {
        let (index, place) = self
            .catalog
            .find(place_id)
            .ok_or(SessionError::UnknownPlace(place_id))?;
        let profile = self
            .ledger
            .profile()
            .await
            .ok_or(LedgerError::NoProfile)?;
        if !profile.is_unlocked(index) {
            return Err(SessionError::PlaceLocked { index });
        }

        let place = place.clone();
        let mut session = QuizSession::new(place.clone(), index, self.clock.now());
        let question = self.next_question(&place).await;
        session.begin_round(question)?;
        Ok(session)
    }

    /// Grade a submission for the current round.
    ///
    /// # Errors
    ///
    /// Propagates the session's phase contract errors.
    pub fn submit(
        &self,
        session: &mut QuizSession,
        answer: &SubmittedAnswer,
    ) -> Result<Feedback, SessionError> {
        session.submit(answer)
    }

    /// Leave feedback: fetch the next question, or (out of the terminal
    /// feedback) record the result and seal the session.
    ///
    /// # Errors
    ///
    /// Returns phase contract errors for calls outside `Feedback`, and
    /// propagates ledger/storage failures from the final recording (the
    /// session then stays in its terminal feedback, so the caller may retry).
    pub async fn advance(&self, session: &mut QuizSession) -> Result<AdvanceOutcome, SessionError> {
        match session.phase() {
            SessionPhase::Feedback(Feedback::Answered { .. }) => {
                session.begin_loading()?;
                let question = self.next_question(session.place()).await;
                session.begin_round(question)?;
                Ok(AdvanceOutcome::NextRound)
            }
            SessionPhase::Feedback(Feedback::SessionDone { .. }) => {
                let profile = self
                    .ledger
                    .profile()
                    .await
                    .ok_or(LedgerError::NoProfile)?;
                let proposed = profile.unlock_progress().max(session.place_index() + 1);
                let updated = self
                    .ledger
                    .record_place_result(
                        session.place().id(),
                        session.correct_count(),
                        proposed,
                    )
                    .await?;
                session.finish(self.clock.now())?;
                Ok(AdvanceOutcome::Finished(updated))
            }
            SessionPhase::Completed => Err(SessionError::Completed),
            _ => Err(SessionError::NotInFeedback),
        }
    }

    /// Fetch one question, substituting the built-in fallback on any failure.
    async fn next_question(&self, place: &Place) -> QuestionPackage {
        let topic = topics::random_topic();
        match self.source.fetch_question(topic, place.name()).await {
            Ok(question) => {
                debug!(topic, place = place.name(), "question fetched");
                question
            }
            Err(err) => {
                warn!(
                    topic,
                    place = place.name(),
                    error = %err,
                    "question source failed; using fallback"
                );
                fallback_question(place)
            }
        }
    }
}
