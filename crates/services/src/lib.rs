#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod onboarding;
pub mod question_source;
pub mod score_ledger;
pub mod sessions;
pub mod topics;

pub use jelajah_core::Clock;

pub use app_services::AppServices;
pub use error::{
    AppServicesError, LedgerError, OnboardingError, QuestionSourceError, SessionError,
};
pub use onboarding::OnboardingService;
pub use question_source::{
    GeminiConfig, GeminiQuestionSource, QuestionSource, fallback_question,
};
pub use score_ledger::ScoreLedger;
pub use sessions::{
    AdvanceOutcome, Feedback, QuizEngine, QuizSession, ROUNDS_PER_SESSION, SessionPhase,
};
