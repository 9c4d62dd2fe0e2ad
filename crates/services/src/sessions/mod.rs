mod engine;
mod session;

pub use engine::{AdvanceOutcome, QuizEngine};
pub use session::{Feedback, QuizSession, ROUNDS_PER_SESSION, SessionPhase};
