use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use jelajah_core::model::{
    Place, PlaceCatalog, PlaceId, QuestionPackage, SubmittedAnswer,
};
use jelajah_core::time::fixed_clock;
use services::{
    AdvanceOutcome, Feedback, QuestionSource, QuestionSourceError, QuizEngine, ScoreLedger,
    SessionError, SessionPhase,
};
use storage::repository::{InMemoryStore, KeyValueStore, StorageError};

//
// ─── FAKES ─────────────────────────────────────────────────────────────────────
//

/// Replays a fixed script of source responses, then reports overload.
struct ScriptedSource {
    script: Mutex<VecDeque<Result<QuestionPackage, QuestionSourceError>>>,
}

impl ScriptedSource {
    fn new(script: Vec<Result<QuestionPackage, QuestionSourceError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }
}

#[async_trait]
impl QuestionSource for ScriptedSource {
    async fn fetch_question(
        &self,
        _topic: &str,
        _place_name: &str,
    ) -> Result<QuestionPackage, QuestionSourceError> {
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or(Err(QuestionSourceError::Overloaded))
    }
}

/// Store that can be switched into a failing mode mid-test.
#[derive(Clone)]
struct SwitchableStore {
    inner: InMemoryStore,
    broken: Arc<AtomicBool>,
}

impl SwitchableStore {
    fn new() -> Self {
        Self {
            inner: InMemoryStore::new(),
            broken: Arc::new(AtomicBool::new(false)),
        }
    }

    fn set_broken(&self, broken: bool) {
        self.broken.store(broken, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.broken.load(Ordering::SeqCst) {
            Err(StorageError::Connection("store offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for SwitchableStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        self.check()?;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.inner.remove(key).await
    }
}

//
// ─── HELPERS ───────────────────────────────────────────────────────────────────
//

fn catalog() -> PlaceCatalog {
    PlaceCatalog::new(vec![
        Place::new(PlaceId::new(7), "Kabupaten Ciamis"),
        Place::new(PlaceId::new(8), "Kabupaten Kuningan"),
    ])
}

fn short_answer(expected: &str) -> QuestionPackage {
    QuestionPackage::ShortAnswer {
        prompt: format!("Jawab: {expected}?"),
        answer: expected.into(),
        explanation: "Penjelasan singkat.".into(),
    }
}

fn five_questions() -> Vec<Result<QuestionPackage, QuestionSourceError>> {
    vec![
        Ok(short_answer("a")),
        Ok(QuestionPackage::MultipleChoice {
            prompt: "Pilih b.".into(),
            options: vec!["a".into(), "b".into(), "c".into()],
            answer: "b".into(),
            explanation: String::new(),
        }),
        Ok(QuestionPackage::FillInBlank {
            prompt: "____ dan ____".into(),
            answers: vec!["c".into(), "d".into()],
            explanation: String::new(),
        }),
        Ok(short_answer("e")),
        Ok(short_answer("f")),
    ]
}

async fn engine_over(
    store: Arc<dyn KeyValueStore>,
    script: Vec<Result<QuestionPackage, QuestionSourceError>>,
) -> (QuizEngine, Arc<ScoreLedger>) {
    let ledger = Arc::new(ScoreLedger::new(store));
    ledger.create_profile("Siti", "4B").await.unwrap();
    let engine = QuizEngine::new(
        catalog(),
        Arc::new(ScriptedSource::new(script)),
        Arc::clone(&ledger),
    )
    .with_clock(fixed_clock());
    (engine, ledger)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[tokio::test]
async fn full_session_records_result_exactly_once() {
    let (engine, ledger) = engine_over(Arc::new(InMemoryStore::new()), five_questions()).await;

    let mut session = engine.start(PlaceId::new(7)).await.unwrap();

    // Rounds 1-4: first answer is wrong, the rest are right.
    let answers = [
        SubmittedAnswer::Text("WRONG".into()),
        SubmittedAnswer::Text("b".into()),
        SubmittedAnswer::Blanks(vec!["C".into(), " d ".into()]),
        SubmittedAnswer::Text("e".into()),
    ];
    for answer in &answers {
        let feedback = engine.submit(&mut session, answer).unwrap();
        assert!(matches!(feedback, Feedback::Answered { .. }));
        assert_eq!(engine.advance(&mut session).await.unwrap(), AdvanceOutcome::NextRound);
    }

    // Round 5 ends in the terminal feedback; nothing is recorded yet.
    let feedback = engine
        .submit(&mut session, &SubmittedAnswer::Text("f".into()))
        .unwrap();
    assert!(matches!(feedback, Feedback::SessionDone { .. }));
    assert_eq!(ledger.total_score().await, 0);

    // The advance out of it records once and seals the session.
    let outcome = engine.advance(&mut session).await.unwrap();
    let AdvanceOutcome::Finished(profile) = outcome else {
        panic!("expected Finished, got {outcome:?}");
    };
    assert_eq!(profile.place_score(PlaceId::new(7)), Some(4));
    assert_eq!(profile.total_score(), 4);
    assert_eq!(profile.unlock_progress(), 1);
    assert!(session.is_complete());

    // A replayed advance is a contract violation, not a second write.
    assert!(matches!(
        engine.advance(&mut session).await,
        Err(SessionError::Completed)
    ));
    assert_eq!(ledger.total_score().await, 4);
}

#[tokio::test]
async fn source_failure_always_yields_a_playable_question() {
    let (engine, _ledger) = engine_over(Arc::new(InMemoryStore::new()), Vec::new()).await;

    let mut session = engine.start(PlaceId::new(7)).await.unwrap();
    assert!(matches!(session.phase(), SessionPhase::AwaitingAnswer));

    // Every round falls back; the fallback's answer is always Jawa Barat.
    for _ in 0..4 {
        session.current_question().unwrap().ensure_well_formed().unwrap();
        engine
            .submit(&mut session, &SubmittedAnswer::Text("jawa barat".into()))
            .unwrap();
        engine.advance(&mut session).await.unwrap();
    }
    engine
        .submit(&mut session, &SubmittedAnswer::Text("jawa barat".into()))
        .unwrap();

    let outcome = engine.advance(&mut session).await.unwrap();
    let AdvanceOutcome::Finished(profile) = outcome else {
        panic!("expected Finished, got {outcome:?}");
    };
    assert_eq!(profile.place_score(PlaceId::new(7)), Some(5));
}

#[tokio::test]
async fn locked_place_cannot_be_started() {
    let (engine, _ledger) = engine_over(Arc::new(InMemoryStore::new()), five_questions()).await;

    let err = engine.start(PlaceId::new(8)).await.unwrap_err();
    assert!(matches!(err, SessionError::PlaceLocked { index: 1 }));
}

#[tokio::test]
async fn unknown_place_cannot_be_started() {
    let (engine, _ledger) = engine_over(Arc::new(InMemoryStore::new()), five_questions()).await;

    let err = engine.start(PlaceId::new(99)).await.unwrap_err();
    assert!(matches!(err, SessionError::UnknownPlace(_)));
}

#[tokio::test]
async fn completing_a_place_again_does_not_regress_progress() {
    let (engine, ledger) = engine_over(Arc::new(InMemoryStore::new()), Vec::new()).await;
    ledger
        .record_place_result(PlaceId::new(8), 3, 5)
        .await
        .unwrap();

    let mut session = engine.start(PlaceId::new(7)).await.unwrap();
    for _ in 0..4 {
        engine
            .submit(&mut session, &SubmittedAnswer::Text("jawa barat".into()))
            .unwrap();
        engine.advance(&mut session).await.unwrap();
    }
    engine
        .submit(&mut session, &SubmittedAnswer::Text("salah".into()))
        .unwrap();

    let outcome = engine.advance(&mut session).await.unwrap();
    let AdvanceOutcome::Finished(profile) = outcome else {
        panic!("expected Finished, got {outcome:?}");
    };
    // Place index 0 proposes progress 1; the recorded 5 wins.
    assert_eq!(profile.unlock_progress(), 5);
    assert_eq!(profile.place_score(PlaceId::new(7)), Some(4));
    assert_eq!(profile.total_score(), 7);
}

#[tokio::test]
async fn storage_failure_on_finalize_is_retryable() {
    let store = SwitchableStore::new();
    let (engine, ledger) = engine_over(Arc::new(store.clone()), Vec::new()).await;

    let mut session = engine.start(PlaceId::new(7)).await.unwrap();
    for _ in 0..4 {
        engine
            .submit(&mut session, &SubmittedAnswer::Text("jawa barat".into()))
            .unwrap();
        engine.advance(&mut session).await.unwrap();
    }
    engine
        .submit(&mut session, &SubmittedAnswer::Text("jawa barat".into()))
        .unwrap();

    store.set_broken(true);
    let err = engine.advance(&mut session).await.unwrap_err();
    assert!(matches!(err, SessionError::Ledger(_)));

    // Nothing was published or sealed.
    assert!(!session.is_complete());
    assert_eq!(ledger.total_score().await, 0);

    // Once storage recovers the same advance succeeds.
    store.set_broken(false);
    let outcome = engine.advance(&mut session).await.unwrap();
    assert!(matches!(outcome, AdvanceOutcome::Finished(_)));
    assert_eq!(ledger.total_score().await, 5);
    assert!(session.is_complete());
}
