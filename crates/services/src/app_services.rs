use std::sync::Arc;

use jelajah_core::model::PlaceCatalog;
use storage::repository::Storage;

use crate::error::AppServicesError;
use crate::onboarding::OnboardingService;
use crate::question_source::{GeminiQuestionSource, QuestionSource};
use crate::score_ledger::ScoreLedger;
use crate::sessions::QuizEngine;

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    ledger: Arc<ScoreLedger>,
    onboarding: Arc<OnboardingService>,
    engine: Arc<QuizEngine>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the env-configured
    /// question source, then load any stored profile.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or the initial
    /// profile load fails.
    pub async fn new_sqlite(db_url: &str) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let source: Arc<dyn QuestionSource> = Arc::new(GeminiQuestionSource::from_env());
        let services = Self::with_storage(&storage, source);
        services.ledger.load().await?;
        Ok(services)
    }

    /// Build services over an in-memory store, for tests and prototyping.
    #[must_use]
    pub fn in_memory(source: Arc<dyn QuestionSource>) -> Self {
        Self::with_storage(&Storage::in_memory(), source)
    }

    fn with_storage(storage: &Storage, source: Arc<dyn QuestionSource>) -> Self {
        let ledger = Arc::new(ScoreLedger::new(Arc::clone(&storage.kv)));
        let onboarding = Arc::new(OnboardingService::new(Arc::clone(&storage.kv)));
        let engine = Arc::new(QuizEngine::new(
            PlaceCatalog::west_java(),
            source,
            Arc::clone(&ledger),
        ));
        Self {
            ledger,
            onboarding,
            engine,
        }
    }

    #[must_use]
    pub fn ledger(&self) -> Arc<ScoreLedger> {
        Arc::clone(&self.ledger)
    }

    #[must_use]
    pub fn onboarding(&self) -> Arc<OnboardingService> {
        Arc::clone(&self.onboarding)
    }

    #[must_use]
    pub fn engine(&self) -> Arc<QuizEngine> {
        Arc::clone(&self.engine)
    }
}
