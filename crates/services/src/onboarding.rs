use std::sync::Arc;

use serde_json::Value;

use storage::repository::{KeyValueStore, keys};

use crate::error::OnboardingError;

/// Tracks whether the onboarding carousel has been completed.
///
/// Only the persisted flag lives here; the carousel itself is a UI concern.
pub struct OnboardingService {
    store: Arc<dyn KeyValueStore>,
}

impl OnboardingService {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// True once the learner has finished onboarding.
    ///
    /// # Errors
    ///
    /// Returns `OnboardingError` if the flag cannot be read.
    pub async fn has_completed(&self) -> Result<bool, OnboardingError> {
        let value = self.store.get(keys::ONBOARDING).await?;
        Ok(matches!(value, Some(Value::Bool(true))))
    }

    /// Record completion.
    ///
    /// # Errors
    ///
    /// Returns `OnboardingError` if the flag cannot be written.
    pub async fn mark_completed(&self) -> Result<(), OnboardingError> {
        self.store.set(keys::ONBOARDING, &Value::Bool(true)).await?;
        Ok(())
    }

    /// Forget completion, so onboarding runs again.
    ///
    /// # Errors
    ///
    /// Returns `OnboardingError` if the flag cannot be removed.
    pub async fn reset(&self) -> Result<(), OnboardingError> {
        self.store.remove(keys::ONBOARDING).await?;
        Ok(())
    }
}
