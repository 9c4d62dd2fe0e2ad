use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use jelajah_core::model::{LearnerProfile, PlaceId};
use storage::repository::{KeyValueStore, StorageError, keys};

use crate::error::LedgerError;

/// Single source of truth for per-place scores, the derived total, and
/// unlock progress.
///
/// Every mutation persists first and publishes second: the in-memory profile
/// only changes after the store confirms the write, so a storage failure
/// leaves memory and disk consistent. One mutex guards the published profile
/// and is held across the persist, which serializes concurrent
/// `record_place_result` calls.
pub struct ScoreLedger {
    store: Arc<dyn KeyValueStore>,
    profile: Mutex<Option<LearnerProfile>>,
}

impl ScoreLedger {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            profile: Mutex::new(None),
        }
    }

    /// Read the stored profile into memory, normalizing a drifted total.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the store cannot be read, the stored document
    /// does not decode, or re-persisting a repaired profile fails.
    pub async fn load(&self) -> Result<Option<LearnerProfile>, LedgerError> {
        let mut guard = self.profile.lock().await;
        let Some(value) = self.store.get(keys::PROFILE).await? else {
            *guard = None;
            return Ok(None);
        };

        let mut profile: LearnerProfile = serde_json::from_value(value)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        if profile.repair_total() {
            warn!(
                total = profile.total_score(),
                "stored total disagreed with per-place scores; repaired"
            );
            self.persist(&profile).await?;
        }

        *guard = Some(profile.clone());
        Ok(Some(profile))
    }

    /// Initialize and persist a fresh profile (first login).
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` for an invalid name or a failed persist; on
    /// failure no profile is published.
    pub async fn create_profile(
        &self,
        name: &str,
        class_name: &str,
    ) -> Result<LearnerProfile, LedgerError> {
        let profile = LearnerProfile::new(name, class_name)?;
        let mut guard = self.profile.lock().await;
        self.persist(&profile).await?;
        *guard = Some(profile.clone());
        info!(name = profile.name(), "created learner profile");
        Ok(profile)
    }

    /// Remove the persisted profile (logout).
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the delete fails; the published profile is
    /// kept in that case.
    pub async fn clear_profile(&self) -> Result<(), LedgerError> {
        let mut guard = self.profile.lock().await;
        self.store.remove(keys::PROFILE).await?;
        *guard = None;
        Ok(())
    }

    /// Overwrite the score for one place, recompute the total, and raise
    /// unlock progress to `proposed_progress` if that is an increase.
    ///
    /// Replay-safe: a smaller proposal never lowers progress.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NoProfile` when no profile is loaded, and
    /// propagates storage failures without touching the published profile.
    pub async fn record_place_result(
        &self,
        place_id: PlaceId,
        score: u32,
        proposed_progress: usize,
    ) -> Result<LearnerProfile, LedgerError> {
        let mut guard = self.profile.lock().await;
        let current = guard.as_ref().ok_or(LedgerError::NoProfile)?;

        let mut updated = current.clone();
        updated.record_score(place_id, score);
        updated.advance_progress(proposed_progress);

        self.persist(&updated).await?;
        *guard = Some(updated.clone());
        info!(
            place = %place_id,
            score,
            total = updated.total_score(),
            progress = updated.unlock_progress(),
            "recorded place result"
        );
        Ok(updated)
    }

    /// Derived sum of the per-place scores; zero when no profile is loaded.
    pub async fn total_score(&self) -> u32 {
        self.profile
            .lock()
            .await
            .as_ref()
            .map_or(0, LearnerProfile::derived_total)
    }

    /// True iff the place at `place_index` is within unlocked progress.
    pub async fn is_unlocked(&self, place_index: usize) -> bool {
        self.profile
            .lock()
            .await
            .as_ref()
            .is_some_and(|profile| profile.is_unlocked(place_index))
    }

    /// Snapshot of the published profile.
    pub async fn profile(&self) -> Option<LearnerProfile> {
        self.profile.lock().await.clone()
    }

    async fn persist(&self, profile: &LearnerProfile) -> Result<(), LedgerError> {
        let value = serde_json::to_value(profile)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.store.set(keys::PROFILE, &value).await?;
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
