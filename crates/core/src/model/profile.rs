use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::PlaceId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("learner name cannot be empty")]
    EmptyName,
}

//
// ─── PROFILE ───────────────────────────────────────────────────────────────────
//

/// Mutable root of persisted learner state.
///
/// Invariants:
/// - `total_score` equals the sum of `score_by_place` at every persisted
///   write; it is serialized for readability but no read path trusts it.
/// - `unlock_progress` never decreases.
/// - per-place entries are only added or overwritten (last-write-wins).
///
/// Mutation happens exclusively through the score ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerProfile {
    name: String,
    class_name: String,
    total_score: u32,
    unlock_progress: usize,
    #[serde(default)]
    score_by_place: BTreeMap<PlaceId, u32>,
}

impl LearnerProfile {
    /// Creates a fresh profile with zeroed progress and an empty score map.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::EmptyName` if the name is empty or blank.
    pub fn new(name: impl Into<String>, class_name: impl Into<String>) -> Result<Self, ProfileError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }
        Ok(Self {
            name,
            class_name: class_name.into(),
            total_score: 0,
            unlock_progress: 0,
            score_by_place: BTreeMap::new(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The stored total, kept equal to [`derived_total`](Self::derived_total)
    /// by every mutation path.
    #[must_use]
    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    /// Highest catalog index the learner may visit.
    #[must_use]
    pub fn unlock_progress(&self) -> usize {
        self.unlock_progress
    }

    #[must_use]
    pub fn score_by_place(&self) -> &BTreeMap<PlaceId, u32> {
        &self.score_by_place
    }

    #[must_use]
    pub fn place_score(&self, id: PlaceId) -> Option<u32> {
        self.score_by_place.get(&id).copied()
    }

    /// Sum of the per-place scores. The authoritative total.
    #[must_use]
    pub fn derived_total(&self) -> u32 {
        self.score_by_place.values().sum()
    }

    #[must_use]
    pub fn is_unlocked(&self, place_index: usize) -> bool {
        place_index <= self.unlock_progress
    }

    /// Overwrites the score for one place and recomputes the total.
    pub fn record_score(&mut self, place: PlaceId, score: u32) {
        self.score_by_place.insert(place, score);
        self.total_score = self.derived_total();
    }

    /// Raises unlock progress to `proposed` if that is an increase.
    ///
    /// Replay-safe: a smaller proposal leaves progress untouched.
    pub fn advance_progress(&mut self, proposed: usize) {
        self.unlock_progress = self.unlock_progress.max(proposed);
    }

    /// Normalizes a stored total that drifted from the per-place sum.
    ///
    /// Returns true when a repair was needed, so callers can re-persist.
    pub fn repair_total(&mut self) -> bool {
        let derived = self.derived_total();
        if self.total_score == derived {
            return false;
        }
        self.total_score = derived;
        true
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> LearnerProfile {
        LearnerProfile::new("Siti", "4B").unwrap()
    }

    #[test]
    fn new_profile_is_zeroed() {
        let profile = profile();
        assert_eq!(profile.total_score(), 0);
        assert_eq!(profile.unlock_progress(), 0);
        assert!(profile.score_by_place().is_empty());
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(
            LearnerProfile::new("   ", "4B").unwrap_err(),
            ProfileError::EmptyName
        );
    }

    #[test]
    fn total_tracks_latest_score_per_place() {
        let mut profile = profile();
        profile.record_score(PlaceId::new(7), 4);
        profile.record_score(PlaceId::new(2), 3);
        assert_eq!(profile.total_score(), 7);

        // Last write wins for a repeated place.
        profile.record_score(PlaceId::new(7), 1);
        assert_eq!(profile.total_score(), 4);
        assert_eq!(profile.place_score(PlaceId::new(7)), Some(1));
    }

    #[test]
    fn progress_never_decreases() {
        let mut profile = profile();
        profile.advance_progress(5);
        profile.advance_progress(3);
        assert_eq!(profile.unlock_progress(), 5);
    }

    #[test]
    fn only_first_place_is_unlocked_initially() {
        let profile = profile();
        assert!(profile.is_unlocked(0));
        assert!(!profile.is_unlocked(1));
    }

    #[test]
    fn repair_total_normalizes_drift() {
        let mut profile = profile();
        profile.record_score(PlaceId::new(1), 5);

        let mut drifted: LearnerProfile =
            serde_json::from_str(&serde_json::to_string(&profile).unwrap()).unwrap();
        drifted.total_score = 99;
        assert!(drifted.repair_total());
        assert_eq!(drifted.total_score(), 5);
        assert!(!drifted.repair_total());
    }

    #[test]
    fn serializes_place_keys_as_json_object() {
        let mut profile = profile();
        profile.record_score(PlaceId::new(7), 4);
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["score_by_place"]["7"], 4);
        assert_eq!(value["total_score"], 4);
    }
}
