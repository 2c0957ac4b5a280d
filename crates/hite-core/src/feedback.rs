//! Post-session star ratings.

use serde::{Deserialize, Serialize};

use crate::store::{keys, read_json, remove_soft, write_soft, KeyValueStore};

pub const MAX_STARS: u8 = 5;

/// How the user rated the session, 0 meaning "not rated".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeedbackRatings {
    pub helpful: u8,
    pub engaging: u8,
}

/// The stored draft, ratings plus their combined score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackDraft {
    pub helpful: u8,
    pub engaging: u8,
    pub overall: u8,
}

impl FeedbackRatings {
    /// Ratings clamped to `0..=5` stars.
    pub fn new(helpful: u8, engaging: u8) -> Self {
        Self {
            helpful: helpful.min(MAX_STARS),
            engaging: engaging.min(MAX_STARS),
        }
    }

    /// Rounded mean of the non-zero ratings, within `1..=5`; 0 if unrated.
    pub fn overall(&self) -> u8 {
        let (count, sum) = [self.helpful, self.engaging]
            .into_iter()
            .filter(|&n| n > 0)
            .fold((0u32, 0u32), |(count, sum), n| (count + 1, sum + u32::from(n)));
        if count == 0 {
            return 0;
        }
        // half-up rounding of sum / count
        let mean = (2 * sum + count) / (2 * count);
        u8::try_from(mean).unwrap_or(MAX_STARS).clamp(1, MAX_STARS)
    }

    pub fn draft(&self) -> FeedbackDraft {
        FeedbackDraft {
            helpful: self.helpful,
            engaging: self.engaging,
            overall: self.overall(),
        }
    }

    /// Store the draft under the feedback key. Failures are logged only.
    pub fn save(&self, store: &dyn KeyValueStore) -> bool {
        match serde_json::to_string(&self.draft()) {
            Ok(json) => write_soft(store, keys::FEEDBACK_DRAFT, &json),
            Err(e) => {
                tracing::warn!("failed to encode feedback draft: {e}");
                false
            }
        }
    }
}

/// Read a previously saved draft, if one is present and well-formed.
pub fn load_draft(store: &dyn KeyValueStore) -> Option<FeedbackDraft> {
    read_json(store, keys::FEEDBACK_DRAFT)
}

/// Forget any stale draft.
pub fn clear_draft(store: &dyn KeyValueStore) -> bool {
    remove_soft(store, keys::FEEDBACK_DRAFT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn overall_ignores_unrated() {
        assert_eq!(FeedbackRatings::new(0, 0).overall(), 0);
        assert_eq!(FeedbackRatings::new(4, 0).overall(), 4);
        assert_eq!(FeedbackRatings::new(0, 2).overall(), 2);
    }

    #[test]
    fn overall_rounds_half_up() {
        assert_eq!(FeedbackRatings::new(4, 5).overall(), 5);
        assert_eq!(FeedbackRatings::new(1, 2).overall(), 2);
        assert_eq!(FeedbackRatings::new(3, 3).overall(), 3);
        assert_eq!(FeedbackRatings::new(1, 4).overall(), 3);
        assert_eq!(FeedbackRatings::new(5, 5).overall(), 5);
    }

    #[test]
    fn ratings_are_clamped() {
        let r = FeedbackRatings::new(9, 7);
        assert_eq!((r.helpful, r.engaging), (5, 5));
        assert_eq!(r.overall(), 5);
    }

    #[test]
    fn draft_roundtrip_through_store() {
        let store = MemoryStore::new();
        assert!(FeedbackRatings::new(3, 4).save(&store));
        let draft = load_draft(&store).unwrap();
        assert_eq!(draft.overall, 4);
        assert!(clear_draft(&store));
        assert_eq!(load_draft(&store), None);
    }
}
