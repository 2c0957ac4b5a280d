//! Reading a finished session back out of the store.
//!
//! Everything here tolerates missing or malformed entries: a key that is
//! absent or does not parse falls back to a neutral value, so a summary can
//! always be shown.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hite_core::engine::EngineConfig;
use hite_core::model::Aggregate;
use hite_core::scoring::{Tier, KNOWLEDGE_CHECK_BONUS, MAX_SCALED_SCORE};
use hite_core::store::{keys, read_json, read_parsed, write_soft, KeyValueStore};

/// What the results display knows about the last session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsSummary {
    pub scaled_score: u32,
    pub tier: Tier,
    pub aggregate: Aggregate,
    pub kc_total: u32,
    pub kc_correct: u32,
    pub all_correct: bool,
    pub bonus: u32,
    pub completed_points: u32,
    pub streak_points: u32,
    /// Level from the last commit; `Rookie` until the board is first committed.
    pub xp_level: XpLevel,
    /// Whether a session has been finalized since the last reset.
    pub session_complete: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub session_id: Option<Uuid>,
    /// Number of entries in the stored answer log.
    pub answered: usize,
}

/// Minimal view of a stored answer; anything else in the entry is ignored.
#[derive(Debug, Default, Deserialize)]
struct StoredAnswer {
    #[serde(default)]
    gradable: bool,
    #[serde(rename = "isCorrect", default)]
    is_correct: Option<bool>,
}

impl ResultsSummary {
    /// Load the summary, falling back to the default point values when the
    /// completion and streak points were never written.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        Self::load_with(store, &EngineConfig::default())
    }

    pub fn load_with(store: &dyn KeyValueStore, fallback: &EngineConfig) -> Self {
        let answers = stored_answers(store);

        let scaled_score = read_parsed::<u32>(store, keys::FINAL_SCORE)
            .unwrap_or(0)
            .min(MAX_SCALED_SCORE);
        let tier = read_parsed::<Tier>(store, keys::LEVEL)
            .unwrap_or_else(|| Tier::from_score(scaled_score));
        let aggregate =
            read_json::<Aggregate>(store, keys::AGGREGATE).unwrap_or_else(Aggregate::seeded);

        let kc_total = read_parsed::<u32>(store, keys::KC_TOTAL).unwrap_or(0);
        let kc_correct = read_parsed::<u32>(store, keys::KC_CORRECT)
            .unwrap_or(0)
            .min(kc_total);
        let all_correct = read_parsed::<bool>(store, keys::KC_ALL_CORRECT)
            .unwrap_or(kc_total > 0 && kc_correct == kc_total);
        let bonus = read_parsed::<u32>(store, keys::KC_BONUS)
            .unwrap_or_else(|| bonus_from_last_gradable(&answers));

        Self {
            scaled_score,
            tier,
            aggregate,
            kc_total,
            kc_correct,
            all_correct,
            bonus,
            completed_points: read_parsed(store, keys::COMPLETED_POINTS)
                .unwrap_or(fallback.completed_points),
            streak_points: read_parsed(store, keys::STREAK_POINTS)
                .unwrap_or(fallback.streak_points),
            xp_level: read_parsed(store, keys::XP_LEVEL).unwrap_or(XpLevel::Rookie),
            session_complete: read_parsed(store, keys::SESSION_COMPLETE).unwrap_or(false),
            completed_at: read_parsed(store, keys::COMPLETED_AT),
            session_id: read_parsed(store, keys::SESSION_ID),
            answered: answers.len(),
        }
    }

    /// Points this session adds to the score board. Saturates, since every
    /// term comes straight from the store.
    pub fn delta(&self) -> u32 {
        self.completed_points
            .saturating_add(self.streak_points)
            .saturating_add(self.bonus)
    }
}

fn stored_answers(store: &dyn KeyValueStore) -> Vec<StoredAnswer> {
    // Decode entry by entry so one bad record does not hide the rest.
    read_json::<Vec<serde_json::Value>>(store, keys::ANSWERS)
        .unwrap_or_default()
        .into_iter()
        .map(|v| serde_json::from_value(v).unwrap_or_default())
        .collect()
}

/// Bonus implied by the answer log alone: only the last gradable answer
/// counts.
fn bonus_from_last_gradable(answers: &[StoredAnswer]) -> u32 {
    match answers.iter().rev().find(|a| a.gradable) {
        Some(last) if last.is_correct == Some(true) => KNOWLEDGE_CHECK_BONUS,
        _ => 0,
    }
}

/// Experience label shown next to the score board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum XpLevel {
    Rookie,
    Starter,
}

impl XpLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            XpLevel::Rookie => "Rookie",
            XpLevel::Starter => "Starter",
        }
    }
}

impl fmt::Display for XpLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for XpLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rookie" => Ok(XpLevel::Rookie),
            "starter" => Ok(XpLevel::Starter),
            other => Err(format!("unknown xp level: {other}")),
        }
    }
}

/// The running score board a session's points are added to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBoard {
    pub base_score: u32,
    pub streak_days: u32,
}

impl Default for ScoreBoard {
    fn default() -> Self {
        Self {
            base_score: 952,
            streak_days: 6,
        }
    }
}

/// What a commit wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBoardUpdate {
    pub previous_score: u32,
    pub new_score: u32,
    pub delta: u32,
    pub previous_streak_days: u32,
    pub streak_days: u32,
    pub xp_level: XpLevel,
    /// False if any write was dropped by the store.
    pub persisted: bool,
}

impl ScoreBoard {
    /// Apply `summary` to the board and store the new values.
    ///
    /// The bonus written is the one the summary resolved, so a bonus that was
    /// already stored is never overwritten with zero.
    pub fn commit(&self, summary: &ResultsSummary, store: &dyn KeyValueStore) -> ScoreBoardUpdate {
        let delta = summary.delta();
        let update = ScoreBoardUpdate {
            previous_score: self.base_score,
            new_score: self.base_score.saturating_add(delta),
            delta,
            previous_streak_days: self.streak_days.saturating_sub(1),
            streak_days: self.streak_days,
            xp_level: XpLevel::Starter,
            persisted: false,
        };

        let writes = [
            (keys::BASE_SCORE, update.new_score.to_string()),
            (keys::COMPLETED_POINTS, summary.completed_points.to_string()),
            (keys::STREAK_POINTS, summary.streak_points.to_string()),
            (keys::KC_BONUS, summary.bonus.to_string()),
            (keys::STREAK_DAYS, update.streak_days.to_string()),
            (keys::XP_LEVEL, update.xp_level.as_str().to_string()),
        ];
        let persisted = writes
            .iter()
            .fold(true, |ok, (key, value)| write_soft(store, key, value) && ok);

        tracing::info!(
            "score board {} -> {} (+{delta})",
            update.previous_score,
            update.new_score
        );
        ScoreBoardUpdate { persisted, ..update }
    }
}
