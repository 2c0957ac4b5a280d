//! Point awards, the scaled score, tiers, and the knowledge-check bonus.
//!
//! Everything here is a pure function of the question list and the answer
//! log, so finalizing the same session twice yields the same result.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{Aggregate, AnswerRecord, Question};

/// Upper bound of the scaled score.
pub const MAX_SCALED_SCORE: u32 = 1000;

/// Flat bonus for answering every gradable question correctly.
pub const KNOWLEDGE_CHECK_BONUS: u32 = 15;

/// Points for choosing option `index` of `option_count`.
///
/// Options are ranked best first, so index 0 earns `option_count - 1` and
/// the last option earns nothing.
pub fn points_for_choice(option_count: usize, index: usize) -> u32 {
    let points = option_count.saturating_sub(1).saturating_sub(index);
    u32::try_from(points).unwrap_or(u32::MAX)
}

/// Sum of every question's point ceiling.
pub fn max_points(questions: &[Question]) -> u64 {
    questions.iter().map(|q| u64::from(q.max_points())).sum()
}

/// Scale `total` out of `max` onto 0..=1000, rounding halves up.
///
/// A zero `max` is treated as one.
pub fn scaled_score(total: u64, max: u64) -> u32 {
    let denom = max.max(1);
    // round(total / denom * 1000) in integers: floor((2000 * total + denom) / (2 * denom))
    let scaled = (total.saturating_mul(2000).saturating_add(denom)) / (2 * denom);
    u32::try_from(scaled.min(u64::from(MAX_SCALED_SCORE))).unwrap_or(MAX_SCALED_SCORE)
}

/// Coarse label derived from the scaled score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Rookie,
    Pro,
    Elite,
}

impl Tier {
    pub const ELITE_THRESHOLD: u32 = 750;
    pub const PRO_THRESHOLD: u32 = 500;

    pub fn from_score(scaled: u32) -> Self {
        if scaled >= Self::ELITE_THRESHOLD {
            Tier::Elite
        } else if scaled >= Self::PRO_THRESHOLD {
            Tier::Pro
        } else {
            Tier::Rookie
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Rookie => "Rookie",
            Tier::Pro => "Pro",
            Tier::Elite => "Elite",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rookie" => Ok(Tier::Rookie),
            "pro" => Ok(Tier::Pro),
            "elite" => Ok(Tier::Elite),
            other => Err(format!("unknown tier: {other}")),
        }
    }
}

/// Tally of gradable answers in a log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KnowledgeCheck {
    pub total: u32,
    pub correct: u32,
}

impl KnowledgeCheck {
    pub fn from_records(records: &[AnswerRecord]) -> Self {
        records
            .iter()
            .filter(|r| r.gradable)
            .fold(Self::default(), |mut kc, r| {
                kc.total += 1;
                if r.is_correct == Some(true) {
                    kc.correct += 1;
                }
                kc
            })
    }

    pub fn all_correct(&self) -> bool {
        self.total > 0 && self.correct == self.total
    }

    pub fn bonus(&self) -> u32 {
        if self.all_correct() {
            KNOWLEDGE_CHECK_BONUS
        } else {
            0
        }
    }
}

/// The outcome of a completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub scaled_score: u32,
    pub tier: Tier,
    pub total_points: u64,
    pub max_points: u64,
    pub kc_total: u32,
    pub kc_correct: u32,
    pub all_correct: bool,
    pub bonus: u32,
}

impl AssessmentResult {
    /// Score a finished session.
    ///
    /// `aggregate` must already be re-derived from `records`; the running
    /// totals kept during navigation are not trusted here.
    pub fn compute(questions: &[Question], aggregate: &Aggregate, records: &[AnswerRecord]) -> Self {
        let max_points = max_points(questions);
        let total_points = aggregate.total();
        let scaled_score = scaled_score(total_points, max_points);
        let kc = KnowledgeCheck::from_records(records);

        Self {
            scaled_score,
            tier: Tier::from_score(scaled_score),
            total_points,
            max_points,
            kc_total: kc.total,
            kc_correct: kc.correct,
            all_correct: kc.all_correct(),
            bonus: kc.bonus(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;

    fn graded(correct: Option<bool>) -> AnswerRecord {
        AnswerRecord {
            question_id: 1,
            category: Category::Confidence,
            points: 0,
            answer: None,
            gradable: correct.is_some(),
            is_correct: correct,
        }
    }

    #[test]
    fn points_rank_from_the_top() {
        assert_eq!(points_for_choice(3, 0), 2);
        assert_eq!(points_for_choice(3, 1), 1);
        assert_eq!(points_for_choice(3, 2), 0);
        for n in 1..8 {
            assert_eq!(points_for_choice(n, n - 1), 0, "last of {n} options");
            for k in 0..n {
                assert_eq!(points_for_choice(n, k) as usize, n - 1 - k);
            }
        }
    }

    #[test]
    fn points_never_underflow() {
        assert_eq!(points_for_choice(0, 0), 0);
        assert_eq!(points_for_choice(2, 9), 0);
    }

    #[test]
    fn scaled_score_rounds_half_up() {
        assert_eq!(scaled_score(1, 2), 500);
        assert_eq!(scaled_score(2, 3), 667);
        assert_eq!(scaled_score(1, 3), 333);
        // 1/8 * 1000 = 125 exactly, 1/16 * 1000 = 62.5 -> 63
        assert_eq!(scaled_score(1, 8), 125);
        assert_eq!(scaled_score(1, 16), 63);
        assert_eq!(scaled_score(0, 0), 0);
        assert_eq!(scaled_score(4, 4), 1000);
    }

    #[test]
    fn scaled_score_is_clamped() {
        assert_eq!(scaled_score(9, 2), MAX_SCALED_SCORE);
        assert_eq!(scaled_score(3, 0), MAX_SCALED_SCORE);
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(Tier::from_score(1000), Tier::Elite);
        assert_eq!(Tier::from_score(750), Tier::Elite);
        assert_eq!(Tier::from_score(749), Tier::Pro);
        assert_eq!(Tier::from_score(500), Tier::Pro);
        assert_eq!(Tier::from_score(499), Tier::Rookie);
        assert_eq!(Tier::from_score(0), Tier::Rookie);
    }

    #[test]
    fn tier_display_and_parse() {
        assert_eq!(Tier::Elite.to_string(), "Elite");
        assert_eq!("pro".parse::<Tier>().unwrap(), Tier::Pro);
        assert!("legend".parse::<Tier>().is_err());
    }

    #[test]
    fn knowledge_check_without_gradable_answers() {
        let kc = KnowledgeCheck::from_records(&[graded(None), graded(None)]);
        assert_eq!(kc.total, 0);
        assert!(!kc.all_correct());
        assert_eq!(kc.bonus(), 0);
    }

    #[test]
    fn knowledge_check_all_correct_earns_bonus() {
        let kc = KnowledgeCheck::from_records(&[graded(Some(true)), graded(None), graded(Some(true))]);
        assert_eq!((kc.total, kc.correct), (2, 2));
        assert_eq!(kc.bonus(), KNOWLEDGE_CHECK_BONUS);
    }

    #[test]
    fn knowledge_check_one_miss_forfeits_bonus() {
        let kc = KnowledgeCheck::from_records(&[graded(Some(true)), graded(Some(false))]);
        assert_eq!((kc.total, kc.correct), (2, 1));
        assert_eq!(kc.bonus(), 0);
    }

    #[test]
    fn result_is_deterministic() {
        let questions = vec![
            Question::choice(1, "q1", Category::Confidence, ["a", "b", "c"]).with_correct(1),
            Question::choice(2, "q2", Category::Commitment, ["a", "b", "c", "d", "e"]),
        ];
        let records = vec![
            AnswerRecord {
                question_id: 1,
                category: Category::Confidence,
                points: 1,
                answer: Some("b".into()),
                gradable: true,
                is_correct: Some(true),
            },
            AnswerRecord {
                question_id: 2,
                category: Category::Commitment,
                points: 4,
                answer: Some("a".into()),
                gradable: false,
                is_correct: None,
            },
        ];
        let agg = Aggregate::from_records(Aggregate::seeded_for(&questions), &records);
        let first = AssessmentResult::compute(&questions, &agg, &records);
        let second = AssessmentResult::compute(&questions, &agg, &records);
        assert_eq!(first, second);
        assert_eq!(first.max_points, 6);
        assert_eq!(first.total_points, 5);
        assert_eq!(first.scaled_score, 833);
        assert_eq!(first.tier, Tier::Elite);
        assert_eq!(first.bonus, KNOWLEDGE_CHECK_BONUS);
    }
}
