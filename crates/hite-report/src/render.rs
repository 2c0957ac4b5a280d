//! Markdown and JSON renderings of a results summary.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::summary::{ResultsSummary, ScoreBoardUpdate};

/// Serializable report: the summary plus an optional score-board update.
#[derive(Debug, Serialize)]
pub struct SummaryReport<'a> {
    pub summary: &'a ResultsSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_board: Option<&'a ScoreBoardUpdate>,
}

/// Pretty-printed JSON.
pub fn to_json(summary: &ResultsSummary, update: Option<&ScoreBoardUpdate>) -> Result<String> {
    let report = SummaryReport {
        summary,
        score_board: update,
    };
    serde_json::to_string_pretty(&report).context("failed to serialize summary")
}

/// A markdown document suitable for pasting into a PR or chat.
pub fn to_markdown(summary: &ResultsSummary, update: Option<&ScoreBoardUpdate>) -> String {
    let mut md = String::new();

    md.push_str("## HITE results\n\n");
    if !summary.session_complete {
        md.push_str("_No completed session yet._\n\n");
    }
    md.push_str(&format!(
        "**Score:** {} / 1000 ({})\n\n",
        summary.scaled_score, summary.tier
    ));
    let level = update.map_or(summary.xp_level, |u| u.xp_level);
    md.push_str(&format!("**Level:** {level}\n\n"));

    md.push_str("### Categories\n\n");
    md.push_str("| Category | Points |\n");
    md.push_str("|----------|--------|\n");
    for (category, points) in summary.aggregate.iter() {
        md.push_str(&format!("| {category} | {points} |\n"));
    }
    md.push('\n');

    md.push_str("### Knowledge check\n\n");
    md.push_str(&format!(
        "{}/{} correct, bonus +{}\n\n",
        summary.kc_correct, summary.kc_total, summary.bonus
    ));

    md.push_str("### Points\n\n");
    md.push_str("| Source | Points |\n");
    md.push_str("|--------|--------|\n");
    md.push_str(&format!("| Completed | +{} |\n", summary.completed_points));
    md.push_str(&format!("| Streak | +{} |\n", summary.streak_points));
    md.push_str(&format!("| Knowledge check | +{} |\n", summary.bonus));
    md.push_str(&format!("| **Total** | **+{}** |\n", summary.delta()));

    if let Some(update) = update {
        md.push_str(&format!(
            "\nScore board: {} -> {}, streak {} -> {} days, level {}\n",
            update.previous_score,
            update.new_score,
            update.previous_streak_days,
            update.streak_days,
            update.xp_level.as_str()
        ));
    }

    md
}
