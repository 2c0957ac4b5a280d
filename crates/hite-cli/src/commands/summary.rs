//! The `hite summary` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use hite_report::{to_json, to_markdown, ResultsSummary, ScoreBoard, ScoreBoardUpdate};

pub fn execute(format: String, commit: bool, config_path: Option<PathBuf>) -> Result<()> {
    let (config, store) = super::open_store(config_path.as_deref())?;

    let summary = ResultsSummary::load_with(store.as_ref(), &config.engine_config());
    let update = commit.then(|| {
        ScoreBoard {
            base_score: config.base_score,
            streak_days: config.streak_days,
        }
        .commit(&summary, store.as_ref())
    });
    if update.as_ref().is_some_and(|u| !u.persisted) {
        eprintln!("Warning: the score board could not be saved.");
    }

    match format.as_str() {
        "markdown" | "md" => println!("{}", to_markdown(&summary, update.as_ref())),
        "json" => println!("{}", to_json(&summary, update.as_ref())?),
        "text" => print_summary(&summary, update.as_ref()),
        other => anyhow::bail!("unknown format '{other}' (expected text, markdown or json)"),
    }

    Ok(())
}

fn print_summary(summary: &ResultsSummary, update: Option<&ScoreBoardUpdate>) {
    if !summary.session_complete {
        println!("No completed session yet. Run `hite run` first.");
    }
    println!("Score: {} / 1000 ({})", summary.scaled_score, summary.tier);
    println!(
        "Level: {}",
        update.map_or(summary.xp_level, |u| u.xp_level)
    );
    println!(
        "Knowledge check: {}/{} correct",
        summary.kc_correct, summary.kc_total
    );

    let mut categories = Table::new();
    categories.set_header(vec!["Category", "Points"]);
    for (category, points) in summary.aggregate.iter() {
        categories.add_row(vec![Cell::new(category), Cell::new(points)]);
    }
    println!("\n{categories}");

    let mut points = Table::new();
    points.set_header(vec!["Source", "Points"]);
    points.add_row(vec![
        Cell::new("Completed"),
        Cell::new(format!("+{}", summary.completed_points)),
    ]);
    points.add_row(vec![
        Cell::new("Streak"),
        Cell::new(format!("+{}", summary.streak_points)),
    ]);
    points.add_row(vec![
        Cell::new("Knowledge check"),
        Cell::new(format!("+{}", summary.bonus)),
    ]);
    points.add_row(vec![
        Cell::new("Total"),
        Cell::new(format!("+{}", summary.delta())),
    ]);
    println!("\n{points}");

    if let Some(update) = update {
        println!(
            "\nScore board: {} -> {}  Streak: {} -> {} days  Level: {}",
            update.previous_score,
            update.new_score,
            update.previous_streak_days,
            update.streak_days,
            update.xp_level.as_str()
        );
    }
}
