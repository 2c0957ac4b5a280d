//! The `hite feedback` command.

use std::path::PathBuf;

use anyhow::Result;

use hite_core::feedback::{clear_draft, FeedbackRatings, MAX_STARS};

pub fn execute(helpful: u8, engaging: u8, clear: bool, config_path: Option<PathBuf>) -> Result<()> {
    let (_, store) = super::open_store(config_path.as_deref())?;

    if clear {
        clear_draft(store.as_ref());
        println!("Feedback cleared.");
        return Ok(());
    }

    anyhow::ensure!(
        helpful <= MAX_STARS && engaging <= MAX_STARS,
        "ratings must be between 0 and {MAX_STARS}"
    );

    let ratings = FeedbackRatings::new(helpful, engaging);
    let draft = ratings.draft();
    if !ratings.save(store.as_ref()) {
        eprintln!("Warning: feedback could not be saved.");
    }

    println!(
        "Helpful {}  Engaging {}  Overall {}",
        stars(draft.helpful),
        stars(draft.engaging),
        stars(draft.overall)
    );
    Ok(())
}

fn stars(n: u8) -> String {
    let n = usize::from(n.min(MAX_STARS));
    format!("{}{}", "*".repeat(n), ".".repeat(usize::from(MAX_STARS) - n))
}
