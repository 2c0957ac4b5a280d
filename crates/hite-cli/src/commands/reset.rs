//! The `hite reset` command.

use std::path::PathBuf;

use anyhow::Result;

use hite_core::store::{keys, remove_soft};

pub fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let (_, store) = super::open_store(config_path.as_deref())?;

    let failed = keys::ALL
        .iter()
        .filter(|key| !remove_soft(store.as_ref(), key))
        .count();

    anyhow::ensure!(
        failed == 0,
        "{failed} key(s) could not be removed from the {} store",
        store.name()
    );
    println!("Cleared {} store.", store.name());
    Ok(())
}
