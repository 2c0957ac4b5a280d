pub mod feedback;
pub mod init;
pub mod reset;
pub mod run;
pub mod summary;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use hite_core::store::KeyValueStore;
use hite_store::{create_store, load_config_from, HiteConfig};

/// Load the configuration and open the store it names.
fn open_store(config_path: Option<&Path>) -> Result<(HiteConfig, Arc<dyn KeyValueStore>)> {
    let config = load_config_from(config_path)?;
    let store = create_store(&config.store);
    Ok((config, store))
}
