//! hite-store: Durable storage and configuration.
//!
//! Implements the `KeyValueStore` trait on top of a JSON file and loads the
//! `hite.toml` configuration that selects a store and tunes the engine.

pub mod config;
pub mod file;

pub use config::{create_store, load_config_from, HiteConfig, StoreConfig};
pub use file::JsonFileStore;
