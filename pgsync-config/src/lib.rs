//! Configuration loading for pgsync (spec.md §6): a JSON file describing the
//! Postgres source, the search backend, and pipeline tuning knobs, loaded
//! once at startup.

pub mod error;
pub mod loader;
pub mod models;

pub use error::ConfigLoadError;
pub use loader::ConfigLoader;
pub use models::{
    BackoffSettings, Config, ElasticsearchConfig, FileConfig, PostgresConfig,
};
