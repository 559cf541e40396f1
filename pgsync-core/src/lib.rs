//! The incremental extraction pipeline: cursor-driven sub-extractors, the
//! bulk loader, and the orchestrator loop that glues them together under
//! retry/backoff (spec.md §4).

pub mod backoff;
pub mod db;
pub mod error;
pub mod extractor;
pub mod loader;
pub mod orchestrator;
pub mod source;
pub mod state_store;

pub use backoff::Backoff;
pub use error::{Result, SyncError};
pub use loader::Loader;
pub use orchestrator::Orchestrator;
pub use state_store::{FileStateStore, StateStore};

/// Embedded migrations for the relational source schema this crate reads
/// from (spec.md §3). Used both to provision a fresh database and as the
/// migrator for `#[sqlx::test(migrator = "pgsync_core::MIGRATOR")]`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
