use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Raw configuration as it appears in the JSON file (spec.md §6). Field
/// names match the JSON keys exactly so `serde_json` can deserialize the
/// file with no renaming.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileConfig {
    pub postgres_db: FilePostgresConfig,
    pub es_db: FileEsConfig,
    #[serde(default = "FileConfig::default_state_file_path")]
    pub state_file_path: String,
    #[serde(default = "FileConfig::default_sync_interval")]
    pub sync_interval: u64,
    #[serde(default = "FileConfig::default_batch_size")]
    pub batch_size: usize,
}

impl FileConfig {
    fn default_state_file_path() -> String {
        "storage.json".to_string()
    }

    fn default_sync_interval() -> u64 {
        30
    }

    fn default_batch_size() -> usize {
        100
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilePostgresConfig {
    pub dsn: FilePostgresDsn,
    pub min_backoff_delay: f64,
    pub max_backoff_delay: f64,
    pub total_backoff_time: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilePostgresDsn {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileEsConfig {
    pub dsn: FileEsDsn,
    pub min_backoff_delay: f64,
    pub max_backoff_delay: f64,
    pub total_backoff_time: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileEsDsn {
    pub host: String,
    pub port: u16,
    pub dbname: String,
}

/// Normalized, strongly-typed configuration used by the rest of the
/// workspace. `ConfigLoader::load` produces this from a [`FileConfig`] plus
/// environment overrides.
#[derive(Debug, Clone)]
pub struct Config {
    pub postgres: PostgresConfig,
    pub elasticsearch: ElasticsearchConfig,
    pub state_file_path: PathBuf,
    pub sync_interval: Duration,
    pub batch_size: usize,
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub backoff: BackoffSettings,
}

impl PostgresConfig {
    /// Effective `postgres://` connection string for `sqlx::PgPool`.
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{user}:{password}@{host}:{port}/{dbname}",
            user = self.user,
            password = self.password,
            host = self.host,
            port = self.port,
            dbname = self.dbname,
        )
    }
}

#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    pub host: String,
    pub port: u16,
    pub index: String,
    pub backoff: BackoffSettings,
}

impl ElasticsearchConfig {
    pub fn bulk_url(&self) -> String {
        format!(
            "http://{host}:{port}/{index}/_bulk?filter_path=errors",
            host = self.host,
            port = self.port,
            index = self.index,
        )
    }
}

/// Backoff parameters for one wrapped operation (spec.md §4.1).
#[derive(Debug, Clone, Copy)]
pub struct BackoffSettings {
    pub start: Duration,
    pub ceiling: Duration,
    pub total_budget: Duration,
    pub factor: f64,
}

impl BackoffSettings {
    /// `factor` is fixed at 2.0 to match the reference design; only the
    /// start/ceiling/budget come from configuration (spec.md §4.1, §6).
    pub fn from_seconds(start_secs: f64, ceiling_secs: f64, total_budget_secs: f64) -> Self {
        Self {
            start: Duration::from_secs_f64(start_secs.max(0.0)),
            ceiling: Duration::from_secs_f64(ceiling_secs.max(0.0)),
            total_budget: Duration::from_secs_f64(total_budget_secs.max(0.0)),
            factor: 2.0,
        }
    }
}
