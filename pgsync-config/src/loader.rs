use std::path::Path;

use crate::error::ConfigLoadError;
use crate::models::{
    BackoffSettings, Config, ElasticsearchConfig, FileConfig, PostgresConfig,
};

/// Loads and normalizes a [`Config`] from a JSON file on disk.
///
/// Mirrors the teacher's raw-file-config -> normalized-config split
/// (`ferrex-config::loader`): the file format stays a thin, serde-derived
/// mirror of the JSON shape, and this is where environment overrides and
/// defaults are layered in, the way `resolve_database_url` layers
/// `DATABASE_URL`/`PGPASSWORD`-style env vars over file values.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `path`, parses it as JSON, and applies environment overrides
    /// for secrets (`PGSYNC_POSTGRES_PASSWORD`), the direct analogue of the
    /// original Python project's `python-dotenv`-backed `.env` overlay.
    pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigLoadError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let file_config: FileConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::normalize(file_config))
    }

    fn normalize(file: FileConfig) -> Config {
        let password = std::env::var("PGSYNC_POSTGRES_PASSWORD")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or(file.postgres_db.dsn.password);

        let postgres = PostgresConfig {
            host: file.postgres_db.dsn.host,
            port: file.postgres_db.dsn.port,
            dbname: file.postgres_db.dsn.dbname,
            user: file.postgres_db.dsn.user,
            password,
            backoff: BackoffSettings::from_seconds(
                file.postgres_db.min_backoff_delay,
                file.postgres_db.max_backoff_delay,
                file.postgres_db.total_backoff_time,
            ),
        };

        let elasticsearch = ElasticsearchConfig {
            host: file.es_db.dsn.host,
            port: file.es_db.dsn.port,
            index: file.es_db.dsn.dbname,
            backoff: BackoffSettings::from_seconds(
                file.es_db.min_backoff_delay,
                file.es_db.max_backoff_delay,
                file.es_db.total_backoff_time,
            ),
        };

        Config {
            postgres,
            elasticsearch,
            state_file_path: file.state_file_path.into(),
            sync_interval: std::time::Duration::from_secs(file.sync_interval),
            batch_size: file.batch_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_json() -> &'static str {
        r#"{
            "postgres_db": {
                "dsn": {"host": "localhost", "port": 5432, "dbname": "movies", "user": "app", "password": "secret"},
                "min_backoff_delay": 0.1,
                "max_backoff_delay": 10,
                "total_backoff_time": 60
            },
            "es_db": {
                "dsn": {"host": "localhost", "port": 9200, "dbname": "movies"},
                "min_backoff_delay": 0.1,
                "max_backoff_delay": 10,
                "total_backoff_time": 60
            },
            "state_file_path": "storage.json",
            "sync_interval": 30,
            "batch_size": 100
        }"#
    }

    #[test]
    fn loads_and_normalizes_a_well_formed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_json().as_bytes()).unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.postgres.host, "localhost");
        assert_eq!(config.postgres.port, 5432);
        assert_eq!(config.elasticsearch.index, "movies");
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.sync_interval.as_secs(), 30);
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = ConfigLoader::load("/nonexistent/storage-config.json").unwrap_err();
        assert!(matches!(err, ConfigLoadError::Io { .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();
        let err = ConfigLoader::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Parse { .. }));
    }

    #[test]
    fn env_override_wins_over_file_password() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_json().as_bytes()).unwrap();

        unsafe {
            std::env::set_var("PGSYNC_POSTGRES_PASSWORD", "from-env");
        }
        let config = ConfigLoader::load(file.path()).unwrap();
        unsafe {
            std::env::remove_var("PGSYNC_POSTGRES_PASSWORD");
        }
        assert_eq!(config.postgres.password, "from-env");
    }
}
