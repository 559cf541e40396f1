use std::path::PathBuf;

use thiserror::Error;

/// Configuration errors are fatal at startup (spec.md §7): the process
/// exits rather than retrying, since a malformed config can never
/// self-correct.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path} as JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
