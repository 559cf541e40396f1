use thiserror::Error;

/// Errors surfaced by the extraction pipeline (spec.md §7).
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("state store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state store contains malformed JSON: {0}")]
    StateCorrupt(#[from] serde_json::Error),

    #[error("backoff budget of {budget_secs:.1}s exhausted after {attempts} attempt(s): {source}")]
    BackoffExhausted {
        budget_secs: f64,
        attempts: u32,
        #[source]
        source: Box<SyncError>,
    },
}

impl SyncError {
    /// Whether this error belongs to the "transient I/O" taxonomy kind
    /// (spec.md §7): connection drops, timeouts, and 5xx responses are
    /// retried under backoff; everything else propagates immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::Database(e) => is_transient_sqlx_error(e),
            SyncError::Http(e) => e.is_connect() || e.is_timeout() || e.status().is_some_and(|s| s.is_server_error()),
            SyncError::Io(_) => true,
            SyncError::StateCorrupt(_) => false,
            SyncError::BackoffExhausted { .. } => false,
        }
    }
}

fn is_transient_sqlx_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => true,
        sqlx::Error::Database(db_err) => {
            // Connection-exception and operator-intervention classes (SQLSTATE
            // 08*/57*) are transient; constraint violations and syntax errors
            // are not and should not trigger a useless reconnect-and-retry.
            db_err
                .code()
                .is_some_and(|code| code.starts_with("08") || code.starts_with("57"))
        }
        _ => false,
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
