pub mod by_filmwork;
pub mod by_genre;
pub mod by_person;
pub mod coordinator;

use async_trait::async_trait;
use pgsync_model::{ExtractorCursor, FilmWork};
use sqlx::PgConnection;

pub use coordinator::Coordinator;

/// Result of one [`Extract::extract_batch`] call (spec.md §4.4).
///
/// Both fields empty means the sub-extractor is exhausted for the given
/// input cursor and the coordinator should move on to the next one.
#[derive(Debug, Clone)]
pub struct ExtractBatch {
    pub filmworks: Vec<FilmWork>,
    pub cursor_out: Option<ExtractorCursor>,
}

impl ExtractBatch {
    pub fn empty() -> Self {
        Self {
            filmworks: Vec::new(),
            cursor_out: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.filmworks.is_empty() && self.cursor_out.is_none()
    }
}

/// One cursor-driven producer of filmwork batches (spec.md §4.4, §9: "model
/// as a tagged variant or a small interface with three implementations").
#[async_trait]
pub trait Extract {
    async fn extract_batch(
        &mut self,
        conn: &mut PgConnection,
        cursor_in: ExtractorCursor,
        batch_size: i64,
    ) -> crate::error::Result<ExtractBatch>;
}
