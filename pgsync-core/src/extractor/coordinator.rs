use pgsync_model::ExtractorCursor;
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use tracing::warn;

use crate::backoff::Backoff;
use crate::error::Result;
use crate::extractor::by_filmwork::ByFilmwork;
use crate::extractor::by_genre::ByGenre;
use crate::extractor::by_person::ByPerson;
use crate::extractor::{Extract, ExtractBatch};

/// Round-robin composition of the three sub-extractors, owning the database
/// connection for the lifetime of one orchestrator iteration (spec.md
/// §4.4.4, §4.4.5).
///
/// A fresh `Coordinator` is built per iteration, which is what resets the
/// pointer and each sub-extractor's internal phase state (spec.md §9).
pub struct Coordinator {
    pool: PgPool,
    backoff: Backoff,
    conn: Option<PoolConnection<Postgres>>,
    by_filmwork: ByFilmwork,
    by_person: ByPerson,
    by_genre: ByGenre,
    pointer: usize,
    batch_size: i64,
}

impl Coordinator {
    pub fn new(pool: PgPool, backoff: Backoff, batch_size: i64) -> Self {
        Self {
            pool,
            backoff,
            conn: None,
            by_filmwork: ByFilmwork,
            by_person: ByPerson::default(),
            by_genre: ByGenre::default(),
            pointer: 0,
            batch_size,
        }
    }

    async fn ensure_connection(&mut self) -> Result<()> {
        if self.conn.is_none() {
            let pool = self.pool.clone();
            let acquired = self
                .backoff
                .retry(|| {
                    let pool = pool.clone();
                    async move { Ok::<_, crate::error::SyncError>(pool.acquire().await?) }
                })
                .await?;
            self.conn = Some(acquired);
        }
        Ok(())
    }

    /// Runs the active sub-extractor; on a transient database error, drops
    /// the connection and reconnects under backoff before retrying the same
    /// batch (spec.md §4.4.5).
    async fn extract_with_active(
        &mut self,
        which: usize,
        cursor_in: ExtractorCursor,
    ) -> Result<ExtractBatch> {
        loop {
            self.ensure_connection().await?;
            let conn = self.conn.as_mut().expect("ensure_connection populated it");
            let result = match which {
                0 => self.by_filmwork.extract_batch(conn, cursor_in, self.batch_size).await,
                1 => self.by_person.extract_batch(conn, cursor_in, self.batch_size).await,
                _ => self.by_genre.extract_batch(conn, cursor_in, self.batch_size).await,
            };

            match result {
                Ok(batch) => return Ok(batch),
                Err(err) if err.is_transient() => {
                    warn!(error = %err, "transient error during extraction, reconnecting");
                    self.conn = None;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// `extract_batch(cursor_in)` per spec.md §4.4.4: tries the active
    /// sub-extractor; on exhaustion advances the pointer and retries with
    /// the same input cursor; once all three are exhausted returns empty.
    pub async fn extract_batch(&mut self, cursor_in: ExtractorCursor) -> Result<ExtractBatch> {
        let start = self.pointer;
        loop {
            let batch = self.extract_with_active(self.pointer, cursor_in).await?;
            if !batch.is_empty() {
                return Ok(batch);
            }

            self.pointer = (self.pointer + 1) % 3;
            if self.pointer == start {
                return Ok(ExtractBatch::empty());
            }
        }
    }
}
