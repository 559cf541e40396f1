use pgsync_config::Config;
use reqwest::Client;
use sqlx::PgPool;
use tracing::{error, info};

use crate::backoff::Backoff;
use crate::db;
use crate::extractor::Coordinator;
use crate::loader::Loader;
use crate::state_store::{load_cursor, store_cursor, StateStore};

/// Outer loop: read cursors, drain the extractor/loader pipeline, sleep
/// (spec.md §4.6). One `Orchestrator` runs for the process lifetime; a
/// fresh `Coordinator` is built at the top of every iteration so the
/// sub-extractor pointer and phase state reset per poll (spec.md §9).
pub struct Orchestrator {
    pool: PgPool,
    client: Client,
    config: Config,
    state: Box<dyn StateStore>,
}

impl Orchestrator {
    pub async fn connect(config: Config, state: Box<dyn StateStore>) -> crate::error::Result<Self> {
        let pool = db::connect(&config.postgres).await?;
        Ok(Self {
            pool,
            client: Client::new(),
            config,
            state,
        })
    }

    /// Runs until a shutdown signal arrives, one iteration per
    /// `sync_interval`. Any error inside an iteration is caught, logged, and
    /// the loop sleeps before retrying — nothing here propagates out of
    /// `run` (spec.md §4.6, §7).
    ///
    /// Cancellation is only observed between iterations, during the
    /// `sync_interval` sleep: an in-flight extract or load always finishes
    /// (or exhausts its own backoff budget) before shutdown takes effect
    /// (spec.md §5).
    pub async fn run(&self) {
        loop {
            if let Err(err) = self.run_iteration().await {
                error!(error = %err, "sync iteration failed, will retry next cycle");
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.sync_interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown signal received, exiting at iteration boundary");
                    return;
                }
            }
        }
    }

    async fn run_iteration(&self) -> crate::error::Result<()> {
        let mut cursor = load_cursor(&*self.state).await?;

        let db_backoff = Backoff::new(self.config.postgres.backoff);
        let es_backoff = Backoff::new(self.config.elasticsearch.backoff);
        let mut coordinator = Coordinator::new(
            self.pool.clone(),
            db_backoff,
            self.config.batch_size as i64,
        );
        let loader = Loader::new(self.client.clone(), self.config.elasticsearch.clone(), es_backoff);

        loop {
            let batch = coordinator.extract_batch(cursor).await?;
            if batch.filmworks.is_empty() && batch.cursor_out.is_none() {
                break;
            }

            if !batch.filmworks.is_empty() {
                let (ok, _high_watermark) = loader.load(&batch.filmworks).await?;
                if ok {
                    if let Some(cursor_out) = batch.cursor_out {
                        cursor = cursor.advanced_with(&cursor_out);
                        store_cursor(&*self.state, &cursor).await?;
                    }
                } else {
                    info!("bulk load reported failure, leaving cursor unadvanced for retry");
                    break;
                }
            } else if let Some(cursor_out) = batch.cursor_out {
                cursor = cursor.advanced_with(&cursor_out);
                store_cursor(&*self.state, &cursor).await?;
            }
        }

        Ok(())
    }
}
