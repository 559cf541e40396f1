use chrono::{DateTime, Utc};
use pgsync_config::ElasticsearchConfig;
use pgsync_model::{FilmWork, NamedItem};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::backoff::Backoff;
use crate::error::{Result, SyncError};

/// Bulk loader against the search backend's `_bulk` endpoint (spec.md §4.5).
pub struct Loader {
    client: Client,
    config: ElasticsearchConfig,
    backoff: Backoff,
}

impl Loader {
    pub fn new(client: Client, config: ElasticsearchConfig, backoff: Backoff) -> Self {
        Self {
            client,
            config,
            backoff,
        }
    }

    /// `load(filmworks) -> (ok, high_watermark)`. Connection-level failures
    /// are retried under backoff; a bulk response with `errors: true` or a
    /// non-200 status is a non-transient failure from the wrapper's point
    /// of view, so it's returned to the caller as `(false, None)` rather
    /// than retried here — the orchestrator retries it next iteration by
    /// simply not advancing the cursor (spec.md §4.5, §4.6, §7).
    pub async fn load(&self, filmworks: &[FilmWork]) -> Result<(bool, Option<DateTime<Utc>>)> {
        if filmworks.is_empty() {
            return Ok((true, None));
        }

        let body = build_bulk_body(filmworks);
        let url = self.config.bulk_url();
        let client = &self.client;

        let response = self
            .backoff
            .retry(|| {
                let body = body.clone();
                async {
                    client
                        .post(url.as_str())
                        .header("Content-Type", "application/x-ndjson")
                        .body(body)
                        .send()
                        .await
                        .map_err(SyncError::from)
                }
            })
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "bulk load request rejected");
            return Ok((false, None));
        }

        let payload: BulkResponse = response.json().await.unwrap_or(BulkResponse { errors: false });
        if payload.errors {
            warn!("bulk load reported per-document errors");
            return Ok((false, None));
        }

        let high_watermark = filmworks.iter().map(|fw| fw.updated_at).max();
        info!(count = filmworks.len(), "bulk load succeeded");
        Ok((true, high_watermark))
    }
}

/// The bulk endpoint's response, filtered to `errors` via `filter_path=errors`
/// (spec.md §6). A response with no `errors` key at all (some backends omit
/// it when nothing failed) deserializes as `false` via `#[serde(default)]`.
#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
}

/// Builds the NDJSON body: an `index`/`delete` action line followed by a
/// document body line for `index` actions (spec.md §4.5).
fn build_bulk_body(filmworks: &[FilmWork]) -> String {
    let mut out = String::new();
    for fw in filmworks {
        if fw.is_tombstone() {
            out.push_str(&json!({"delete": {"_id": fw.id.to_string()}}).to_string());
            out.push('\n');
        } else {
            out.push_str(&json!({"index": {"_id": fw.id.to_string()}}).to_string());
            out.push('\n');
            out.push_str(&serde_json::to_string(&BulkDocument::from(fw)).expect("serializable"));
            out.push('\n');
        }
    }
    out
}

/// The document body indexed for a non-tombstone filmwork. `*_names` fields
/// carry the comma-joined names for plain full-text search over a flat
/// field, alongside the structured `{id, name}` arrays.
#[derive(Debug, Serialize)]
struct BulkDocument {
    id: String,
    title: Option<String>,
    description: Option<String>,
    imdb_rating: Option<f64>,
    #[serde(rename = "type")]
    kind: String,
    actors: Vec<NamedItemView>,
    writers: Vec<NamedItemView>,
    directors: Vec<NamedItemView>,
    genres: Vec<NamedItemView>,
    actors_names: String,
    writers_names: String,
    directors_names: String,
    genres_names: String,
}

#[derive(Debug, Serialize)]
struct NamedItemView {
    id: String,
    name: String,
}

impl From<&FilmWork> for BulkDocument {
    fn from(fw: &FilmWork) -> Self {
        Self {
            id: fw.id.to_string(),
            title: fw.title.clone(),
            description: fw.description.clone(),
            imdb_rating: fw.rating,
            kind: fw.kind.clone(),
            actors: view_set(&fw.actors),
            writers: view_set(&fw.writers),
            directors: view_set(&fw.directors),
            genres: view_set(&fw.genres),
            actors_names: joined_names(&fw.actors),
            writers_names: joined_names(&fw.writers),
            directors_names: joined_names(&fw.directors),
            genres_names: joined_names(&fw.genres),
        }
    }
}

fn view_set(items: &std::collections::HashSet<NamedItem>) -> Vec<NamedItemView> {
    items
        .iter()
        .map(|i| NamedItemView {
            id: i.id.to_string(),
            name: i.name.clone(),
        })
        .collect()
}

fn joined_names(items: &std::collections::HashSet<NamedItem>) -> String {
    let mut names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
    names.sort_unstable();
    names.join(", ")
}
