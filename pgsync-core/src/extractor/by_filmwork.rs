use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pgsync_model::ExtractorCursor;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::Result;
use crate::extractor::{ExtractBatch, Extract};
use crate::source::{fold_rows, EnrichmentRow};

const ENRICHMENT_QUERY: &str = r#"
SELECT
    fw.id AS film_id,
    fw.title AS film_title,
    fw.description AS film_description,
    fw.type AS film_kind,
    fw.rating AS film_rating,
    fw.updated_at AS film_updated_at,
    p.id AS person_id,
    p.full_name AS person_name,
    pfw.role AS person_role,
    p.updated_at AS person_updated_at,
    g.id AS genre_id,
    g.name AS genre_name,
    g.updated_at AS genre_updated_at
FROM film_work fw
LEFT JOIN person_film_work pfw ON pfw.film_work_id = fw.id
LEFT JOIN person p ON p.id = pfw.person_id
LEFT JOIN genre_film_work gfw ON gfw.film_work_id = fw.id
LEFT JOIN genre g ON g.id = gfw.genre_id
WHERE fw.id = ANY($1)
ORDER BY fw.updated_at, fw.id
"#;

/// `SELECT id FROM film_work WHERE updated_at > $1 ORDER BY updated_at LIMIT $2`
/// (spec.md §4.4.1, Query 1).
pub async fn select_changed_filmwork_ids(
    conn: &mut PgConnection,
    filmworks_at: DateTime<Utc>,
    batch_size: i64,
) -> Result<Vec<Uuid>> {
    let ids: Vec<Uuid> = sqlx::query_scalar(
        "SELECT id FROM film_work WHERE updated_at > $1 ORDER BY updated_at LIMIT $2",
    )
    .bind(filmworks_at)
    .bind(batch_size)
    .fetch_all(&mut *conn)
    .await?;
    Ok(ids)
}

/// Runs the enrichment join for a batch-sized set of filmwork ids, ordered
/// by `(film_work.updated_at, film_work.id)` so the fold's consecutive-row
/// invariant holds (spec.md §4.3, §4.4.1 Query 2).
pub async fn enrich(conn: &mut PgConnection, film_ids: &[Uuid]) -> Result<Vec<EnrichmentRow>> {
    let rows = sqlx::query_as::<_, EnrichmentRow>(ENRICHMENT_QUERY)
        .bind(film_ids)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

/// By-filmwork sub-extractor: the direct "a film itself changed" dimension
/// (spec.md §4.4.1). Holds no state of its own — progress lives entirely in
/// the persisted `filmworks_at` cursor component.
#[derive(Debug, Default)]
pub struct ByFilmwork;

#[async_trait]
impl Extract for ByFilmwork {
    async fn extract_batch(
        &mut self,
        conn: &mut PgConnection,
        cursor_in: ExtractorCursor,
        batch_size: i64,
    ) -> Result<ExtractBatch> {
        let ids = select_changed_filmwork_ids(conn, cursor_in.filmworks_at, batch_size).await?;
        if ids.is_empty() {
            return Ok(ExtractBatch::empty());
        }

        let rows = enrich(conn, &ids).await?;
        let filmworks = fold_rows(rows);

        let filmworks_at = filmworks
            .iter()
            .map(|fw| fw.updated_at)
            .max()
            .unwrap_or(cursor_in.filmworks_at);
        let persons_at = filmworks
            .iter()
            .filter_map(|fw| fw.max_person_updated_at())
            .fold(cursor_in.persons_at, |acc, at| acc.max(at));
        let genres_at = filmworks
            .iter()
            .filter_map(|fw| fw.max_genre_updated_at())
            .fold(cursor_in.genres_at, |acc, at| acc.max(at));

        Ok(ExtractBatch {
            filmworks,
            cursor_out: Some(ExtractorCursor {
                filmworks_at,
                persons_at,
                genres_at,
            }),
        })
    }
}
