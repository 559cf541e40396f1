use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pgsync_model::ExtractorCursor;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::Result;
use crate::extractor::by_filmwork::enrich;
use crate::extractor::{Extract, ExtractBatch};
use crate::source::fold_rows;

async fn select_changed_genre_ids(
    conn: &mut PgConnection,
    genres_at: DateTime<Utc>,
    batch_size: i64,
) -> Result<Vec<(Uuid, DateTime<Utc>)>> {
    let rows: Vec<(Uuid, DateTime<Utc>)> = sqlx::query_as(
        "SELECT id, updated_at FROM genre WHERE updated_at > $1 ORDER BY updated_at LIMIT $2",
    )
    .bind(genres_at)
    .bind(batch_size)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

async fn select_fanned_out_filmwork_ids(
    conn: &mut PgConnection,
    genre_ids: &[Uuid],
    inner_fw_at: DateTime<Utc>,
    batch_size: i64,
) -> Result<Vec<Uuid>> {
    let rows: Vec<(Uuid, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT DISTINCT fw.id, fw.updated_at
        FROM film_work fw
        JOIN genre_film_work gfw ON gfw.film_work_id = fw.id
        WHERE gfw.genre_id = ANY($1) AND fw.updated_at > $2
        ORDER BY fw.updated_at
        LIMIT $3
        "#,
    )
    .bind(genre_ids)
    .bind(inner_fw_at)
    .bind(batch_size)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows.into_iter().map(|(id, _)| id).collect())
}

/// By-genre sub-extractor: identical in shape to [`super::by_person::ByPerson`]
/// with `genre` substituted for `person` (spec.md §4.4.3).
#[derive(Debug, Default)]
pub struct ByGenre {
    active_genre_ids: Option<Vec<Uuid>>,
    inner_fw_at: DateTime<Utc>,
    max_genres_at: DateTime<Utc>,
}

#[async_trait]
impl Extract for ByGenre {
    async fn extract_batch(
        &mut self,
        conn: &mut PgConnection,
        cursor_in: ExtractorCursor,
        batch_size: i64,
    ) -> Result<ExtractBatch> {
        if self.active_genre_ids.is_none() {
            let rows = select_changed_genre_ids(conn, cursor_in.genres_at, batch_size).await?;
            if rows.is_empty() {
                return Ok(ExtractBatch::empty());
            }
            let max_genres_at = rows.iter().map(|(_, at)| *at).max().expect("non-empty");
            self.active_genre_ids = Some(rows.into_iter().map(|(id, _)| id).collect());
            self.inner_fw_at = ExtractorCursor::epoch().filmworks_at;
            self.max_genres_at = max_genres_at;
        }

        let genre_ids = self
            .active_genre_ids
            .as_ref()
            .expect("just populated above")
            .clone();

        let fw_ids =
            select_fanned_out_filmwork_ids(conn, &genre_ids, self.inner_fw_at, batch_size).await?;

        if fw_ids.is_empty() {
            let completed_genres_at = self.max_genres_at;
            self.active_genre_ids = None;
            self.inner_fw_at = ExtractorCursor::epoch().filmworks_at;
            return Ok(ExtractBatch {
                filmworks: Vec::new(),
                cursor_out: Some(ExtractorCursor {
                    genres_at: completed_genres_at,
                    ..cursor_in
                }),
            });
        }

        let rows = enrich(conn, &fw_ids).await?;
        let filmworks = fold_rows(rows);
        self.inner_fw_at = filmworks
            .iter()
            .map(|fw| fw.updated_at)
            .max()
            .unwrap_or(self.inner_fw_at);

        Ok(ExtractBatch {
            filmworks,
            cursor_out: None,
        })
    }
}
