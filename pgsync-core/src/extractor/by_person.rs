use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pgsync_model::ExtractorCursor;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::Result;
use crate::extractor::by_filmwork::enrich;
use crate::extractor::{Extract, ExtractBatch};
use crate::source::fold_rows;

/// `SELECT id, updated_at FROM person WHERE updated_at > $1 ORDER BY updated_at LIMIT $2`
/// (spec.md §4.4.2 Phase A).
async fn select_changed_person_ids(
    conn: &mut PgConnection,
    persons_at: DateTime<Utc>,
    batch_size: i64,
) -> Result<Vec<(Uuid, DateTime<Utc>)>> {
    let rows: Vec<(Uuid, DateTime<Utc>)> = sqlx::query_as(
        "SELECT id, updated_at FROM person WHERE updated_at > $1 ORDER BY updated_at LIMIT $2",
    )
    .bind(persons_at)
    .bind(batch_size)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// `SELECT DISTINCT fw.id, fw.updated_at FROM film_work fw JOIN
/// person_film_work pfw ON pfw.film_work_id=fw.id WHERE pfw.person_id =
/// ANY($1) AND fw.updated_at > $2 ORDER BY fw.updated_at LIMIT $3`
/// (spec.md §4.4.2 Phase B).
async fn select_fanned_out_filmwork_ids(
    conn: &mut PgConnection,
    person_ids: &[Uuid],
    inner_fw_at: DateTime<Utc>,
    batch_size: i64,
) -> Result<Vec<Uuid>> {
    let rows: Vec<(Uuid, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT DISTINCT fw.id, fw.updated_at
        FROM film_work fw
        JOIN person_film_work pfw ON pfw.film_work_id = fw.id
        WHERE pfw.person_id = ANY($1) AND fw.updated_at > $2
        ORDER BY fw.updated_at
        LIMIT $3
        "#,
    )
    .bind(person_ids)
    .bind(inner_fw_at)
    .bind(batch_size)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows.into_iter().map(|(id, _)| id).collect())
}

/// By-person sub-extractor: detects a person-only change (e.g. a rename)
/// and fans it out to every filmwork that person participates in
/// (spec.md §4.4.2).
///
/// `person_ids`/`inner_fw_at`/`max_persons_at` are instance state, reset
/// each time a fresh `Extractor`/coordinator is built per orchestrator
/// iteration (spec.md §9) — never persisted.
#[derive(Debug, Default)]
pub struct ByPerson {
    active_person_ids: Option<Vec<Uuid>>,
    inner_fw_at: DateTime<Utc>,
    max_persons_at: DateTime<Utc>,
}

#[async_trait]
impl Extract for ByPerson {
    async fn extract_batch(
        &mut self,
        conn: &mut PgConnection,
        cursor_in: ExtractorCursor,
        batch_size: i64,
    ) -> Result<ExtractBatch> {
        if self.active_person_ids.is_none() {
            let rows = select_changed_person_ids(conn, cursor_in.persons_at, batch_size).await?;
            if rows.is_empty() {
                return Ok(ExtractBatch::empty());
            }
            let max_persons_at = rows.iter().map(|(_, at)| *at).max().expect("non-empty");
            self.active_person_ids = Some(rows.into_iter().map(|(id, _)| id).collect());
            self.inner_fw_at = ExtractorCursor::epoch().filmworks_at;
            self.max_persons_at = max_persons_at;
        }

        let person_ids = self
            .active_person_ids
            .as_ref()
            .expect("just populated above")
            .clone();

        let fw_ids =
            select_fanned_out_filmwork_ids(conn, &person_ids, self.inner_fw_at, batch_size).await?;

        if fw_ids.is_empty() {
            let completed_persons_at = self.max_persons_at;
            self.active_person_ids = None;
            self.inner_fw_at = ExtractorCursor::epoch().filmworks_at;
            return Ok(ExtractBatch {
                filmworks: Vec::new(),
                cursor_out: Some(ExtractorCursor {
                    persons_at: completed_persons_at,
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

        // Progress within an active person set is tracked internally; the
        // persisted cursor does not advance until Phase B is exhausted.
        Ok(ExtractBatch {
            filmworks,
            cursor_out: None,
        })
    }
}
