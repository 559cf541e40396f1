use chrono::{DateTime, Utc};
use pgsync_model::{FilmWork, NamedItem, Role};
use uuid::Uuid;

/// One row of the enrichment query's film/person/genre cross-product
/// (spec.md §4.3): a single filmwork joined with at most one person-role
/// pair and at most one genre. Absent joins carry `None` in the
/// corresponding columns rather than being omitted.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EnrichmentRow {
    pub film_id: Uuid,
    pub film_title: Option<String>,
    pub film_description: Option<String>,
    pub film_kind: String,
    pub film_rating: Option<f64>,
    pub film_updated_at: DateTime<Utc>,
    pub person_id: Option<Uuid>,
    pub person_name: Option<String>,
    pub person_role: Option<String>,
    pub person_updated_at: Option<DateTime<Utc>>,
    pub genre_id: Option<Uuid>,
    pub genre_name: Option<String>,
    pub genre_updated_at: Option<DateTime<Utc>>,
}

/// Folds a stream of [`EnrichmentRow`]s, ordered by `(film_updated_at,
/// film_id)`, into one [`FilmWork`] per distinct `film_id`. Consecutive rows
/// sharing a `film_id` are merged; the fold relies on the caller's ordering
/// guarantee and does not re-sort (spec.md §4.3).
pub fn fold_rows(rows: impl IntoIterator<Item = EnrichmentRow>) -> Vec<FilmWork> {
    let mut out: Vec<FilmWork> = Vec::new();

    for row in rows {
        let target = match out.last_mut() {
            Some(fw) if fw.id == row.film_id => fw,
            _ => {
                out.push(FilmWork::new(
                    row.film_id,
                    row.film_title.clone(),
                    row.film_description.clone(),
                    row.film_kind.clone(),
                    row.film_rating,
                    row.film_updated_at,
                ));
                out.last_mut().expect("just pushed")
            }
        };

        if let (Some(person_id), Some(name), Some(role_raw), Some(updated_at)) = (
            row.person_id,
            row.person_name.as_deref(),
            row.person_role.as_deref(),
            row.person_updated_at,
        ) {
            if let Some(role) = Role::parse(role_raw) {
                target.add_person(
                    role,
                    NamedItem::new(person_id, name.to_string(), updated_at),
                );
            }
        }

        if let (Some(genre_id), Some(name), Some(updated_at)) = (
            row.genre_id,
            row.genre_name.as_deref(),
            row.genre_updated_at,
        ) {
            target.add_genre(NamedItem::new(genre_id, name.to_string(), updated_at));
        }
    }

    out
}
