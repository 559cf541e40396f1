use chrono::Utc;
use pgsync_core::extractor::by_filmwork::ByFilmwork;
use pgsync_core::extractor::Extract;
use pgsync_model::ExtractorCursor;
use sqlx::PgPool;
use uuid::Uuid;

async fn insert_filmwork(pool: &PgPool, title: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO film_work (id, title, type) VALUES ($1, $2, 'movie')")
        .bind(id)
        .bind(title)
        .execute(pool)
        .await
        .unwrap();
    id
}

#[sqlx::test(migrator = "pgsync_core::MIGRATOR")]
async fn by_filmwork_emits_a_single_cold_start_row(pool: PgPool) {
    let id = insert_filmwork(&pool, "A").await;

    let mut conn = pool.acquire().await.unwrap();
    let mut extractor = ByFilmwork;
    let batch = extractor
        .extract_batch(&mut conn, ExtractorCursor::epoch(), 100)
        .await
        .unwrap();

    assert_eq!(batch.filmworks.len(), 1);
    assert_eq!(batch.filmworks[0].id, id);
    assert!(batch.filmworks[0].actors.is_empty());
    assert!(batch.cursor_out.is_some());
}

#[sqlx::test(migrator = "pgsync_core::MIGRATOR")]
async fn by_filmwork_exhaustion_returns_empty(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let mut extractor = ByFilmwork;
    let batch = extractor
        .extract_batch(&mut conn, ExtractorCursor::epoch(), 100)
        .await
        .unwrap();

    assert!(batch.filmworks.is_empty());
    assert!(batch.cursor_out.is_none());
}

#[sqlx::test(migrator = "pgsync_core::MIGRATOR")]
async fn by_filmwork_does_not_reselect_already_seen_rows(pool: PgPool) {
    insert_filmwork(&pool, "A").await;

    let mut conn = pool.acquire().await.unwrap();
    let mut extractor = ByFilmwork;
    let first = extractor
        .extract_batch(&mut conn, ExtractorCursor::epoch(), 100)
        .await
        .unwrap();
    let cursor = first.cursor_out.unwrap();

    let second = extractor.extract_batch(&mut conn, cursor, 100).await.unwrap();
    assert!(second.filmworks.is_empty());
}

#[sqlx::test(migrator = "pgsync_core::MIGRATOR")]
async fn deleted_title_is_emitted_as_a_tombstone(pool: PgPool) {
    let id = insert_filmwork(&pool, "A").await;
    sqlx::query("UPDATE film_work SET title = NULL, updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let mut extractor = ByFilmwork;
    let batch = extractor
        .extract_batch(&mut conn, ExtractorCursor::epoch(), 100)
        .await
        .unwrap();

    assert_eq!(batch.filmworks.len(), 1);
    assert!(batch.filmworks[0].is_tombstone());
}

#[sqlx::test(migrator = "pgsync_core::MIGRATOR")]
async fn person_rename_fans_out_to_every_linked_filmwork(pool: PgPool) {
    use pgsync_core::extractor::by_person::ByPerson;

    let person_id = Uuid::new_v4();
    sqlx::query("INSERT INTO person (id, full_name) VALUES ($1, 'Old Name')")
        .bind(person_id)
        .execute(&pool)
        .await
        .unwrap();

    let f1 = insert_filmwork(&pool, "Film 1").await;
    let f2 = insert_filmwork(&pool, "Film 2").await;
    for fw in [f1, f2] {
        sqlx::query(
            "INSERT INTO person_film_work (id, film_work_id, person_id, role) VALUES ($1, $2, $3, 'actor')",
        )
        .bind(Uuid::new_v4())
        .bind(fw)
        .bind(person_id)
        .execute(&pool)
        .await
        .unwrap();
    }

    // Drain the by-filmwork dimension first so the later assertions are
    // attributable purely to the by-person fan-out (mirrors the coordinator
    // always trying by-filmwork before by-person).
    let mut conn = pool.acquire().await.unwrap();
    let mut by_filmwork = ByFilmwork;
    let baseline = by_filmwork
        .extract_batch(&mut conn, ExtractorCursor::epoch(), 100)
        .await
        .unwrap();
    let cursor = baseline.cursor_out.unwrap();

    sqlx::query("UPDATE person SET full_name = 'New Name', updated_at = now() WHERE id = $1")
        .bind(person_id)
        .execute(&pool)
        .await
        .unwrap();

    let mut by_person = ByPerson::default();
    let mut seen = std::collections::HashSet::new();
    loop {
        let batch = by_person.extract_batch(&mut conn, cursor, 100).await.unwrap();
        if batch.filmworks.is_empty() && batch.cursor_out.is_none() {
            break;
        }
        for fw in &batch.filmworks {
            seen.insert(fw.id);
            assert!(fw.actors.iter().any(|a| a.name == "New Name"));
        }
        if batch.cursor_out.is_some() {
            break;
        }
    }

    assert_eq!(seen, [f1, f2].into_iter().collect());
}

#[sqlx::test(migrator = "pgsync_core::MIGRATOR")]
async fn person_fan_out_paginates_by_updated_at_not_by_id(pool: PgPool) {
    use pgsync_core::extractor::by_person::ByPerson;

    let person_id = Uuid::new_v4();
    sqlx::query("INSERT INTO person (id, full_name) VALUES ($1, 'Someone')")
        .bind(person_id)
        .execute(&pool)
        .await
        .unwrap();

    // ids ascend 1, 2, 3 while updated_at order is 2, 3, 1 — exercises a
    // fan-out set that would be mis-paginated if Phase B ordered by id.
    let id_1 = Uuid::from_u128(1);
    let id_2 = Uuid::from_u128(2);
    let id_3 = Uuid::from_u128(3);
    let base = Utc::now();
    for (id, offset) in [(id_1, 30), (id_2, 10), (id_3, 20)] {
        sqlx::query("INSERT INTO film_work (id, title, type, updated_at) VALUES ($1, 'F', 'movie', $2)")
            .bind(id)
            .bind(base + chrono::Duration::seconds(offset))
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO person_film_work (id, film_work_id, person_id, role) VALUES ($1, $2, $3, 'actor')",
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(person_id)
        .execute(&pool)
        .await
        .unwrap();
    }

    let mut conn = pool.acquire().await.unwrap();
    let mut by_filmwork = ByFilmwork;
    let baseline = by_filmwork
        .extract_batch(&mut conn, ExtractorCursor::epoch(), 100)
        .await
        .unwrap();
    let cursor = baseline.cursor_out.unwrap();

    sqlx::query("UPDATE person SET full_name = 'Renamed', updated_at = now() WHERE id = $1")
        .bind(person_id)
        .execute(&pool)
        .await
        .unwrap();

    let mut by_person = ByPerson::default();
    let mut seen = std::collections::HashSet::new();
    loop {
        let batch = by_person.extract_batch(&mut conn, cursor, 2).await.unwrap();
        if batch.filmworks.is_empty() && batch.cursor_out.is_none() {
            break;
        }
        for fw in &batch.filmworks {
            seen.insert(fw.id);
        }
        if batch.cursor_out.is_some() {
            break;
        }
    }

    assert_eq!(seen, [id_1, id_2, id_3].into_iter().collect());
}
