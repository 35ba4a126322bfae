use sqlx::{PgPool, Postgres, Transaction};

use super::repo_types::{EventRow, NewEvent};

pub async fn event_exists(db: &PgPool, id: i64) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(r#"SELECT EXISTS(SELECT 1 FROM event WHERE id = $1)"#)
        .bind(id)
        .fetch_one(db)
        .await
}

pub async fn event_is_active(db: &PgPool, id: i64) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        r#"SELECT EXISTS(SELECT 1 FROM event WHERE id = $1 AND active)"#,
    )
    .bind(id)
    .fetch_one(db)
    .await
}

pub async fn get_event(db: &PgPool, id: i64) -> sqlx::Result<EventRow> {
    sqlx::query_as::<_, EventRow>(
        r#"
        SELECT id, created_at, start_date, end_date, location,
               longitude, latitude, active, fk_created_by
          FROM event
         WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_one(db)
    .await
}

/// Attendee user ids in join order.
pub async fn list_attendee_ids(db: &PgPool, event_id: i64) -> sqlx::Result<Vec<i64>> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT fk_user
          FROM event_users
         WHERE fk_event = $1
         ORDER BY created_at ASC, fk_user ASC
        "#,
    )
    .bind(event_id)
    .fetch_all(db)
    .await
}

pub async fn insert_event_tx(
    tx: &mut Transaction<'_, Postgres>,
    event: &NewEvent,
) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO event (start_date, end_date, location, longitude, latitude, active, fk_created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(event.start_date)
    .bind(event.end_date)
    .bind(&event.location)
    .bind(event.longitude)
    .bind(event.latitude)
    .bind(event.active)
    .bind(event.created_by)
    .fetch_one(&mut **tx)
    .await
}

/// Creator id, with the event row share-locked for the rest of the transaction.
pub async fn find_event_creator_tx(
    tx: &mut Transaction<'_, Postgres>,
    event_id: i64,
) -> sqlx::Result<Option<i64>> {
    sqlx::query_scalar::<_, i64>(r#"SELECT fk_created_by FROM event WHERE id = $1 FOR SHARE"#)
        .bind(event_id)
        .fetch_optional(&mut **tx)
        .await
}

pub async fn insert_attendee_tx(
    tx: &mut Transaction<'_, Postgres>,
    event_id: i64,
    user_id: i64,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO event_users (fk_event, fk_user)
        VALUES ($1, $2)
        ON CONFLICT (fk_event, fk_user) DO NOTHING
        "#,
    )
    .bind(event_id)
    .bind(user_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn delete_attendee(db: &PgPool, event_id: i64, user_id: i64) -> sqlx::Result<u64> {
    let done = sqlx::query(r#"DELETE FROM event_users WHERE fk_event = $1 AND fk_user = $2"#)
        .bind(event_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(done.rows_affected())
}
