use sqlx::{PgPool, Postgres, Transaction};

use super::repo_types::{NewSecurity, ProfileRow, ProfileUpdate, SecurityRow, UserRow};

// ---- Probes ----

pub async fn user_exists(db: &PgPool, id: i64) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(r#"SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)"#)
        .bind(id)
        .fetch_one(db)
        .await
}

pub async fn user_is_active(db: &PgPool, id: i64) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        r#"SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND active)"#,
    )
    .bind(id)
    .fetch_one(db)
    .await
}

/// True when an active user already owns `email`.
pub async fn active_email_exists(db: &PgPool, email: &str) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        r#"SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND active)"#,
    )
    .bind(email)
    .fetch_one(db)
    .await
}

pub async fn profile_exists_by_user(db: &PgPool, user_id: i64) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        r#"SELECT EXISTS(SELECT 1 FROM user_profile WHERE fk_user = $1)"#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await
}

pub async fn security_exists_by_user(db: &PgPool, user_id: i64) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        r#"SELECT EXISTS(SELECT 1 FROM user_security WHERE fk_user = $1)"#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await
}

// ---- Queries ----

pub async fn get_user(db: &PgPool, id: i64) -> sqlx::Result<UserRow> {
    sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, email, name, created_at, updated_at, active
          FROM users
         WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_one(db)
    .await
}

pub async fn get_active_user_by_email(db: &PgPool, email: &str) -> sqlx::Result<UserRow> {
    sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, email, name, created_at, updated_at, active
          FROM users
         WHERE email = $1 AND active
        "#,
    )
    .bind(email)
    .fetch_one(db)
    .await
}

pub async fn get_profile_by_user(db: &PgPool, user_id: i64) -> sqlx::Result<ProfileRow> {
    sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT id, fk_language, age_range, sex, updated_at
          FROM user_profile
         WHERE fk_user = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await
}

pub async fn get_security_by_user(db: &PgPool, user_id: i64) -> sqlx::Result<SecurityRow> {
    sqlx::query_as::<_, SecurityRow>(
        r#"
        SELECT id, fk_login_provider, hash, last_machine, last_login_date, updated_at
          FROM user_security
         WHERE fk_user = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await
}

/// Stamps the login time and origin; returns the affected row count.
pub async fn update_login_data(
    db: &PgPool,
    security_id: i64,
    origin: Option<&str>,
) -> sqlx::Result<u64> {
    let done = sqlx::query(
        r#"
        UPDATE user_security
           SET last_login_date = now(),
               last_machine = $2,
               updated_at = now()
         WHERE id = $1
        "#,
    )
    .bind(security_id)
    .bind(origin)
    .execute(db)
    .await?;
    Ok(done.rows_affected())
}

// ---- Transactional writes ----

pub async fn insert_user_tx(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
    name: &str,
) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO users (email, name)
        VALUES ($1, $2)
        RETURNING id
        "#,
    )
    .bind(email)
    .bind(name)
    .fetch_one(&mut **tx)
    .await
}

pub async fn insert_security_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    security: &NewSecurity,
) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO user_security (fk_user, fk_login_provider, hash, last_machine)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(security.provider_id)
    .bind(security.hash.as_deref()) // NULL for federated accounts
    .bind(security.last_machine.as_deref())
    .fetch_one(&mut **tx)
    .await
}

pub async fn update_user_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    email: &str,
    name: &str,
) -> sqlx::Result<u64> {
    let done = sqlx::query(
        r#"
        UPDATE users
           SET email = $2,
               name = $3,
               updated_at = now()
         WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(email)
    .bind(name)
    .execute(&mut **tx)
    .await?;
    Ok(done.rows_affected())
}

pub async fn insert_profile_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    profile: &ProfileUpdate,
) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO user_profile (fk_user, fk_language, age_range, sex)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(profile.language_id)
    .bind(profile.age_range.as_str())
    .bind(profile.sex.as_str())
    .fetch_one(&mut **tx)
    .await
}

/// Scoped by owner, so a profile id belonging to someone else updates nothing.
pub async fn update_profile_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    profile: &ProfileUpdate,
) -> sqlx::Result<u64> {
    let done = sqlx::query(
        r#"
        UPDATE user_profile
           SET fk_language = $3,
               age_range = $4,
               sex = $5,
               updated_at = now()
         WHERE id = $1 AND fk_user = $2
        "#,
    )
    .bind(profile.id)
    .bind(user_id)
    .bind(profile.language_id)
    .bind(profile.age_range.as_str())
    .bind(profile.sex.as_str())
    .execute(&mut **tx)
    .await?;
    Ok(done.rows_affected())
}

/// Delete-all-then-insert-all for the profile's interest links.
pub async fn replace_interests_tx(
    tx: &mut Transaction<'_, Postgres>,
    profile_id: i64,
    interest_ids: &[i64],
) -> sqlx::Result<()> {
    sqlx::query(r#"DELETE FROM users_profile_interests WHERE fk_profile = $1"#)
        .bind(profile_id)
        .execute(&mut **tx)
        .await?;

    if interest_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO users_profile_interests (fk_profile, fk_interest)
        SELECT $1, unnest($2::bigint[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(profile_id)
    .bind(interest_ids)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
