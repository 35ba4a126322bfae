use sqlx::PgPool;

use super::repo_types::{Interest, Language, LoginProvider};

pub async fn interest_exists(db: &PgPool, id: i64) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(r#"SELECT EXISTS(SELECT 1 FROM interest WHERE id = $1)"#)
        .bind(id)
        .fetch_one(db)
        .await
}

pub async fn get_interest(db: &PgPool, id: i64) -> sqlx::Result<Interest> {
    sqlx::query_as::<_, Interest>(
        r#"
        SELECT id, name
          FROM interest
         WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_one(db)
    .await
}

pub async fn list_interests(db: &PgPool) -> sqlx::Result<Vec<Interest>> {
    sqlx::query_as::<_, Interest>(r#"SELECT id, name FROM interest ORDER BY name ASC"#)
        .fetch_all(db)
        .await
}

/// Interests linked to a profile, ordered by name.
pub async fn list_interests_by_profile(db: &PgPool, profile_id: i64) -> sqlx::Result<Vec<Interest>> {
    sqlx::query_as::<_, Interest>(
        r#"
        SELECT i.id, i.name
          FROM interest i
          JOIN users_profile_interests upi ON upi.fk_interest = i.id
         WHERE upi.fk_profile = $1
         ORDER BY i.name ASC
        "#,
    )
    .bind(profile_id)
    .fetch_all(db)
    .await
}

pub async fn language_exists(db: &PgPool, id: i64) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(r#"SELECT EXISTS(SELECT 1 FROM language WHERE id = $1)"#)
        .bind(id)
        .fetch_one(db)
        .await
}

pub async fn get_language(db: &PgPool, id: i64) -> sqlx::Result<Language> {
    sqlx::query_as::<_, Language>(
        r#"
        SELECT id, name, name_iso2, name_iso3
          FROM language
         WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_one(db)
    .await
}

pub async fn list_languages(db: &PgPool) -> sqlx::Result<Vec<Language>> {
    sqlx::query_as::<_, Language>(
        r#"SELECT id, name, name_iso2, name_iso3 FROM language ORDER BY name ASC"#,
    )
    .fetch_all(db)
    .await
}

pub async fn login_provider_exists(db: &PgPool, id: i64) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(r#"SELECT EXISTS(SELECT 1 FROM login_provider WHERE id = $1)"#)
        .bind(id)
        .fetch_one(db)
        .await
}

pub async fn get_login_provider(db: &PgPool, id: i64) -> sqlx::Result<LoginProvider> {
    sqlx::query_as::<_, LoginProvider>(
        r#"
        SELECT id, name,
               web_clientid, web_secret,
               android_clientid, android_secret,
               iphone_clientid, iphone_secret,
               updated_at
          FROM login_provider
         WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_one(db)
    .await
}
