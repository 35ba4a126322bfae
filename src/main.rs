use std::sync::Arc;

use popmeet::{app, config::AppConfig, db, repository::PgRepository, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "popmeet=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let pool = db::connect(&config.database).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let repo = Arc::new(PgRepository::new(pool));
    let state = AppState::new(repo, config.security.clone(), config.database.timeout);

    if let Err(e) = state.credentials.health() {
        tracing::warn!(error = %e, "credential manager is misconfigured");
    }

    app::serve(app::build_app(state), &config.server).await
}
