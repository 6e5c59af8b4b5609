//! Operator entry point: bring the database up to date and report on projects.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskforge_db::{DbConfig, ProjectStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskforge_admin=info,taskforge_db=info".into()),
        )
        .with((!json).then(tracing_subscriber::fmt::layer))
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .init();

    // --- Configuration ---
    let config = DbConfig::from_env().context("Failed to load database configuration")?;
    tracing::info!(
        max_connections = config.max_connections,
        acquire_timeout_secs = config.acquire_timeout_secs,
        "Loaded database configuration"
    );

    // --- Database ---
    let pool = taskforge_db::create_pool(&config)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    taskforge_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    taskforge_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Report ---
    let store = ProjectStore::new(pool);
    let today = chrono::Utc::now().date_naive();
    let summary = store
        .summary_as_of(today)
        .await
        .context("Failed to load project summary")?;
    tracing::info!(
        active = summary.active,
        overdue = summary.overdue,
        trashed = summary.trashed,
        %today,
        "Project summary"
    );

    Ok(())
}
