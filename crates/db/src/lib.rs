//! PostgreSQL persistence for TaskForge projects.
//!
//! Repositories are zero-sized structs with async methods taking `&PgPool`.
//! [`ProjectStore`] sits on top of them and is the entry point callers use:
//! it validates input, applies the creation policy and turns database
//! failures into [`taskforge_core::error::CoreError`] variants.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub mod config;
pub mod error;
pub mod models;
pub mod project_store;
pub mod repositories;

pub use config::DbConfig;
pub use error::{StoreError, StoreResult};
pub use project_store::ProjectStore;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from loaded configuration.
pub async fn create_pool(config: &DbConfig) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.database_url)
        .await
}

/// Round-trip a trivial query to prove the pool can reach the server.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map(|_| ())
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
