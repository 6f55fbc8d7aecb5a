//! Persistence and completion aggregation.
//!
//! [`JobStore`] is the contract the engine and API depend on;
//! [`PgJobStore`] backs it with Postgres and [`MemoryJobStore`] backs it
//! for tests. [`CompletionAggregator`] watches a project's siblings and
//! fires the project callback exactly once when all of them are ready.

use sqlx::postgres::PgPoolOptions;

pub mod aggregator;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use aggregator::{AggregatorError, CompletionAggregator, CompletionCheck};
pub use error::StoreError;
pub use memory::MemoryJobStore;
pub use postgres::PgJobStore;
pub use store::JobStore;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from the embedded `migrations/` directory.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
