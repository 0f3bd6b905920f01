//! Database migration command.
//!
//! ```bash
//! bl-cli migrate
//! ```
//!
//! Applies `crates/portal/migrations/` and creates the tower-sessions table.
//! Reads `PORTAL_DATABASE_URL`, falling back to `DATABASE_URL`.

use branchline_portal::db::create_pool;
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use super::{DATABASE_URL_VAR, database_url};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run the portal migrations, then the session store migration.
///
/// # Errors
///
/// Returns an error if the database URL is missing or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let url = database_url().ok_or(MigrationError::MissingEnvVar(DATABASE_URL_VAR))?;

    tracing::info!("Connecting to portal database...");
    let pool = create_pool(&url).await?;

    tracing::info!("Running portal migrations...");
    sqlx::migrate!("../portal/migrations").run(&pool).await?;

    tracing::info!("Creating session store table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Migrations complete");
    Ok(())
}
