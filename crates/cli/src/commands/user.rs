//! User management commands.
//!
//! ```bash
//! bl-cli user create -e asha@example.in -n "Asha Rao" -p 'correct horse battery'
//! ```
//!
//! The account is created without a face. Its first password-verified
//! session may enrol one; after that the face cannot be replaced.

use branchline_portal::db::{PgUserStore, create_pool};
use branchline_portal::services::auth::{AuthError, AuthService};
use thiserror::Error;

use super::{DATABASE_URL_VAR, database_url};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Auth(#[from] AuthError),
}

/// Create a user with a hashed password.
///
/// # Errors
///
/// Returns an error if the input is invalid, the email is taken, or the
/// database is unreachable.
pub async fn create(email: &str, name: &str, password: &str) -> Result<(), UserError> {
    let url = database_url().ok_or(UserError::MissingEnvVar(DATABASE_URL_VAR))?;
    let pool = create_pool(&url).await?;
    let store = PgUserStore::new(pool);

    let user = AuthService::new(&store).register(name, email, password).await?;

    tracing::info!(user_id = %user.id, email = %user.email, "User created");
    Ok(())
}
