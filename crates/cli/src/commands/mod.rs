//! CLI subcommands.

pub mod migrate;
pub mod user;

use secrecy::SecretString;

/// Environment variable holding the portal database URL.
pub const DATABASE_URL_VAR: &str = "PORTAL_DATABASE_URL";

/// Fallback database URL variable.
pub const FALLBACK_DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Read the portal database URL, loading `.env` first.
pub fn database_url() -> Option<SecretString> {
    let _ = dotenvy::dotenv();
    std::env::var(DATABASE_URL_VAR)
        .or_else(|_| std::env::var(FALLBACK_DATABASE_URL_VAR))
        .ok()
        .filter(|url| !url.trim().is_empty())
        .map(SecretString::from)
}
