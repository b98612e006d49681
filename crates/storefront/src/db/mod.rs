//! `PostgreSQL` connection for the session store.
//!
//! The storefront keeps no tables of its own. Carts live inside sessions,
//! which `tower-sessions-sqlx-store` keeps in the `tower_sessions` schema.
//! The schema is created on startup and by:
//! ```bash
//! cargo run -p nexus-cli -- migrate storefront
//! ```

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
