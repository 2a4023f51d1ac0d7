use crate::error::DbError;
use configuration::DatabaseSettings;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Opens a pool against the SQLite file named in the settings, creating the file
/// if needed. Foreign keys are switched on for every connection so `ON DELETE
/// CASCADE` is honoured.
pub async fn connect_sqlite(settings: &DatabaseSettings) -> Result<SqlitePool, DbError> {
    let options = if settings.is_in_memory() {
        SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DbError::ConnectionConfigError(e.to_string()))?
    } else {
        SqliteConnectOptions::new()
            .filename(&settings.sqlite_path)
            .create_if_missing(true)
    }
    .foreign_keys(true);

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs));
    if settings.is_in_memory() {
        // The database lives only as long as its single connection does.
        pool_options = pool_options
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options
        .connect_with(options)
        .await
        .map_err(DbError::ConnectionError)?;

    tracing::info!(path = %settings.sqlite_path.display(), "Connected to SQLite.");
    Ok(pool)
}

/// Opens a pool against the MySQL server described by the settings.
pub async fn connect_mysql(settings: &DatabaseSettings) -> Result<MySqlPool, DbError> {
    let options = MySqlConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.user)
        .password(&settings.password)
        .database(&settings.name);

    let pool = MySqlPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .connect_with(options)
        .await
        .map_err(DbError::ConnectionError)?;

    tracing::info!(host = %settings.host, port = settings.port, database = %settings.name, "Connected to MySQL.");
    Ok(pool)
}
