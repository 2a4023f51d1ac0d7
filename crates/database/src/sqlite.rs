use crate::connection::connect_sqlite;
use crate::error::DbError;
use crate::repository::FarmRepository;
use crate::statements::SQLITE_NULL_SAFE_EQ;
use configuration::{Backend, DatabaseSettings};
use sqlx::sqlite::{Sqlite, SqliteQueryResult};

sql_repository! {
    /// `FarmRepository` backed by a SQLite file (or an in-memory database).
    pub struct SqliteRepository {
        database: Sqlite,
        backend: Backend::Sqlite,
        connect: connect_sqlite,
        migrations: "./migrations/sqlite",
        last_insert_id: inserted_id,
        null_safe_eq: SQLITE_NULL_SAFE_EQ,
    }
}

impl SqliteRepository {
    /// A fresh, migrated, in-memory database. Used by tests and demos.
    pub async fn in_memory() -> Result<Self, DbError> {
        let repository = Self::connect(&DatabaseSettings::in_memory()).await?;
        repository.run_migrations().await?;
        Ok(repository)
    }
}

fn inserted_id(result: &SqliteQueryResult) -> i64 {
    result.last_insert_rowid()
}
