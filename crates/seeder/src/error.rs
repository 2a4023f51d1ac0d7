use database::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Seeding requires at least one reading per series.")]
    EmptySeries,

    #[error("Database error while seeding: {0}")]
    Database(#[from] DbError),
}
