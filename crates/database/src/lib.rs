//! # FarmTech Database Crate
//!
//! This crate is the only place that knows SQL. It exposes the `FarmRepository`
//! trait and one implementation per supported engine.
//!
//! ## Architectural Principles
//!
//! - **One interface, one implementation for every backend:** `SqliteRepository`
//!   and `MySqlRepository` are both stamped out by `sql_repository!` over the
//!   statement text in `statements`; they differ only in driver glue.
//!   `create_repository` picks one from the configuration.
//! - **Scoped connections:** Repositories hold a pool; every operation acquires a
//!   connection for its own duration and returns it afterwards.
//! - **Domain errors over driver errors:** Missing ids are `NotFound` (checked
//!   before writing), constraint violations are `Integrity` with a hint, malformed
//!   input is `Validation`.
//!
//! ## Public API
//!
//! - `create_repository`: Connects, migrates and returns an `Arc<dyn FarmRepository>`.
//! - `FarmRepository`: The CRUD interface for producers, areas, crops, sensors and readings.
//! - `SqliteRepository` / `MySqlRepository`: The backend implementations.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate. The macro module comes first so
// the backend modules can invoke it.
#[macro_use]
mod sql_repository;

pub mod connection;
pub mod error;
pub mod mysql;
pub mod repository;
pub mod sqlite;
pub mod statements;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect_mysql, connect_sqlite};
pub use error::{DbError, IntegrityKind};
pub use mysql::MySqlRepository;
pub use repository::{create_repository, FarmRepository};
pub use sqlite::SqliteRepository;
