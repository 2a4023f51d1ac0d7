use crate::error::DbError;
use crate::mysql::MySqlRepository;
use crate::sqlite::SqliteRepository;
use async_trait::async_trait;
use configuration::{Backend, DatabaseSettings};
use core_types::{
    Area, Crop, EntityKind, EntityUpdate, NewArea, NewCrop, NewProducer, NewReading, NewSensor,
    Producer, Reading, Sensor, SensorKind, UpdateOutcome,
};
use std::sync::Arc;

/// The storage-agnostic interface to the farm records.
///
/// Each backend implements this once. Every method acquires a pooled connection for
/// the duration of the call only; operations that check a parent or the target row
/// before writing do so inside one transaction, so the check and the write see the
/// same state and a failed write leaves nothing behind.
///
/// Listing methods return rows in insertion order (ids ascending), except readings,
/// which are ordered by timestamp and then id. An empty list is not an error.
#[async_trait]
pub trait FarmRepository: Send + Sync {
    /// Which engine this repository talks to.
    fn backend(&self) -> Backend;

    /// Applies the embedded schema for this backend.
    async fn run_migrations(&self) -> Result<(), DbError>;

    /// Round-trips a trivial statement to prove the connection works.
    async fn ping(&self) -> Result<(), DbError>;

    // --- Create ---------------------------------------------------------------

    async fn create_producer(&self, input: &NewProducer) -> Result<i64, DbError>;

    /// Fails with `NotFound` for the producer when `input.producer_id` does not exist.
    async fn create_area(&self, input: &NewArea) -> Result<i64, DbError>;

    async fn create_crop(&self, input: &NewCrop) -> Result<i64, DbError>;

    /// Fails with `NotFound` for the area when `input.area_id` does not exist.
    async fn create_sensor(&self, input: &NewSensor) -> Result<i64, DbError>;

    /// Copies the owning sensor's kind onto the reading. Fails with `NotFound` for
    /// the sensor when `input.sensor_id` does not exist.
    async fn create_reading(&self, input: &NewReading) -> Result<i64, DbError>;

    /// Inserts a batch of readings in a single transaction: either every row is
    /// written or none is. Returns the number of rows inserted.
    async fn create_readings(&self, batch: &[NewReading]) -> Result<u64, DbError>;

    // --- Read -----------------------------------------------------------------

    async fn get_producer(&self, id: i64) -> Result<Producer, DbError>;
    async fn get_area(&self, id: i64) -> Result<Area, DbError>;
    async fn get_crop(&self, id: i64) -> Result<Crop, DbError>;
    async fn get_sensor(&self, id: i64) -> Result<Sensor, DbError>;
    async fn get_reading(&self, id: i64) -> Result<Reading, DbError>;

    async fn list_producers(&self) -> Result<Vec<Producer>, DbError>;
    async fn list_areas(&self, producer_id: Option<i64>) -> Result<Vec<Area>, DbError>;
    async fn list_crops(&self) -> Result<Vec<Crop>, DbError>;
    async fn list_sensors(&self, area_id: Option<i64>) -> Result<Vec<Sensor>, DbError>;
    async fn list_readings(&self, sensor_id: Option<i64>) -> Result<Vec<Reading>, DbError>;

    /// Readings from every sensor in an area, optionally restricted to one kind.
    async fn list_area_readings(
        &self,
        area_id: i64,
        kind: Option<SensorKind>,
    ) -> Result<Vec<Reading>, DbError>;

    // --- Update / Delete ------------------------------------------------------

    /// Writes only the fields present in `changes`.
    ///
    /// The row's existence is checked first, so a missing id is always `NotFound`.
    /// An update with no fields returns `UpdateOutcome::NoChanges` without running
    /// any statement. When the row already holds every supplied value the result is
    /// `UpdateOutcome::Unchanged`, on every backend.
    async fn update(&self, id: i64, changes: &EntityUpdate) -> Result<UpdateOutcome, DbError>;

    /// Deletes one row and lets the engine cascade to its dependents. Returns the
    /// number of rows the statement removed. A missing id is `NotFound`.
    async fn delete(&self, kind: EntityKind, id: i64) -> Result<u64, DbError>;
}

/// Connects to the backend selected in the settings and brings its schema up to date.
pub async fn create_repository(
    settings: &DatabaseSettings,
) -> Result<Arc<dyn FarmRepository>, DbError> {
    let repository: Arc<dyn FarmRepository> = match settings.backend {
        Backend::Sqlite => Arc::new(SqliteRepository::connect(settings).await?),
        Backend::MySql => Arc::new(MySqlRepository::connect(settings).await?),
    };
    repository.run_migrations().await?;
    tracing::info!(backend = ?repository.backend(), "Repository ready.");
    Ok(repository)
}
