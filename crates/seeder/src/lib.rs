//! # FarmTech Seeder
//!
//! Demo data for a fresh database.
//!
//! - `generator`: a pure, deterministic mock reading generator. Same sensors,
//!   count and anchor always give the same readings.
//! - `populate`: writes a demo producer, its areas and sensors, the reference
//!   crops and a generated history through any `FarmRepository`.

pub mod error;
pub mod generator;
pub mod populate;

pub use error::SeedError;
pub use generator::{
    generate_readings, generate_readings_over, MockReading, MockSensors, DEFAULT_READINGS,
    DEFAULT_WINDOW,
};
pub use populate::{populate, SeedSummary, DEMO_TAX_ID};
