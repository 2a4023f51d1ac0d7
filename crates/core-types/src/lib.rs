//! # FarmTech Core Types
//!
//! The shared vocabulary of the workspace: persisted entities, the enums stored in
//! text columns, the inputs accepted by create and update operations, and the
//! parsing helpers used wherever raw user input enters the system.
//!
//! This crate has no knowledge of connections or backends. It only derives the
//! row-mapping traits so the database crate can decode rows into these structs.

pub mod enums;
pub mod error;
pub mod input;
pub mod parse;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{EntityKind, SensorKind, SensorStatus};
pub use error::CoreError;
pub use input::{
    AreaUpdate, Assignment, CropUpdate, EntityUpdate, FieldValue, NewArea, NewCrop, NewProducer,
    NewReading, NewSensor, ProducerUpdate, ReadingUpdate, SensorUpdate, UpdateOutcome,
};
pub use structs::{Area, Crop, Producer, Reading, Sensor};
