use crate::enums::{SensorKind, SensorStatus};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A rural producer. Owns any number of areas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Producer {
    pub id: i64,
    pub name: String,
    /// CPF/CNPJ or equivalent. Unique across producers.
    pub tax_id: String,
    pub email: Option<String>,
}

/// A plantation area belonging to a producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Area {
    pub id: i64,
    pub producer_id: i64,
    pub name: String,
    pub location: String,
    /// Size in hectares.
    pub size: Option<f64>,
}

/// Reference data for a crop and the soil conditions it prefers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Crop {
    pub id: i64,
    pub popular_name: String,
    pub scientific_name: Option<String>,
    pub ph_min: Option<f64>,
    pub ph_max: Option<f64>,
    pub humidity_min: Option<f64>,
    pub humidity_max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Sensor {
    pub id: i64,
    pub area_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: SensorKind,
    pub install_date: Option<NaiveDate>,
    pub status: SensorStatus,
}

/// A single measurement. `sensor_type` is a copy of the owning sensor's kind taken
/// at insert time, so readings can be filtered without joining `sensor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Reading {
    pub id: i64,
    pub sensor_id: i64,
    pub sensor_type: SensorKind,
    pub timestamp: NaiveDateTime,
    pub value: f64,
    /// Extra channels for multi-metric sensors (e.g. P and K on a nutrients sensor).
    pub secondary_value: Option<f64>,
    pub tertiary_value: Option<f64>,
}

impl Reading {
    pub fn point(&self) -> (NaiveDateTime, f64) {
        (self.timestamp, self.value)
    }
}
