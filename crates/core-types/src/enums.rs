use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a sensor measures. Stored as lowercase text in `sensor.type` and copied
/// onto every reading as `reading.sensor_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SensorKind {
    Humidity,
    Ph,
    Nutrients,
    Temperature,
}

impl SensorKind {
    pub const ALL: [SensorKind; 4] = [
        SensorKind::Humidity,
        SensorKind::Ph,
        SensorKind::Nutrients,
        SensorKind::Temperature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Humidity => "humidity",
            SensorKind::Ph => "ph",
            SensorKind::Nutrients => "nutrients",
            SensorKind::Temperature => "temperature",
        }
    }

    /// Unit shown next to a value of this kind.
    pub fn unit(&self) -> &'static str {
        match self {
            SensorKind::Humidity => "%",
            SensorKind::Ph => "",
            SensorKind::Nutrients => "mg/kg",
            SensorKind::Temperature => "°C",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "humidity" => Ok(SensorKind::Humidity),
            "ph" => Ok(SensorKind::Ph),
            "nutrients" => Ok(SensorKind::Nutrients),
            "temperature" => Ok(SensorKind::Temperature),
            _ => Err(CoreError::UnknownVariant("sensor type".to_string(), s.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SensorStatus {
    #[default]
    Active,
    Inactive,
    Maintenance,
}

impl SensorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorStatus::Active => "active",
            SensorStatus::Inactive => "inactive",
            SensorStatus::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(SensorStatus::Active),
            "inactive" => Ok(SensorStatus::Inactive),
            "maintenance" => Ok(SensorStatus::Maintenance),
            _ => Err(CoreError::UnknownVariant("sensor status".to_string(), s.trim().to_string())),
        }
    }
}

/// The persisted entity types, used to address a table generically (delete, existence checks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Producer,
    Area,
    Crop,
    Sensor,
    Reading,
}

impl EntityKind {
    /// The table backing this entity.
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Producer => "producer",
            EntityKind::Area => "area",
            EntityKind::Crop => "crop",
            EntityKind::Sensor => "sensor",
            EntityKind::Reading => "reading",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Producer => "Producer",
            EntityKind::Area => "Area",
            EntityKind::Crop => "Crop",
            EntityKind::Sensor => "Sensor",
            EntityKind::Reading => "Reading",
        };
        f.write_str(label)
    }
}
