use crate::enums::{EntityKind, SensorKind, SensorStatus};
use crate::error::CoreError;
use crate::parse::ensure_finite;
use crate::structs::Crop;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A typed value destined for a single column of an `UPDATE ... SET` clause.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Real(f64),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

/// A column name paired with its new value.
pub type Assignment = (&'static str, FieldValue);

/// What an `update` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// At least one row was modified.
    Updated,
    /// The statement ran but the engine reported no modified row.
    Unchanged,
    /// No field was supplied, so no statement was executed.
    NoChanges,
}

// ==============================================================================
// Create inputs
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProducer {
    pub name: String,
    pub tax_id: String,
    pub email: Option<String>,
}

impl NewProducer {
    pub fn validate(&self) -> Result<(), CoreError> {
        require_text("name", &self.name)?;
        require_text("tax_id", &self.tax_id)?;
        if let Some(email) = &self.email {
            check_email(email)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArea {
    pub producer_id: i64,
    pub name: String,
    pub location: String,
    pub size: Option<f64>,
}

impl NewArea {
    pub fn validate(&self) -> Result<(), CoreError> {
        require_text("name", &self.name)?;
        require_text("location", &self.location)?;
        check_size(self.size)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewCrop {
    pub popular_name: String,
    pub scientific_name: Option<String>,
    pub ph_min: Option<f64>,
    pub ph_max: Option<f64>,
    pub humidity_min: Option<f64>,
    pub humidity_max: Option<f64>,
}

impl NewCrop {
    pub fn validate(&self) -> Result<(), CoreError> {
        require_text("popular_name", &self.popular_name)?;
        check_ranges(self.ph_min, self.ph_max, self.humidity_min, self.humidity_max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSensor {
    pub area_id: i64,
    pub kind: SensorKind,
    pub install_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: SensorStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReading {
    pub sensor_id: i64,
    pub timestamp: NaiveDateTime,
    pub value: f64,
    pub secondary_value: Option<f64>,
    pub tertiary_value: Option<f64>,
}

impl NewReading {
    pub fn new(sensor_id: i64, timestamp: NaiveDateTime, value: f64) -> Self {
        Self {
            sensor_id,
            timestamp,
            value,
            secondary_value: None,
            tertiary_value: None,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        ensure_finite("value", self.value)?;
        if let Some(v) = self.secondary_value {
            ensure_finite("secondary_value", v)?;
        }
        if let Some(v) = self.tertiary_value {
            ensure_finite("tertiary_value", v)?;
        }
        Ok(())
    }
}

// ==============================================================================
// Partial updates
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProducerUpdate {
    pub name: Option<String>,
    pub tax_id: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaUpdate {
    pub name: Option<String>,
    pub location: Option<String>,
    pub size: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CropUpdate {
    pub popular_name: Option<String>,
    pub scientific_name: Option<String>,
    pub ph_min: Option<f64>,
    pub ph_max: Option<f64>,
    pub humidity_min: Option<f64>,
    pub humidity_max: Option<f64>,
}

impl CropUpdate {
    /// Checks the ranges that would result from applying this update to `current`.
    pub fn validate_against(&self, current: &Crop) -> Result<(), CoreError> {
        check_ranges(
            self.ph_min.or(current.ph_min),
            self.ph_max.or(current.ph_max),
            self.humidity_min.or(current.humidity_min),
            self.humidity_max.or(current.humidity_max),
        )
    }
}

/// The sensor kind is fixed at creation; readings carry a copy of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorUpdate {
    pub install_date: Option<NaiveDate>,
    pub status: Option<SensorStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingUpdate {
    pub timestamp: Option<NaiveDateTime>,
    pub value: Option<f64>,
    pub secondary_value: Option<f64>,
    pub tertiary_value: Option<f64>,
}

/// A partial update for any entity. Only `Some` fields are written.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityUpdate {
    Producer(ProducerUpdate),
    Area(AreaUpdate),
    Crop(CropUpdate),
    Sensor(SensorUpdate),
    Reading(ReadingUpdate),
}

impl EntityUpdate {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityUpdate::Producer(_) => EntityKind::Producer,
            EntityUpdate::Area(_) => EntityKind::Area,
            EntityUpdate::Crop(_) => EntityKind::Crop,
            EntityUpdate::Sensor(_) => EntityKind::Sensor,
            EntityUpdate::Reading(_) => EntityKind::Reading,
        }
    }

    /// Field-level checks that do not need the stored row.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            EntityUpdate::Producer(u) => {
                optional_text("name", &u.name)?;
                optional_text("tax_id", &u.tax_id)?;
                if let Some(email) = &u.email {
                    check_email(email)?;
                }
                Ok(())
            }
            EntityUpdate::Area(u) => {
                optional_text("name", &u.name)?;
                optional_text("location", &u.location)?;
                check_size(u.size)
            }
            EntityUpdate::Crop(u) => {
                optional_text("popular_name", &u.popular_name)?;
                check_ranges(u.ph_min, u.ph_max, u.humidity_min, u.humidity_max)
            }
            EntityUpdate::Sensor(_) => Ok(()),
            EntityUpdate::Reading(u) => {
                for (field, value) in [
                    ("value", u.value),
                    ("secondary_value", u.secondary_value),
                    ("tertiary_value", u.tertiary_value),
                ] {
                    if let Some(v) = value {
                        ensure_finite(field, v)?;
                    }
                }
                Ok(())
            }
        }
    }

    /// The `SET` clause contents, in a stable column order.
    pub fn assignments(&self) -> Vec<Assignment> {
        let mut set = Vec::new();
        match self {
            EntityUpdate::Producer(u) => {
                push_text(&mut set, "name", &u.name);
                push_text(&mut set, "tax_id", &u.tax_id);
                push_text(&mut set, "email", &u.email);
            }
            EntityUpdate::Area(u) => {
                push_text(&mut set, "name", &u.name);
                push_text(&mut set, "location", &u.location);
                push_real(&mut set, "size", u.size);
            }
            EntityUpdate::Crop(u) => {
                push_text(&mut set, "popular_name", &u.popular_name);
                push_text(&mut set, "scientific_name", &u.scientific_name);
                push_real(&mut set, "ph_min", u.ph_min);
                push_real(&mut set, "ph_max", u.ph_max);
                push_real(&mut set, "humidity_min", u.humidity_min);
                push_real(&mut set, "humidity_max", u.humidity_max);
            }
            EntityUpdate::Sensor(u) => {
                if let Some(date) = u.install_date {
                    set.push(("install_date", FieldValue::Date(date)));
                }
                if let Some(status) = u.status {
                    set.push(("status", FieldValue::Text(status.as_str().to_string())));
                }
            }
            EntityUpdate::Reading(u) => {
                if let Some(ts) = u.timestamp {
                    set.push(("timestamp", FieldValue::Timestamp(ts)));
                }
                push_real(&mut set, "value", u.value);
                push_real(&mut set, "secondary_value", u.secondary_value);
                push_real(&mut set, "tertiary_value", u.tertiary_value);
            }
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.assignments().is_empty()
    }
}

fn push_text(set: &mut Vec<Assignment>, column: &'static str, value: &Option<String>) {
    if let Some(text) = value {
        set.push((column, FieldValue::Text(text.trim().to_string())));
    }
}

fn push_real(set: &mut Vec<Assignment>, column: &'static str, value: Option<f64>) {
    if let Some(number) = value {
        set.push((column, FieldValue::Real(number)));
    }
}

// ==============================================================================
// Shared checks
// ==============================================================================

fn require_text(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::invalid(field, "a value is required"));
    }
    Ok(())
}

fn optional_text(field: &str, value: &Option<String>) -> Result<(), CoreError> {
    match value {
        Some(text) => require_text(field, text),
        None => Ok(()),
    }
}

fn check_email(email: &str) -> Result<(), CoreError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(CoreError::invalid("email", format!("'{}' is not an e-mail address", email))),
    }
}

fn check_size(size: Option<f64>) -> Result<(), CoreError> {
    if let Some(size) = size {
        ensure_finite("size", size)?;
        if size < 0.0 {
            return Err(CoreError::invalid("size", "cannot be negative"));
        }
    }
    Ok(())
}

fn check_ranges(
    ph_min: Option<f64>,
    ph_max: Option<f64>,
    humidity_min: Option<f64>,
    humidity_max: Option<f64>,
) -> Result<(), CoreError> {
    check_range("ph", ph_min, ph_max, 0.0, 14.0)?;
    check_range("humidity", humidity_min, humidity_max, 0.0, 100.0)
}

fn check_range(name: &str, min: Option<f64>, max: Option<f64>, floor: f64, ceil: f64) -> Result<(), CoreError> {
    for (suffix, bound) in [("min", min), ("max", max)] {
        if let Some(value) = bound {
            let field = format!("{}_{}", name, suffix);
            ensure_finite(&field, value)?;
            if value < floor || value > ceil {
                return Err(CoreError::invalid(&field, format!("must be between {} and {}", floor, ceil)));
            }
        }
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(CoreError::invalid(
                &format!("{}_min", name),
                format!("{} is greater than {}_max {}", min, name, max),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crop() -> Crop {
        Crop {
            id: 1,
            popular_name: "Soja".to_string(),
            scientific_name: None,
            ph_min: Some(6.0),
            ph_max: Some(7.0),
            humidity_min: Some(60.0),
            humidity_max: Some(70.0),
        }
    }

    #[test]
    fn empty_update_has_no_assignments() {
        assert!(EntityUpdate::Producer(ProducerUpdate::default()).is_empty());
        assert!(EntityUpdate::Reading(ReadingUpdate::default()).is_empty());
    }

    #[test]
    fn assignments_follow_supplied_fields_only() {
        let update = EntityUpdate::Area(AreaUpdate {
            name: None,
            location: Some(" Setor B ".to_string()),
            size: Some(12.5),
        });
        assert_eq!(
            update.assignments(),
            vec![
                ("location", FieldValue::Text("Setor B".to_string())),
                ("size", FieldValue::Real(12.5)),
            ]
        );
    }

    #[test]
    fn inverted_crop_range_is_rejected() {
        let crop = NewCrop {
            popular_name: "Milho".to_string(),
            ph_min: Some(7.5),
            ph_max: Some(6.0),
            ..Default::default()
        };
        assert!(crop.validate().is_err());
    }

    #[test]
    fn crop_update_is_checked_against_stored_bounds() {
        let lower_max = CropUpdate { ph_max: Some(5.5), ..Default::default() };
        assert!(lower_max.validate_against(&crop()).is_err());

        let widen = CropUpdate { ph_max: Some(7.5), ..Default::default() };
        assert!(widen.validate_against(&crop()).is_ok());
    }

    #[test]
    fn producer_requires_name_and_tax_id() {
        let producer = NewProducer {
            name: "Ana".to_string(),
            tax_id: " ".to_string(),
            email: None,
        };
        assert!(producer.validate().is_err());
    }

    #[test]
    fn malformed_email_is_rejected() {
        let producer = NewProducer {
            name: "Ana".to_string(),
            tax_id: "123".to_string(),
            email: Some("ana.example.com".to_string()),
        };
        assert!(producer.validate().is_err());
    }

    #[test]
    fn reading_values_must_be_finite() {
        let mut reading = NewReading::new(1, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(), 1.0);
        assert!(reading.validate().is_ok());
        reading.secondary_value = Some(f64::NAN);
        assert!(reading.validate().is_err());
    }
}
