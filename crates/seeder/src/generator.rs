use chrono::{Duration, NaiveDateTime, Timelike};
use core_types::{NewReading, SensorKind};

/// Two readings per hour over a day.
pub const DEFAULT_READINGS: usize = 48;

/// The span the generated history covers, ending at the anchor.
pub const DEFAULT_WINDOW: Duration = Duration::hours(24);

/// The sensors one generated series writes to. Without a temperature sensor
/// only humidity and pH readings are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockSensors {
    pub humidity: i64,
    pub ph: i64,
    pub temperature: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockReading {
    pub sensor_id: i64,
    pub kind: SensorKind,
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl From<&MockReading> for NewReading {
    fn from(mock: &MockReading) -> Self {
        NewReading::new(mock.sensor_id, mock.timestamp, mock.value)
    }
}

/// `count` slots spread over the last 24 hours up to `anchor`.
pub fn generate_readings(sensors: MockSensors, count: usize, anchor: NaiveDateTime) -> Vec<MockReading> {
    generate_readings_over(sensors, count, anchor, DEFAULT_WINDOW)
}

/// `count` evenly spaced slots ending exactly at `anchor` (to the second).
///
/// Slot `i` sits `(count - 1 - i) * window / count` before the anchor and yields
/// one reading per sensor, all sharing the slot timestamp. The output depends
/// only on the arguments.
pub fn generate_readings_over(
    sensors: MockSensors,
    count: usize,
    anchor: NaiveDateTime,
    window: Duration,
) -> Vec<MockReading> {
    let anchor = anchor.with_nanosecond(0).unwrap_or(anchor);
    let per_slot = if sensors.temperature.is_some() { 3 } else { 2 };
    let mut readings = Vec::with_capacity(count * per_slot);

    for i in 0..count {
        let back = (count - 1 - i) as i64 * window.num_seconds() / count as i64;
        let timestamp = anchor - Duration::seconds(back);
        let progress = i as f64 / count as f64;

        let humidity = 50.0 + (i % 10) as f64 * 1.5 + (i % 5) as f64 * 0.5 + progress * 10.0;
        let ph = 6.0 + (i % 7) as f64 * 0.1 + progress * 0.5;
        let temperature = 20.0 + (i % 8) as f64 * 0.3 + progress * 5.0;

        readings.push(MockReading {
            sensor_id: sensors.humidity,
            kind: SensorKind::Humidity,
            timestamp,
            value: round2(humidity),
        });
        readings.push(MockReading {
            sensor_id: sensors.ph,
            kind: SensorKind::Ph,
            timestamp,
            value: round2(ph),
        });
        if let Some(sensor_id) = sensors.temperature {
            readings.push(MockReading {
                sensor_id,
                kind: SensorKind::Temperature,
                timestamp,
                value: round2(temperature),
            });
        }
    }
    readings
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SENSORS: MockSensors = MockSensors {
        humidity: 1,
        ph: 2,
        temperature: Some(3),
    };

    fn anchor() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_milli_opt(12, 0, 0, 750)
            .unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn output_is_deterministic() {
        let a = generate_readings(SENSORS, DEFAULT_READINGS, anchor());
        let b = generate_readings(SENSORS, DEFAULT_READINGS, anchor());
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_READINGS * 3);
    }

    #[test]
    fn slots_end_at_the_anchor_and_span_the_window() {
        let readings = generate_readings(SENSORS, DEFAULT_READINGS, anchor());
        let whole_second = anchor().with_nanosecond(0).unwrap();

        let last = readings.last().unwrap();
        assert_eq!(last.timestamp, whole_second);
        assert_eq!(readings[0].timestamp, whole_second - Duration::minutes(30 * 47));

        // Triplets share their slot timestamp.
        for slot in readings.chunks(3) {
            assert!(slot.iter().all(|r| r.timestamp == slot[0].timestamp));
            let kinds: Vec<_> = slot.iter().map(|r| r.kind).collect();
            assert_eq!(kinds, vec![SensorKind::Humidity, SensorKind::Ph, SensorKind::Temperature]);
        }
    }

    #[test]
    fn values_follow_the_slot_formulas() {
        let readings = generate_readings(SENSORS, DEFAULT_READINGS, anchor());

        assert!(approx(readings[0].value, 50.0));
        assert!(approx(readings[1].value, 6.0));
        assert!(approx(readings[2].value, 20.0));

        // Slot 47 of 48.
        let last = &readings[47 * 3..];
        assert!(approx(last[0].value, 71.29));
        assert!(approx(last[1].value, 6.99));
        assert!(approx(last[2].value, 27.0));
    }

    #[test]
    fn temperature_is_optional() {
        let sensors = MockSensors {
            temperature: None,
            ..SENSORS
        };
        let readings = generate_readings(sensors, 10, anchor());
        assert_eq!(readings.len(), 20);
        assert!(readings.iter().all(|r| r.kind != SensorKind::Temperature));
    }

    #[test]
    fn custom_window_changes_spacing_only() {
        let hourly = generate_readings_over(SENSORS, 4, anchor(), Duration::hours(4));
        let spacing = hourly[3].timestamp - hourly[0].timestamp;
        assert_eq!(spacing, Duration::hours(1));

        let daily = generate_readings(SENSORS, 4, anchor());
        let values = |r: &[MockReading]| r.iter().map(|m| m.value).collect::<Vec<_>>();
        assert_eq!(values(&hourly), values(&daily));
    }

    #[test]
    fn zero_count_produces_nothing() {
        assert!(generate_readings(SENSORS, 0, anchor()).is_empty());
    }

    #[test]
    fn converts_into_repository_input() {
        let readings = generate_readings(SENSORS, 1, anchor());
        let input = NewReading::from(&readings[2]);
        assert_eq!(input.sensor_id, 3);
        assert_eq!(input.value, readings[2].value);
        assert_eq!(input.secondary_value, None);
    }
}
