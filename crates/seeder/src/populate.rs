use crate::error::SeedError;
use crate::generator::{generate_readings, MockSensors};
use chrono::NaiveDateTime;
use core_types::{
    EntityKind, NewArea, NewCrop, NewProducer, NewReading, NewSensor, SensorKind, SensorStatus,
};
use database::FarmRepository;

/// Tax id that marks the demo producer. Re-seeding replaces whatever tree hangs off it.
pub const DEMO_TAX_ID: &str = "000.000.000-00";

const DEMO_AREAS: [(&str, &str, f64); 2] = [
    ("Fazenda Teste Mockada", "Setor A", 12.5),
    ("Horta do Quintal", "Jardim", 0.8),
];

/// Sensors installed in every demo area, in order.
const DEMO_SENSOR_KINDS: [SensorKind; 4] = [
    SensorKind::Humidity,
    SensorKind::Ph,
    SensorKind::Temperature,
    SensorKind::Humidity,
];

/// What a `populate` run wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub replaced_previous: bool,
    pub producer_id: i64,
    pub areas: usize,
    pub crops_created: usize,
    pub sensors: usize,
    pub readings: u64,
}

fn demo_crops() -> [NewCrop; 2] {
    [
        NewCrop {
            popular_name: "Soja".to_string(),
            scientific_name: Some("Glycine max".to_string()),
            ph_min: Some(6.2),
            ph_max: Some(6.8),
            humidity_min: Some(60.0),
            humidity_max: Some(70.0),
        },
        NewCrop {
            popular_name: "Alface".to_string(),
            scientific_name: Some("Lactuca sativa".to_string()),
            ph_min: Some(5.8),
            ph_max: Some(6.5),
            humidity_min: Some(50.0),
            humidity_max: Some(60.0),
        },
    ]
}

/// Loads the demo data set.
///
/// Any earlier demo producer is deleted first, and the storage cascade takes its
/// areas, sensors and readings with it. Crops are shared reference data and are
/// only created when no crop with the same popular name exists. The first area gets
/// humidity, pH and temperature series; the second only humidity and pH.
pub async fn populate(
    repo: &dyn FarmRepository,
    readings_per_series: usize,
    anchor: NaiveDateTime,
) -> Result<SeedSummary, SeedError> {
    if readings_per_series == 0 {
        return Err(SeedError::EmptySeries);
    }
    let mut summary = SeedSummary::default();

    for old in repo.list_producers().await? {
        if old.tax_id == DEMO_TAX_ID {
            tracing::info!(producer_id = old.id, "Removing previous demo data.");
            repo.delete(EntityKind::Producer, old.id).await?;
            summary.replaced_previous = true;
        }
    }

    summary.producer_id = repo
        .create_producer(&NewProducer {
            name: "Produtor Demonstração".to_string(),
            tax_id: DEMO_TAX_ID.to_string(),
            email: Some("demo@farmtech.local".to_string()),
        })
        .await?;

    let existing: Vec<String> = repo
        .list_crops()
        .await?
        .into_iter()
        .map(|crop| crop.popular_name.to_lowercase())
        .collect();
    for crop in demo_crops() {
        if existing.contains(&crop.popular_name.to_lowercase()) {
            tracing::debug!(crop = %crop.popular_name, "Crop already present; skipping.");
            continue;
        }
        repo.create_crop(&crop).await?;
        summary.crops_created += 1;
    }

    for (index, (name, location, size)) in DEMO_AREAS.iter().enumerate() {
        let area_id = repo
            .create_area(&NewArea {
                producer_id: summary.producer_id,
                name: name.to_string(),
                location: location.to_string(),
                size: Some(*size),
            })
            .await?;
        summary.areas += 1;

        let mut sensor_ids = Vec::with_capacity(DEMO_SENSOR_KINDS.len());
        for kind in DEMO_SENSOR_KINDS {
            let id = repo
                .create_sensor(&NewSensor {
                    area_id,
                    kind,
                    install_date: Some(anchor.date()),
                    status: SensorStatus::Active,
                })
                .await?;
            sensor_ids.push(id);
        }
        summary.sensors += sensor_ids.len();

        let sensors = MockSensors {
            humidity: sensor_ids[0],
            ph: sensor_ids[1],
            temperature: (index == 0).then_some(sensor_ids[2]),
        };
        let batch: Vec<NewReading> = generate_readings(sensors, readings_per_series, anchor)
            .iter()
            .map(NewReading::from)
            .collect();
        let written = repo.create_readings(&batch).await?;
        tracing::info!(area_id, readings = written, "Demo area seeded.");
        summary.readings += written;
    }

    Ok(summary)
}
