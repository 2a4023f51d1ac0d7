//! Runs against a real MySQL server. Point `FARMTECH__DATABASE__HOST`, `__PORT`,
//! `__USER`, `__PASSWORD` and `__NAME` at a scratch database, then:
//!
//! ```text
//! cargo test -p database --test mysql_repository -- --ignored
//! ```

use chrono::{Local, NaiveDate};
use configuration::Backend;
use core_types::{
    AreaUpdate, EntityKind, EntityUpdate, NewArea, NewProducer, NewReading, NewSensor, SensorKind,
    SensorStatus, UpdateOutcome,
};
use database::{DbError, FarmRepository};

#[tokio::test]
#[ignore = "needs a MySQL server configured through FARMTECH__DATABASE__*"]
async fn mysql_round_trip_matches_sqlite_semantics() {
    let mut config = configuration::load_config(None).unwrap();
    config.database.backend = Backend::MySql;
    let repo = database::create_repository(&config.database).await.unwrap();
    assert_eq!(repo.backend(), Backend::MySql);
    repo.ping().await.unwrap();

    let tax_id = format!("test-{}", Local::now().timestamp_micros());
    let producer_id = repo
        .create_producer(&NewProducer {
            name: "Ana".to_string(),
            tax_id: tax_id.clone(),
            email: None,
        })
        .await
        .unwrap();
    let area_id = repo
        .create_area(&NewArea {
            producer_id,
            name: "Talhão 1".to_string(),
            location: "Setor A".to_string(),
            size: Some(12.5),
        })
        .await
        .unwrap();
    let sensor_id = repo
        .create_sensor(&NewSensor {
            area_id,
            kind: SensorKind::Ph,
            install_date: NaiveDate::from_ymd_opt(2024, 1, 15),
            status: SensorStatus::Active,
        })
        .await
        .unwrap();
    let at = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(6, 0, 0).unwrap();
    let reading_id = repo
        .create_reading(&NewReading::new(sensor_id, at, 6.4))
        .await
        .unwrap();
    assert_eq!(repo.get_reading(reading_id).await.unwrap().sensor_type, SensorKind::Ph);

    let same = EntityUpdate::Area(AreaUpdate {
        location: Some("Setor A".to_string()),
        ..Default::default()
    });
    assert_eq!(repo.update(area_id, &same).await.unwrap(), UpdateOutcome::Unchanged);
    let moved = EntityUpdate::Area(AreaUpdate {
        location: Some("Setor B".to_string()),
        ..Default::default()
    });
    assert_eq!(repo.update(area_id, &moved).await.unwrap(), UpdateOutcome::Updated);

    assert!(matches!(
        repo.create_producer(&NewProducer {
            name: "Outra".to_string(),
            tax_id,
            email: None,
        })
        .await,
        Err(DbError::Integrity { .. })
    ));

    assert_eq!(repo.delete(EntityKind::Producer, producer_id).await.unwrap(), 1);
    assert!(matches!(
        repo.get_reading(reading_id).await,
        Err(DbError::NotFound { .. })
    ));
}
