use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use core_types::{NewArea, NewProducer, NewReading, NewSensor, SensorKind, SensorStatus};
use database::{FarmRepository, SqliteRepository};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use web_server::{app, AppState};

fn at(hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

struct Fixture {
    router: Router,
    producer_id: i64,
    area_id: i64,
    humidity_sensor: i64,
}

/// One producer with one area holding a humidity and a pH sensor. `humidity`
/// readings are hourly and rise by 2 per hour.
async fn fixture(humidity: u32) -> Fixture {
    let repo = SqliteRepository::in_memory().await.unwrap();
    let producer_id = repo
        .create_producer(&NewProducer {
            name: "Ana".to_string(),
            tax_id: "123.456.789-00".to_string(),
            email: None,
        })
        .await
        .unwrap();
    let area_id = repo
        .create_area(&NewArea {
            producer_id,
            name: "Fazenda da Ana".to_string(),
            location: "Setor A".to_string(),
            size: None,
        })
        .await
        .unwrap();
    let mut sensors = Vec::new();
    for kind in [SensorKind::Humidity, SensorKind::Ph] {
        let id = repo
            .create_sensor(&NewSensor {
                area_id,
                kind,
                install_date: None,
                status: SensorStatus::Active,
            })
            .await
            .unwrap();
        sensors.push(id);
    }
    for hour in 0..humidity {
        repo.create_reading(&NewReading::new(sensors[0], at(hour), 50.0 + 2.0 * hour as f64))
            .await
            .unwrap();
    }
    repo.create_reading(&NewReading::new(sensors[1], at(0), 6.4))
        .await
        .unwrap();

    let repo: Arc<dyn FarmRepository> = Arc::new(repo);
    Fixture {
        router: app(AppState::new(repo, Duration::hours(1))),
        producer_id,
        area_id,
        humidity_sensor: sensors[0],
    }
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn health_reports_the_backend() {
    let fx = fixture(0).await;
    let (status, body) = get(&fx.router, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "sqlite");
}

#[tokio::test]
async fn lists_producers_and_their_areas() {
    let fx = fixture(0).await;

    let (status, body) = get(&fx.router, "/api/producers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["tax_id"], "123.456.789-00");

    let uri = format!("/api/producers/{}/areas", fx.producer_id);
    let (status, body) = get(&fx.router, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Fazenda da Ana");
}

#[tokio::test]
async fn unknown_ids_are_404_with_a_json_error() {
    let fx = fixture(0).await;

    for uri in [
        "/api/producers/99/areas",
        "/api/areas/99",
        "/api/areas/99/summary",
        "/api/sensors/99/readings",
    ] {
        let (status, body) = get(&fx.router, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert!(body["error"].as_str().unwrap().contains("99"), "{}", uri);
    }
}

#[tokio::test]
async fn area_details_include_sensors() {
    let fx = fixture(0).await;
    let (status, body) = get(&fx.router, &format!("/api/areas/{}", fx.area_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["location"], "Setor A");
    let sensors = body["sensors"].as_array().unwrap();
    assert_eq!(sensors.len(), 2);
    assert_eq!(sensors[0]["type"], "humidity");
    assert_eq!(sensors[1]["type"], "ph");
}

#[tokio::test]
async fn summary_carries_latest_values_and_forecast() {
    let fx = fixture(3).await;
    let (status, body) = get(&fx.router, &format!("/api/areas/{}/summary", fx.area_id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reading_count"], 4);
    assert_eq!(body["latest_humidity"], 54.0);
    assert_eq!(body["latest_ph"], 6.4);
    assert_eq!(body["humidity"].as_array().unwrap().len(), 3);

    // 50, 52, 54 at 00:00..02:00; one hour later the line reaches 56.
    let predicted = body["forecast"]["value"].as_f64().unwrap();
    assert!((predicted - 56.0).abs() < 1e-6, "got {}", predicted);
    assert_eq!(body["forecast"]["at"], "2024-06-01T03:00:00");
}

#[tokio::test]
async fn summary_without_enough_humidity_has_no_forecast() {
    let fx = fixture(1).await;
    let (status, body) = get(&fx.router, &format!("/api/areas/{}/summary", fx.area_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["forecast"].is_null());
    assert_eq!(body["latest_humidity"], 50.0);
}

#[tokio::test]
async fn forecast_endpoint_honours_horizon_and_reports_missing_data() {
    let fx = fixture(3).await;

    let uri = format!("/api/areas/{}/forecast?horizon_secs=7200", fx.area_id);
    let (status, body) = get(&fx.router, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert!((body["value"].as_f64().unwrap() - 58.0).abs() < 1e-6);

    let uri = format!("/api/areas/{}/forecast?horizon_secs=0", fx.area_id);
    let (status, _) = get(&fx.router, &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let sparse = fixture(1).await;
    let uri = format!("/api/areas/{}/forecast", sparse.area_id);
    let (status, body) = get(&sparse.router, &uri).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn sensor_readings_are_in_time_order() {
    let fx = fixture(3).await;
    let uri = format!("/api/sensors/{}/readings", fx.humidity_sensor);
    let (status, body) = get(&fx.router, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let values: Vec<f64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["value"].as_f64().unwrap())
        .collect();
    assert_eq!(values, vec![50.0, 52.0, 54.0]);
    assert_eq!(body[0]["sensor_type"], "humidity");
}

#[tokio::test]
async fn crops_list_starts_empty() {
    let fx = fixture(0).await;
    let (status, body) = get(&fx.router, "/api/crops").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(vec![]));
}

#[tokio::test]
async fn oversized_horizons_are_rejected_with_json() {
    let fx = fixture(3).await;

    for secs in [i64::MAX.to_string(), "1000000000000000".to_string()] {
        let uri = format!("/api/areas/{}/forecast?horizon_secs={}", fx.area_id, secs);
        let (status, body) = get(&fx.router, &uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "horizon_secs={}", secs);
        assert!(body["error"].is_string(), "horizon_secs={}", secs);
    }
}

#[tokio::test]
async fn malformed_parameters_get_a_json_error() {
    let fx = fixture(0).await;

    for uri in [
        "/api/areas/abc".to_string(),
        "/api/producers/x/areas".to_string(),
        "/api/sensors/1.5/readings".to_string(),
        format!("/api/areas/{}/forecast?horizon_secs=soon", fx.area_id),
    ] {
        let (status, body) = get(&fx.router, &uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["error"].is_string(), "{}", uri);
    }
}
