use crate::{error::AppError, extract::Id, AppState};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::NaiveDateTime;
use core_types::{Area, Crop, Producer, Reading, Sensor, SensorKind};
use forecast::{Forecast, ForecastError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct SeriesPoint {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl From<&Reading> for SeriesPoint {
    fn from(reading: &Reading) -> Self {
        Self {
            timestamp: reading.timestamp,
            value: reading.value,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AreaDetails {
    #[serde(flatten)]
    pub area: Area,
    pub sensors: Vec<Sensor>,
}

/// Everything the dashboard shows for one area.
#[derive(Debug, Serialize)]
pub struct AreaSummary {
    pub area: Area,
    pub reading_count: usize,
    pub latest_humidity: Option<f64>,
    pub latest_ph: Option<f64>,
    pub humidity: Vec<SeriesPoint>,
    pub ph: Vec<SeriesPoint>,
    /// `None` while the area has fewer than two distinct humidity timestamps.
    pub forecast: Option<Forecast>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub horizon_secs: Option<i64>,
}

/// # GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    state.repo.ping().await?;
    Ok(Json(json!({
        "status": "ok",
        "backend": state.repo.backend().as_str(),
    })))
}

/// # GET /api/producers
pub async fn list_producers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Producer>>, AppError> {
    Ok(Json(state.repo.list_producers().await?))
}

/// # GET /api/producers/:id/areas
pub async fn producer_areas(
    Id(producer_id): Id,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Area>>, AppError> {
    // 404 for an unknown producer rather than an empty list.
    state.repo.get_producer(producer_id).await?;
    Ok(Json(state.repo.list_areas(Some(producer_id)).await?))
}

/// # GET /api/areas/:id
pub async fn area_details(
    Id(area_id): Id,
    State(state): State<Arc<AppState>>,
) -> Result<Json<AreaDetails>, AppError> {
    let area = state.repo.get_area(area_id).await?;
    let sensors = state.repo.list_sensors(Some(area_id)).await?;
    Ok(Json(AreaDetails { area, sensors }))
}

/// # GET /api/areas/:id/summary
/// Latest humidity and pH, both series, and the humidity forecast when one can be made.
pub async fn area_summary(
    Id(area_id): Id,
    State(state): State<Arc<AppState>>,
) -> Result<Json<AreaSummary>, AppError> {
    let area = state.repo.get_area(area_id).await?;
    let readings = state.repo.list_area_readings(area_id, None).await?;

    let series = |kind: SensorKind| -> Vec<&Reading> {
        readings.iter().filter(|r| r.sensor_type == kind).collect()
    };
    let humidity = series(SensorKind::Humidity);
    let ph = series(SensorKind::Ph);

    let points: Vec<_> = humidity.iter().map(|r| r.point()).collect();
    let forecast = match forecast::next_step(&points, state.horizon) {
        Ok(forecast) => Some(forecast),
        Err(ForecastError::InsufficientData { .. } | ForecastError::DegenerateInput) => None,
        Err(err) => return Err(err.into()),
    };

    Ok(Json(AreaSummary {
        reading_count: readings.len(),
        latest_humidity: humidity.last().map(|r| r.value),
        latest_ph: ph.last().map(|r| r.value),
        humidity: humidity.iter().copied().map(SeriesPoint::from).collect(),
        ph: ph.iter().copied().map(SeriesPoint::from).collect(),
        forecast,
        area,
    }))
}

/// # GET /api/areas/:id/forecast?horizon_secs=
/// Humidity forecast only. Unlike the summary, too little data is an error here.
pub async fn area_forecast(
    Id(area_id): Id,
    query: Result<Query<ForecastQuery>, QueryRejection>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Forecast>, AppError> {
    let Query(query) = query.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let horizon = match query.horizon_secs {
        Some(secs) => forecast::horizon_from_secs(secs)?,
        None => state.horizon,
    };

    state.repo.get_area(area_id).await?;
    let points: Vec<_> = state
        .repo
        .list_area_readings(area_id, Some(SensorKind::Humidity))
        .await?
        .iter()
        .map(Reading::point)
        .collect();

    Ok(Json(forecast::next_step(&points, horizon)?))
}

/// # GET /api/crops
pub async fn list_crops(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Crop>>, AppError> {
    Ok(Json(state.repo.list_crops().await?))
}

/// # GET /api/sensors/:id/readings
pub async fn sensor_readings(
    Id(sensor_id): Id,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Reading>>, AppError> {
    state.repo.get_sensor(sensor_id).await?;
    Ok(Json(state.repo.list_readings(Some(sensor_id)).await?))
}
