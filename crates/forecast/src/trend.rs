use crate::error::ForecastError;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{LinearRegression, LinearRegressionParameters};

/// The smallest series a line can be fitted through.
pub const MIN_POINTS: usize = 2;

/// One hour, the step the dashboard forecasts by default.
pub const DEFAULT_HORIZON_SECS: i64 = 3600;

/// A straight line `value = intercept + slope * hours_since(origin)` fitted to a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearTrend {
    pub origin: NaiveDateTime,
    pub intercept: f64,
    pub slope_per_hour: f64,
    pub samples: usize,
}

/// A single predicted value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Forecast {
    pub at: NaiveDateTime,
    pub value: f64,
    pub slope_per_hour: f64,
    pub samples: usize,
}

impl LinearTrend {
    /// Fits a least-squares line through `points`. Order does not matter.
    pub fn fit(points: &[(NaiveDateTime, f64)]) -> Result<Self, ForecastError> {
        if points.len() < MIN_POINTS {
            return Err(ForecastError::InsufficientData {
                required: MIN_POINTS,
                actual: points.len(),
            });
        }

        let origin = points
            .iter()
            .map(|(ts, _)| *ts)
            .min()
            .ok_or(ForecastError::DegenerateInput)?;
        if points.iter().all(|(ts, _)| *ts == origin) {
            return Err(ForecastError::DegenerateInput);
        }

        let rows: Vec<Vec<f64>> = points
            .iter()
            .map(|(ts, _)| vec![hours_between(origin, *ts)])
            .collect();
        let targets: Vec<f64> = points.iter().map(|(_, value)| *value).collect();

        let x = DenseMatrix::from_2d_vec(&rows)
            .map_err(|e| ForecastError::Model(format!("Failed to create DenseMatrix: {}", e)))?;
        let model = LinearRegression::fit(&x, &targets, LinearRegressionParameters::default())
            .map_err(|e| ForecastError::Model(e.to_string()))?;

        // Read the line back by evaluating it at 0h and 1h past the origin.
        let grid = DenseMatrix::from_2d_vec(&vec![vec![0.0], vec![1.0]])
            .map_err(|e| ForecastError::Model(format!("Failed to create DenseMatrix: {}", e)))?;
        let fitted = model
            .predict(&grid)
            .map_err(|e| ForecastError::Model(e.to_string()))?;
        let (intercept, at_one_hour) = match fitted.as_slice() {
            [a, b] => (*a, *b),
            _ => return Err(ForecastError::Model("unexpected prediction shape".to_string())),
        };

        let trend = Self {
            origin,
            intercept,
            slope_per_hour: at_one_hour - intercept,
            samples: points.len(),
        };
        if !trend.intercept.is_finite() || !trend.slope_per_hour.is_finite() {
            return Err(ForecastError::Model("the fitted line is not finite".to_string()));
        }

        tracing::debug!(
            samples = trend.samples,
            slope_per_hour = trend.slope_per_hour,
            "Fitted linear trend."
        );
        Ok(trend)
    }

    /// The fitted value at `at`. Works before, inside and after the fitted range.
    pub fn predict(&self, at: NaiveDateTime) -> f64 {
        self.intercept + self.slope_per_hour * hours_between(self.origin, at)
    }
}

/// Turns a horizon given in seconds into a `Duration`, rejecting zero, negative
/// and out-of-range values.
pub fn horizon_from_secs(secs: i64) -> Result<Duration, ForecastError> {
    Duration::try_seconds(secs)
        .filter(|horizon| *horizon > Duration::zero())
        .ok_or(ForecastError::HorizonOutOfRange { secs })
}

/// Fits `points` and predicts `horizon` after the newest one.
pub fn next_step(
    points: &[(NaiveDateTime, f64)],
    horizon: Duration,
) -> Result<Forecast, ForecastError> {
    let trend = LinearTrend::fit(points)?;
    let last = points
        .iter()
        .map(|(ts, _)| *ts)
        .max()
        .unwrap_or(trend.origin);
    let at = last
        .checked_add_signed(horizon)
        .ok_or(ForecastError::HorizonOutOfRange {
            secs: horizon.num_seconds(),
        })?;
    Ok(Forecast {
        at,
        value: trend.predict(at),
        slope_per_hour: trend.slope_per_hour,
        samples: trend.samples,
    })
}

fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_seconds() as f64 / 3600.0
}
