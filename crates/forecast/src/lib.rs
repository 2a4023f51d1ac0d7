//! # FarmTech Forecast
//!
//! One-step-ahead prediction for a sensor series. A straight line is fitted
//! through the `(timestamp, value)` readings with smartcore and evaluated a
//! fixed horizon past the newest reading.
//!
//! Pure calculation: nothing is stored between calls, and the crate knows
//! nothing about where the readings came from.

pub mod error;
pub mod trend;

pub use error::ForecastError;
pub use trend::{horizon_from_secs, next_step, Forecast, LinearTrend, DEFAULT_HORIZON_SECS, MIN_POINTS};
