use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Not enough data to fit a trend: need at least {required} readings, got {actual}.")]
    InsufficientData { required: usize, actual: usize },

    #[error("All readings share the same timestamp; no trend can be fitted.")]
    DegenerateInput,

    #[error("Horizon of {secs} seconds is not a positive, representable offset from the newest reading.")]
    HorizonOutOfRange { secs: i64 },

    #[error("Regression failed: {0}")]
    Model(String),
}
