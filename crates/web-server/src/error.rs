use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use database::DbError;
use forecast::ForecastError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),
    #[error("Forecast error: {0}")]
    Forecast(#[from] ForecastError),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(DbError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Database(DbError::Validation(_))
            | AppError::Forecast(ForecastError::HorizonOutOfRange { .. })
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(DbError::Integrity { .. }) => StatusCode::CONFLICT,
            AppError::Forecast(ForecastError::InsufficientData { .. })
            | AppError::Forecast(ForecastError::DegenerateInput) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Database(_) | AppError::Forecast(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error = ?self, "Request failed.");
                "An internal server error occurred".to_string()
            }
            AppError::Database(err) => err.to_string(),
            AppError::Forecast(err) => err.to_string(),
            AppError::BadRequest(message) => message.clone(),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
