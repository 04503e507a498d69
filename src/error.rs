use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Failures of a single CEP lookup. Each variant maps to one HTTP status at the
/// boundary of the service that produced it.
#[derive(Debug, Error)]
pub enum CepError {
    /// The body could not be parsed as `{"cep": "<string>"}`.
    #[error("invalid request")]
    InvalidRequest(#[source] serde_json::Error),

    /// The code is not exactly eight ASCII digits.
    #[error("invalid zipcode")]
    InvalidFormat,

    #[error("can not find zipcode")]
    LocationNotFound,

    #[error("failed to get temperature{}", status_suffix(.status))]
    WeatherLookupFailed { status: Option<u16>, reason: String },

    #[error("failed to reach resolver service")]
    DownstreamUnreachable(#[source] reqwest::Error),
}

impl CepError {
    pub fn weather_failed(status: Option<u16>, reason: impl Into<String>) -> Self {
        Self::WeatherLookupFailed {
            status,
            reason: reason.into(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|status| format!(" - status {status}"))
        .unwrap_or_default()
}

impl ResponseError for CepError {
    fn status_code(&self) -> StatusCode {
        match self {
            CepError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CepError::InvalidFormat => StatusCode::UNPROCESSABLE_ENTITY,
            CepError::LocationNotFound => StatusCode::NOT_FOUND,
            CepError::WeatherLookupFailed { .. } | CepError::DownstreamUnreachable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
