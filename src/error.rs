use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::ErrorResponse;

/// Failure of a lookup against the search capability.
///
/// Every variant is recoverable: the widget reports it as "search
/// unavailable" and the next keystroke retries.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("search service responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode search response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("search timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("widget {0} is not mounted")]
    WidgetNotFound(Uuid),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::WidgetNotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(ErrorResponse::with_details("Widget not found", self.to_string()))
    }
}
