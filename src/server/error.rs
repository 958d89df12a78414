// HTTP error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::{SourcesError, TmdbError};
use crate::stream::negotiator::NegotiationError;
use crate::watchlist::WatchlistError;

/// Result type for HTTP handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// API error with HTTP status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Error response JSON structure
#[derive(Debug, Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
    status: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = Json(ErrorResponse {
            error: self.message,
            status: status.as_u16(),
        });

        (status, body).into_response()
    }
}

impl From<TmdbError> for ApiError {
    fn from(err: TmdbError) -> Self {
        match err {
            TmdbError::NotFound => ApiError::not_found("Title not found"),
            TmdbError::RateLimited => {
                tracing::warn!("TMDB rate limit exhausted");
                ApiError::service_unavailable(err.to_string())
            }
            other => {
                tracing::error!("TMDB error: {}", other);
                ApiError::bad_gateway("Metadata service error")
            }
        }
    }
}

impl From<SourcesError> for ApiError {
    fn from(err: SourcesError) -> Self {
        match err {
            SourcesError::NoValidSources => ApiError::not_found(err.to_string()),
            SourcesError::MissingEpisode => ApiError::bad_request(err.to_string()),
            SourcesError::NotConfigured => ApiError::service_unavailable(err.to_string()),
            other => {
                tracing::error!("Error fetching video sources: {}", other);
                ApiError::bad_gateway(other.to_string())
            }
        }
    }
}

impl From<NegotiationError> for ApiError {
    fn from(err: NegotiationError) -> Self {
        match err {
            NegotiationError::UnknownProvider(_) => ApiError::bad_request(err.to_string()),
            NegotiationError::NoProviders | NegotiationError::NoFiles(_) => {
                ApiError::not_found(err.to_string())
            }
        }
    }
}

impl From<WatchlistError> for ApiError {
    fn from(err: WatchlistError) -> Self {
        tracing::error!("Watchlist error: {}", err);
        ApiError::internal("Failed to update watchlist")
    }
}
