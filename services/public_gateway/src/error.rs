//! Single `IntoResponse` translation point: every handler error funnels
//! through here so "mask any other error as INTERNAL_ERROR, never leak
//! internal detail" (spec §7) is enforced in one place, not per-handler.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use livermore_types::error::{DomainError, ErrorCode};
use livermore_types::envelope::ApiError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("cache error: {0}")]
    Cache(#[from] livermore_cache::CacheError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            GatewayError::Domain(e) => (status_for(e.code()), e.code(), e.to_string()),
            GatewayError::Cache(e) => {
                error!(error = %e, "public gateway: cache error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InternalError,
                    "internal error".to_string(),
                )
            }
            GatewayError::Internal(e) => {
                error!(error = %e, "public gateway: internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InternalError,
                    "internal error".to_string(),
                )
            }
        };
        (status, Json(ApiError::new(code.as_str(), message))).into_response()
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_error_maps_to_expected_status() {
        let e = GatewayError::Domain(DomainError::InvalidSymbol("???".to_string()));
        match &e {
            GatewayError::Domain(d) => assert_eq!(d.code().as_str(), "BAD_REQUEST"),
            _ => unreachable!(),
        }
    }
}
