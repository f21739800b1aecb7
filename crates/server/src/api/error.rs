//! Mapping from core errors to HTTP responses.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use streamrelay_core::{DebridError, SearchError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error half of every fallible handler.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn search_error(err: SearchError) -> ApiError {
    let status = match &err {
        SearchError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        SearchError::AllIndexersFailed { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, err.to_string())
}

pub fn debrid_error(err: DebridError) -> ApiError {
    let status = match &err {
        DebridError::InvalidHash | DebridError::NotSupported(_) => StatusCode::BAD_REQUEST,
        DebridError::NotConfigured(_) => StatusCode::NOT_FOUND,
        DebridError::InvalidState(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_GATEWAY,
    };
    api_error(status, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_error_status() {
        let (status, _) = search_error(SearchError::InvalidQuery("empty".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, Json(body)) = search_error(SearchError::AllIndexersFailed {
            detail: "no active indexers".into(),
            errors: Vec::new(),
        });
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.error.contains("no active indexers"));
    }

    #[test]
    fn test_debrid_error_status() {
        assert_eq!(debrid_error(DebridError::InvalidHash).0, StatusCode::BAD_REQUEST);
        assert_eq!(
            debrid_error(DebridError::NotConfigured("x".into())).0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(debrid_error(DebridError::Unauthorized).0, StatusCode::BAD_GATEWAY);
        assert_eq!(debrid_error(DebridError::Timeout).0, StatusCode::BAD_GATEWAY);
        assert_eq!(
            debrid_error(DebridError::HttpError {
                code: 503,
                message: "down".into()
            })
            .0,
            StatusCode::BAD_GATEWAY
        );
    }
}
