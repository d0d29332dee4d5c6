//! Error type for HTTP handlers.
//!
//! Page routes answer errors with a small HTML page. The load-more endpoint
//! answers with JSON instead (see [`SiteError::into_json_response`]) because
//! its caller is a script, not a person.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;

use crate::content::ContentError;
use crate::render;

#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// Missing or invalid request parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The content API failed or answered with an error status.
    #[error("content API error: {0}")]
    Content(#[from] ContentError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error body: `{"error": "...", "retryable": true}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub retryable: bool,
}

impl SiteError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Content(ContentError::ForeignCursor(_) | ContentError::InvalidUrl(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Content(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn log(&self) {
        match self {
            Self::Content(err) => tracing::warn!(error = %err, "content API error"),
            Self::Internal(err) => tracing::error!(error = %err, "internal server error"),
            _ => {}
        }
    }

    /// Render as a JSON body with the same status code.
    pub fn into_json_response(self) -> Response {
        self.log();
        let status = self.status();
        let body = ErrorBody {
            retryable: status == StatusCode::BAD_GATEWAY,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for SiteError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status();
        let message = match &self {
            Self::BadRequest(msg) => format!("The request could not be understood: {msg}"),
            Self::NotFound(msg) => format!("Nothing here: {msg}"),
            Self::Content(_) => {
                "The content service is unavailable. Please try again later.".to_string()
            }
            Self::Internal(_) => "An internal error occurred. Please try again later.".to_string(),
        };
        (
            status,
            Html(render::render_error(status.as_u16(), &message).into_string()),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            SiteError::BadRequest("token".into()).to_string(),
            "bad request: token"
        );
        assert_eq!(
            SiteError::NotFound("post x".into()).to_string(),
            "not found: post x"
        );
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            SiteError::BadRequest("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SiteError::NotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            SiteError::Internal(anyhow::anyhow!("boom"))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn page_errors_are_html() {
        let response = SiteError::NotFound("/post/x".into()).into_response();
        let content_type = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.starts_with("text/html"));
    }

    #[test]
    fn upstream_failure_is_bad_gateway() {
        let err = SiteError::from(ContentError::Status {
            status: 503,
            url: "https://x.cdn.prismic.io/api/v2".into(),
        });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn foreign_cursor_is_bad_request() {
        let err = SiteError::from(ContentError::ForeignCursor("https://evil.example".into()));
        assert_eq!(
            err.into_json_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
