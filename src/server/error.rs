use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::service::ServiceError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = if self.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::BAD_REQUEST
        };
        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Body extraction failures keep axum's status but use the domain error shape.
pub(super) fn payload_rejection(rejection: JsonRejection) -> Response {
    let body = ErrorBody {
        error: "MalformedPayload",
        message: rejection.body_text(),
    };
    (rejection.status(), Json(body)).into_response()
}
