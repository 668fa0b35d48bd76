//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body is `{"error": "..."}`; validation failures add a
//! `fields` array of `{"field", "message"}` objects.

use axum::{
  Json,
  extract::{
    multipart::{MultipartError, MultipartRejection},
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use lmn_core::error::ValidationErrors;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("validation failed: {0}")]
  Validation(ValidationErrors),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("forbidden")]
  Forbidden,

  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("payload too large")]
  PayloadTooLarge,

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<lmn_core::Error> for ApiError {
  fn from(e: lmn_core::Error) -> Self {
    use lmn_core::Error as E;
    match e {
      E::Validation(fields) => Self::Validation(fields),
      E::Integrity(msg) => Self::Conflict(msg),
      E::Forbidden => Self::Forbidden,
      E::Unauthorized => Self::Unauthorized,
      E::NotFound(resource, id) => Self::NotFound(format!("{resource} {id} not found")),
      E::Media(e) => Self::Internal(Box::new(e)),
      E::Store(e) => Self::Internal(e),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(e: JsonRejection) -> Self { Self::BadRequest(e.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(e: PathRejection) -> Self { Self::BadRequest(e.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(e: QueryRejection) -> Self { Self::BadRequest(e.body_text()) }
}

impl From<MultipartRejection> for ApiError {
  fn from(e: MultipartRejection) -> Self { Self::BadRequest(e.body_text()) }
}

impl From<MultipartError> for ApiError {
  fn from(e: MultipartError) -> Self {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
      Self::PayloadTooLarge
    } else {
      Self::BadRequest(e.body_text())
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::Validation(fields) => (
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({ "error": "validation failed", "fields": fields }),
      ),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, json!({ "error": m })),
      ApiError::Forbidden => (StatusCode::FORBIDDEN, json!({ "error": "forbidden" })),
      ApiError::Unauthorized => {
        (StatusCode::UNAUTHORIZED, json!({ "error": "unauthorized" }))
      }
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::PayloadTooLarge => (
        StatusCode::PAYLOAD_TOO_LARGE,
        json!({ "error": "request body too large" }),
      ),
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          json!({ "error": "internal server error" }),
        )
      }
    };

    let mut res = (status, Json(body)).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"lmn\""),
      );
    }
    res
  }
}
