//! Handlers for `/shows` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/shows/{id}` | Optional auth; `already_rated` is for the caller |
//! | `POST` | `/shows/{id}/notes` | Multipart `title`, `text`, `image`, `rating_out_of_five` |
//! | `POST` | `/shows/{id}/rating` | Body: `{"rating_out_of_five": 4}` |

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use lmn_core::{catalog::ShowDetail, input::RatingForm, store::LmnStore};

use crate::{
  AppState,
  auth::{Authenticated, Viewer},
  error::ApiError,
  extract::{Path, Query},
  notes::NoteUpload,
  params::PageParams,
};

/// `GET /shows/{id}`
pub async fn get_one<S: LmnStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  Viewer(viewer): Viewer,
  Query(params): Query<PageParams>,
) -> Result<Json<ShowDetail>, ApiError> {
  let detail = state
    .service
    .show_detail(id, viewer.as_ref(), params.page())
    .await?;
  Ok(Json(detail))
}

/// `POST /shows/{id}/notes`
pub async fn create_note<S: LmnStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  Authenticated(identity): Authenticated,
  NoteUpload(form): NoteUpload,
) -> Result<impl IntoResponse, ApiError> {
  let receipt = state.service.create_note(&identity, id, form).await?;
  Ok((StatusCode::CREATED, Json(receipt)))
}

/// `POST /shows/{id}/rating`
pub async fn rate<S: LmnStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  Authenticated(identity): Authenticated,
  body: Result<Json<RatingForm>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(form) = body?;
  let rating = state.service.submit_rating(&identity, id, &form).await?;
  Ok((StatusCode::CREATED, Json(rating)))
}
