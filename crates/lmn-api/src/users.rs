//! Handlers for accounts, profiles and the badge table.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use lmn_core::{
  Error,
  badge::BadgeRule,
  error::Resource,
  input::RegistrationForm,
  store::LmnStore,
  user::{User, UserProfile},
};

use crate::{
  AppState,
  auth::Authenticated,
  error::ApiError,
  extract::{Path, Query},
  params::PageParams,
};

/// `POST /register`
pub async fn register<S: LmnStore>(
  State(state): State<AppState<S>>,
  body: Result<Json<RegistrationForm>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(form) = body?;
  let user = state.service.register(form).await?;
  Ok((StatusCode::CREATED, Json(user)))
}

/// `POST /login`: verifies Basic credentials and returns the account.
pub async fn login<S: LmnStore>(
  State(state): State<AppState<S>>,
  Authenticated(identity): Authenticated,
) -> Result<Json<User>, ApiError> {
  let user = state
    .service
    .store()
    .get_user(identity.user_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound(Resource::User, identity.user_id))?;
  Ok(Json(user))
}

/// `GET /users/{id}`
pub async fn profile<S: LmnStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  Query(params): Query<PageParams>,
) -> Result<Json<UserProfile>, ApiError> {
  let profile = state.service.user_profile(id, params.page()).await?;
  Ok(Json(profile))
}

/// `GET /badges`
pub async fn badges<S: LmnStore>(
  State(state): State<AppState<S>>,
) -> Json<Vec<BadgeRule>> {
  Json(state.service.badges().rules().to_vec())
}
