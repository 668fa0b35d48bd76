//! HTTP Basic-auth extractors.
//!
//! [`Authenticated`] requires valid credentials. [`Viewer`] accepts anonymous
//! requests but still rejects credentials that are present and wrong.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use lmn_core::{store::LmnStore, user::Identity};

use crate::{AppState, error::ApiError};

/// The verified caller of a request.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

/// The caller, if the request carried credentials.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<Identity>);

/// Decode `Authorization: Basic ...` into `(username, password)`.
///
/// `Ok(None)` when the header is absent; any malformed value is an error.
pub fn basic_credentials(headers: &HeaderMap) -> Result<Option<(String, String)>, ApiError> {
  let Some(value) = headers.get(header::AUTHORIZATION) else {
    return Ok(None);
  };
  let value = value.to_str().map_err(|_| ApiError::Unauthorized)?;
  let encoded = value.strip_prefix("Basic ").ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded.trim()).map_err(|_| ApiError::Unauthorized)?;
  let creds = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;
  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  Ok(Some((username.to_owned(), password.to_owned())))
}

async fn identify<S: LmnStore>(
  parts: &Parts,
  state: &AppState<S>,
) -> Result<Option<Identity>, ApiError> {
  let Some((username, password)) = basic_credentials(&parts.headers)? else {
    return Ok(None);
  };
  match state.service.authenticate(&username, &password).await {
    Ok(identity) => Ok(Some(identity)),
    Err(lmn_core::Error::Unauthorized) => {
      tracing::debug!(%username, "rejected credentials");
      Err(ApiError::Unauthorized)
    }
    Err(e) => Err(e.into()),
  }
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: LmnStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    identify(parts, state)
      .await?
      .map(Authenticated)
      .ok_or(ApiError::Unauthorized)
  }
}

impl<S> FromRequestParts<AppState<S>> for Viewer
where
  S: LmnStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    Ok(Viewer(identify(parts, state).await?))
  }
}
