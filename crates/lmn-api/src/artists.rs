//! Handlers for `/artists` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/artists` | Optional `?search_name=`, `limit`, `offset` |
//! | `GET`  | `/artists/{id}` | 404 if not found |
//! | `GET`  | `/artists/{id}/shows` | The artist's shows with their venues |

use axum::{Json, extract::State};
use lmn_core::{
  Error,
  catalog::{Artist, ShowListing},
  error::Resource,
  store::{LmnStore, ShowQuery},
};

use crate::{
  AppState,
  error::ApiError,
  extract::{Path, Query},
  params::{NameParams, PageParams},
};

/// `GET /artists[?search_name=<text>]`
pub async fn list<S: LmnStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<NameParams>,
) -> Result<Json<Vec<Artist>>, ApiError> {
  let artists = state
    .service
    .store()
    .list_artists(&params.into_query())
    .await
    .map_err(Error::store)?;
  Ok(Json(artists))
}

/// `GET /artists/{id}`
pub async fn get_one<S: LmnStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Artist>, ApiError> {
  Ok(Json(find(&state, id).await?))
}

/// `GET /artists/{id}/shows`
pub async fn shows<S: LmnStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  Query(params): Query<PageParams>,
) -> Result<Json<Vec<ShowListing>>, ApiError> {
  find(&state, id).await?;
  let shows = state
    .service
    .store()
    .list_shows(&ShowQuery { artist_id: Some(id), venue_id: None, page: params.page() })
    .await
    .map_err(Error::store)?;
  Ok(Json(shows))
}

async fn find<S: LmnStore>(state: &AppState<S>, id: i64) -> Result<Artist, ApiError> {
  let artist = state
    .service
    .store()
    .get_artist(id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound(Resource::Artist, id))?;
  Ok(artist)
}
