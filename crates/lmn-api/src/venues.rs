//! Handlers for `/venues` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/venues` | Optional `?search_name=`, `limit`, `offset` |
//! | `GET`  | `/venues/{id}` | 404 if not found |
//! | `GET`  | `/venues/{id}/shows` | Shows at the venue with their artists |

use axum::{Json, extract::State};
use lmn_core::{
  Error,
  catalog::{ShowListing, Venue},
  error::Resource,
  store::{LmnStore, ShowQuery},
};

use crate::{
  AppState,
  error::ApiError,
  extract::{Path, Query},
  params::{NameParams, PageParams},
};

pub async fn list<S: LmnStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<NameParams>,
) -> Result<Json<Vec<Venue>>, ApiError> {
  let venues = state
    .service
    .store()
    .list_venues(&params.into_query())
    .await
    .map_err(Error::store)?;
  Ok(Json(venues))
}

pub async fn get_one<S: LmnStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Venue>, ApiError> {
  Ok(Json(find(&state, id).await?))
}

pub async fn shows<S: LmnStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  Query(params): Query<PageParams>,
) -> Result<Json<Vec<ShowListing>>, ApiError> {
  find(&state, id).await?;
  let shows = state
    .service
    .store()
    .list_shows(&ShowQuery { artist_id: None, venue_id: Some(id), page: params.page() })
    .await
    .map_err(Error::store)?;
  Ok(Json(shows))
}

async fn find<S: LmnStore>(state: &AppState<S>, id: i64) -> Result<Venue, ApiError> {
  let venue = state
    .service
    .store()
    .get_venue(id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound(Resource::Venue, id))?;
  Ok(venue)
}
