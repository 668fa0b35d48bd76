//! JSON REST API for LMN.
//!
//! Exposes an axum [`Router`] backed by any [`lmn_core::store::LmnStore`].
//! Mutating endpoints require HTTP Basic credentials of a registered user.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = lmn_api::api_router(AppState::new(service));
//! ```

pub mod artists;
pub mod auth;
pub mod error;
pub mod etag;
pub mod extract;
pub mod notes;
pub mod params;
pub mod shows;
pub mod users;
pub mod venues;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use lmn_core::{service::Service, store::LmnStore};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Room for the text fields and multipart framing around an image upload.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub service: Service<S>,
}

impl<S> AppState<S> {
  pub fn new(service: Service<S>) -> Self { Self { service } }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self { Self { service: self.service.clone() } }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: LmnStore + 'static,
{
  let body_limit = state.service.media().max_bytes() + FORM_OVERHEAD_BYTES;

  Router::new()
    // Accounts
    .route("/register", post(users::register::<S>))
    .route("/login", post(users::login::<S>))
    .route("/users/{id}", get(users::profile::<S>))
    .route("/badges", get(users::badges::<S>))
    // Catalog
    .route("/artists", get(artists::list::<S>))
    .route("/artists/{id}", get(artists::get_one::<S>))
    .route("/artists/{id}/shows", get(artists::shows::<S>))
    .route("/venues", get(venues::list::<S>))
    .route("/venues/{id}", get(venues::get_one::<S>))
    .route("/venues/{id}/shows", get(venues::shows::<S>))
    // Shows
    .route("/shows/{id}", get(shows::get_one::<S>))
    .route("/shows/{id}/notes", post(shows::create_note::<S>))
    .route("/shows/{id}/rating", post(shows::rate::<S>))
    // Notes
    .route("/notes", get(notes::list::<S>))
    .route(
      "/notes/{id}",
      get(notes::get_one::<S>)
        .post(notes::edit::<S>)
        .delete(notes::delete_one::<S>),
    )
    .route("/notes/{id}/image", get(notes::image::<S>))
    .layer(DefaultBodyLimit::max(body_limit))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
