//! Handlers for `/notes` endpoints, and the multipart note form shared with
//! `POST /shows/{id}/notes`.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/notes` | Latest notes; `limit`, `offset` |
//! | `GET`    | `/notes/{id}` | 404 if not found |
//! | `POST`   | `/notes/{id}` | Owner only; multipart `title`, `text`, `image` |
//! | `DELETE` | `/notes/{id}` | Owner only; 204 |
//! | `GET`    | `/notes/{id}/image` | Honours `If-None-Match` |

use axum::{
  Json,
  body::Body,
  extract::{FromRequest, Multipart, Request, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use lmn_core::{
  Error,
  error::Resource,
  input::{ImageUpload, NoteForm},
  media::IMAGE_FIELD,
  note::Note,
  rating::RATING_FIELD,
  store::{LmnStore, NoteQuery},
};

use crate::{
  AppState,
  auth::Authenticated,
  error::ApiError,
  etag::{if_none_match, image_etag},
  extract::{Path, Query},
  params::PageParams,
};

/// A multipart note submission. Unknown parts are ignored; an empty file part
/// (a form submitted without choosing a file) counts as no image.
pub struct NoteUpload(pub NoteForm);

impl<S: Send + Sync> FromRequest<S> for NoteUpload {
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let multipart = Multipart::from_request(req, state).await?;
    Ok(Self(read_note_form(multipart).await?))
  }
}

async fn read_note_form(mut multipart: Multipart) -> Result<NoteForm, ApiError> {
  let mut form = NoteForm::default();

  while let Some(field) = multipart.next_field().await? {
    let Some(name) = field.name().map(str::to_owned) else {
      continue;
    };
    match name.as_str() {
      "title" => form.title = Some(field.text().await?),
      "text" => form.text = Some(field.text().await?),
      RATING_FIELD => form.rating_out_of_five = Some(field.text().await?),
      IMAGE_FIELD => {
        let file_name = field.file_name().unwrap_or("image").to_owned();
        let bytes = field.bytes().await?;
        if !bytes.is_empty() {
          form.image = Some(ImageUpload { file_name, bytes });
        }
      }
      other => tracing::debug!(field = other, "ignoring unknown form field"),
    }
  }
  Ok(form)
}

/// `GET /notes`
pub async fn list<S: LmnStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<PageParams>,
) -> Result<Json<Vec<Note>>, ApiError> {
  let notes = state
    .service
    .store()
    .list_notes(&NoteQuery { page: params.page(), ..Default::default() })
    .await
    .map_err(Error::store)?;
  Ok(Json(notes))
}

/// `GET /notes/{id}`
pub async fn get_one<S: LmnStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Note>, ApiError> {
  let note = state
    .service
    .store()
    .get_note(id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound(Resource::Note, id))?;
  Ok(Json(note))
}

/// `POST /notes/{id}`
pub async fn edit<S: LmnStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  Authenticated(identity): Authenticated,
  NoteUpload(form): NoteUpload,
) -> Result<Json<Note>, ApiError> {
  let note = state.service.edit_note(&identity, id, form).await?;
  Ok(Json(note))
}

/// `DELETE /notes/{id}`
pub async fn delete_one<S: LmnStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  Authenticated(identity): Authenticated,
) -> Result<StatusCode, ApiError> {
  state.service.delete_note(&identity, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /notes/{id}/image`
pub async fn image<S: LmnStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  headers: HeaderMap,
) -> Result<Response, ApiError> {
  let (image, bytes) = state.service.note_image(id).await?;
  let etag = image_etag(&image);

  if if_none_match(&headers, &etag) {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
  }

  Ok(
    (
      [
        (header::CONTENT_TYPE, image.media_type),
        (header::ETAG, etag),
        (
          header::CONTENT_DISPOSITION,
          format!("inline; filename=\"{}\"", image.original_name),
        ),
      ],
      Body::from(bytes),
    )
      .into_response(),
  )
}
