//! Rating, note and account operations on top of an [`LmnStore`].
//!
//! Every mutating operation takes the caller's [`Identity`] explicitly.
//! Input is validated before any side effect. Image files are written before
//! the database transaction and removed again if it does not commit; files a
//! committed change made unreferenced are removed afterwards.

use std::sync::Arc;

use bytes::Bytes;

use crate::{
  Error, Result,
  badge::BadgePolicy,
  catalog::ShowDetail,
  credentials,
  error::Resource,
  input::{NoteForm, RatingForm, RegistrationForm},
  media::MediaRoot,
  note::{NewNote, Note, NoteImage, NotePatch, NoteReceipt, RatingOutcome},
  rating::{NewRating, ShowRating},
  store::{
    LmnStore, NoteDeletion, NoteInsert, NoteQuery, NoteUpdate, Page,
    RatingInsert, UserInsert,
  },
  user::{Identity, NewUser, User, UserProfile},
};

/// Shared handle to the store, the media root and the badge table.
///
/// Cloning is cheap.
pub struct Service<S> {
  store:  Arc<S>,
  media:  Arc<MediaRoot>,
  badges: Arc<BadgePolicy>,
}

impl<S> Clone for Service<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      media:  Arc::clone(&self.media),
      badges: Arc::clone(&self.badges),
    }
  }
}

impl<S: LmnStore> Service<S> {
  pub fn new(store: Arc<S>, media: MediaRoot, badges: BadgePolicy) -> Self {
    Self { store, media: Arc::new(media), badges: Arc::new(badges) }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn media(&self) -> &MediaRoot { &self.media }

  pub fn badges(&self) -> &BadgePolicy { &self.badges }

  // ── Accounts ──────────────────────────────────────────────────────────

  pub async fn register(&self, form: RegistrationForm) -> Result<User> {
    let valid = form.validate()?;
    let password_hash = credentials::hash_password(&valid.password)?;

    let outcome = self
      .store
      .create_user(NewUser {
        username: valid.username,
        email: valid.email,
        first_name: valid.first_name,
        last_name: valid.last_name,
        password_hash,
      })
      .await
      .map_err(Error::store)?;

    match outcome {
      UserInsert::Created(user) => {
        tracing::info!(user_id = user.user_id, username = %user.username, "registered user");
        Ok(user)
      }
      UserInsert::UsernameTaken => Err(Error::Integrity(
        "a user with that username already exists".to_owned(),
      )),
    }
  }

  /// Verify a username/password pair and return the caller's identity.
  pub async fn authenticate(&self, username: &str, password: &str) -> Result<Identity> {
    let creds = self
      .store
      .get_credentials(username)
      .await
      .map_err(Error::store)?
      .ok_or(Error::Unauthorized)?;

    if !credentials::verify_password(password, &creds.password_hash) {
      return Err(Error::Unauthorized);
    }
    Ok(Identity::from(&creds.user))
  }

  pub async fn user_profile(&self, user_id: i64, page: Page) -> Result<UserProfile> {
    let user = self
      .store
      .get_user(user_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(Resource::User, user_id))?;

    let notes = self
      .store
      .list_notes(&NoteQuery { user_id: Some(user_id), page, ..Default::default() })
      .await
      .map_err(Error::store)?;

    let badges = self.store.list_badges(user_id).await.map_err(Error::store)?;

    Ok(UserProfile { user, notes, badges })
  }

  // ── Shows ─────────────────────────────────────────────────────────────

  /// Show, its notes and rating summary. `already_rated` reflects only the
  /// given viewer.
  pub async fn show_detail(
    &self,
    show_id: i64,
    viewer: Option<&Identity>,
    page: Page,
  ) -> Result<ShowDetail> {
    let show = self
      .store
      .get_show(show_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(Resource::Show, show_id))?;

    let notes = self
      .store
      .list_notes(&NoteQuery { show_id: Some(show_id), page, ..Default::default() })
      .await
      .map_err(Error::store)?;

    let ratings = self.store.rating_summary(show_id).await.map_err(Error::store)?;

    let viewer_rating = match viewer {
      Some(id) => self
        .store
        .get_rating(id.user_id, show_id)
        .await
        .map_err(Error::store)?,
      None => None,
    };

    Ok(ShowDetail {
      show,
      notes,
      ratings,
      already_rated: viewer_rating.is_some(),
      viewer_rating,
    })
  }

  // ── Ratings ───────────────────────────────────────────────────────────

  /// Rate a show once. A second rating by the same user is a conflict and
  /// leaves the first untouched.
  pub async fn submit_rating(
    &self,
    identity: &Identity,
    show_id: i64,
    form: &RatingForm,
  ) -> Result<ShowRating> {
    self.require_show(show_id).await?;
    let rating = form.validate()?;

    let outcome = self
      .store
      .insert_rating(NewRating { user_id: identity.user_id, show_id, rating })
      .await
      .map_err(Error::store)?;

    match outcome {
      RatingInsert::Created(r) => {
        tracing::info!(
          user_id = identity.user_id,
          show_id,
          rating = %r.rating_out_of_five,
          "rated show"
        );
        Ok(r)
      }
      RatingInsert::AlreadyRated(_) => Err(Error::Integrity(format!(
        "user {} has already rated show {show_id}",
        identity.user_id
      ))),
      RatingInsert::ShowNotFound => Err(Error::NotFound(Resource::Show, show_id)),
    }
  }

  // ── Notes ─────────────────────────────────────────────────────────────

  /// Create a note, optionally with an image and a rating. The note, rating
  /// and badge awards commit together.
  pub async fn create_note(
    &self,
    identity: &Identity,
    show_id: i64,
    form: NoteForm,
  ) -> Result<NoteReceipt> {
    self.require_show(show_id).await?;
    let valid = form.validate_new()?;
    if let Some(upload) = &valid.image {
      self.media.check(upload)?;
    }

    let image = match &valid.image {
      Some(upload) => Some(self.media.store(identity.user_id, upload).await?),
      None => None,
    };

    let input = NewNote {
      show_id,
      user_id: identity.user_id,
      title: valid.title,
      text: valid.text,
      posted_date: None,
      image: image.clone(),
      rating: valid.rating,
    };

    match self.store.record_note(input, &self.badges).await {
      Ok(NoteInsert::Recorded(receipt)) => {
        tracing::info!(
          user_id = identity.user_id,
          show_id,
          note_id = receipt.note.note_id,
          badges_awarded = receipt.badges_awarded.len(),
          "recorded note"
        );
        if let RatingOutcome::AlreadyRated { .. } = receipt.rating {
          tracing::debug!(
            user_id = identity.user_id,
            show_id,
            "rating with note skipped, show already rated"
          );
        }
        Ok(receipt)
      }
      Ok(NoteInsert::ShowNotFound) => {
        self.discard(image).await;
        Err(Error::NotFound(Resource::Show, show_id))
      }
      Err(e) => {
        self.discard(image).await;
        Err(Error::store(e))
      }
    }
  }

  /// Replace a note's title and text, and its image if a new one is given.
  pub async fn edit_note(
    &self,
    identity: &Identity,
    note_id: i64,
    form: NoteForm,
  ) -> Result<Note> {
    let existing = self.require_note(note_id).await?;
    if existing.user_id != identity.user_id {
      return Err(Error::Forbidden);
    }

    let valid = form.validate_edit()?;
    if let Some(upload) = &valid.image {
      self.media.check(upload)?;
    }

    let image = match &valid.image {
      Some(upload) => Some(self.media.store(identity.user_id, upload).await?),
      None => None,
    };

    let patch = NotePatch { title: valid.title, text: valid.text, image: image.clone() };

    match self.store.update_note(note_id, identity.user_id, patch).await {
      Ok(NoteUpdate::Updated { note, replaced_image }) => {
        self.discard(replaced_image).await;
        tracing::info!(user_id = identity.user_id, note_id, "edited note");
        Ok(note)
      }
      Ok(NoteUpdate::NotFound) => {
        self.discard(image).await;
        Err(Error::NotFound(Resource::Note, note_id))
      }
      Ok(NoteUpdate::NotOwner) => {
        self.discard(image).await;
        Err(Error::Forbidden)
      }
      Err(e) => {
        self.discard(image).await;
        Err(Error::store(e))
      }
    }
  }

  /// Delete a note and its image file.
  pub async fn delete_note(&self, identity: &Identity, note_id: i64) -> Result<()> {
    let outcome = self
      .store
      .delete_note(note_id, identity.user_id)
      .await
      .map_err(Error::store)?;

    match outcome {
      NoteDeletion::Deleted(note) => {
        self.discard(note.image).await;
        tracing::info!(user_id = identity.user_id, note_id, "deleted note");
        Ok(())
      }
      NoteDeletion::NotFound => Err(Error::NotFound(Resource::Note, note_id)),
      NoteDeletion::NotOwner => Err(Error::Forbidden),
    }
  }

  /// The stored image of a note, with its bytes.
  pub async fn note_image(&self, note_id: i64) -> Result<(NoteImage, Bytes)> {
    let image = self
      .require_note(note_id)
      .await?
      .image
      .ok_or(Error::NotFound(Resource::Image, note_id))?;

    match self.media.read(&image).await {
      Ok(bytes) => Ok((image, bytes)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        tracing::warn!(note_id, path = %image.path, "note references a missing image");
        Err(Error::NotFound(Resource::Image, note_id))
      }
      Err(e) => Err(Error::Media(e)),
    }
  }

  // ── Helpers ───────────────────────────────────────────────────────────

  async fn require_show(&self, show_id: i64) -> Result<()> {
    self
      .store
      .get_show(show_id)
      .await
      .map_err(Error::store)?
      .map(|_| ())
      .ok_or(Error::NotFound(Resource::Show, show_id))
  }

  async fn require_note(&self, note_id: i64) -> Result<Note> {
    self
      .store
      .get_note(note_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(Resource::Note, note_id))
  }

  async fn discard(&self, image: Option<NoteImage>) {
    if let Some(image) = image {
      self.media.remove_logged(&image).await;
    }
  }
}
