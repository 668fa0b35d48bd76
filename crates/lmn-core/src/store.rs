//! The `LmnStore` trait, its query types, and the explicit outcomes of
//! constraint-checked writes.
//!
//! The trait is implemented by storage backends (e.g. `lmn-store-sqlite`).
//! Uniqueness and ownership are enforced inside the backend's transactions
//! and reported through the outcome enums below, never by check-then-insert
//! in the caller.

use std::future::Future;

use crate::{
  badge::{AwardedBadge, BadgePolicy},
  catalog::{Artist, NewArtist, NewShow, NewVenue, ShowListing, Venue},
  note::{NewNote, Note, NoteImage, NotePatch, NoteReceipt},
  rating::{NewRating, RatingSummary, ShowRating},
  user::{Credentials, NewUser, User},
};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

// ─── Query types ─────────────────────────────────────────────────────────────

/// `limit`/`offset` pagination with the limit clamped to [`MAX_PAGE_SIZE`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

impl Page {
  pub fn limit(&self) -> usize {
    self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
  }

  pub fn offset(&self) -> usize { self.offset.unwrap_or(0) }
}

/// Parameters for [`LmnStore::list_artists`] and [`LmnStore::list_venues`].
#[derive(Debug, Clone, Default)]
pub struct NameQuery {
  /// Case-insensitive substring filter on the name.
  pub search_name: Option<String>,
  pub page:        Page,
}

/// Parameters for [`LmnStore::list_shows`]. Results are most recent first.
#[derive(Debug, Clone, Default)]
pub struct ShowQuery {
  pub artist_id: Option<i64>,
  pub venue_id:  Option<i64>,
  pub page:      Page,
}

/// Parameters for [`LmnStore::list_notes`]. Results are ordered by posted
/// date, most recent first, ties broken by ascending note id.
#[derive(Debug, Clone, Default)]
pub struct NoteQuery {
  pub show_id: Option<i64>,
  pub user_id: Option<i64>,
  pub page:    Page,
}

// ─── Write outcomes ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum UserInsert {
  Created(User),
  UsernameTaken,
}

#[derive(Debug, Clone)]
pub enum RatingInsert {
  Created(ShowRating),
  /// The `(user, show)` pair was already rated; carries the existing row.
  AlreadyRated(ShowRating),
  ShowNotFound,
}

#[derive(Debug, Clone)]
pub enum NoteInsert {
  Recorded(NoteReceipt),
  ShowNotFound,
}

#[derive(Debug, Clone)]
pub enum NoteUpdate {
  Updated {
    note:           Note,
    /// The image the patch displaced, whose file is now unreferenced.
    replaced_image: Option<NoteImage>,
  },
  NotFound,
  NotOwner,
}

#[derive(Debug, Clone)]
pub enum NoteDeletion {
  /// The deleted row, including its image reference.
  Deleted(Note),
  NotFound,
  NotOwner,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an LMN storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait LmnStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create a user and their profile in one transaction.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<UserInsert, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up a user and password hash by exact username.
  fn get_credentials<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + 'a;

  // ── Catalog ───────────────────────────────────────────────────────────

  fn add_venue(
    &self,
    input: NewVenue,
  ) -> impl Future<Output = Result<Venue, Self::Error>> + Send + '_;

  fn add_artist(
    &self,
    input: NewArtist,
  ) -> impl Future<Output = Result<Artist, Self::Error>> + Send + '_;

  /// Returns `None` if the referenced artist or venue does not exist.
  fn add_show(
    &self,
    input: NewShow,
  ) -> impl Future<Output = Result<Option<ShowListing>, Self::Error>> + Send + '_;

  fn get_venue(
    &self,
    venue_id: i64,
  ) -> impl Future<Output = Result<Option<Venue>, Self::Error>> + Send + '_;

  /// Venues in case-insensitive alphabetical order.
  fn list_venues<'a>(
    &'a self,
    query: &'a NameQuery,
  ) -> impl Future<Output = Result<Vec<Venue>, Self::Error>> + Send + 'a;

  fn get_artist(
    &self,
    artist_id: i64,
  ) -> impl Future<Output = Result<Option<Artist>, Self::Error>> + Send + '_;

  /// Artists in case-insensitive alphabetical order.
  fn list_artists<'a>(
    &'a self,
    query: &'a NameQuery,
  ) -> impl Future<Output = Result<Vec<Artist>, Self::Error>> + Send + 'a;

  fn get_show(
    &self,
    show_id: i64,
  ) -> impl Future<Output = Result<Option<ShowListing>, Self::Error>> + Send + '_;

  fn list_shows<'a>(
    &'a self,
    query: &'a ShowQuery,
  ) -> impl Future<Output = Result<Vec<ShowListing>, Self::Error>> + Send + 'a;

  // ── Notes ─────────────────────────────────────────────────────────────

  /// Insert a note, its optional rating, and any badges the author's new
  /// note count earns under `badges`, all in one transaction.
  fn record_note<'a>(
    &'a self,
    input: NewNote,
    badges: &'a BadgePolicy,
  ) -> impl Future<Output = Result<NoteInsert, Self::Error>> + Send + 'a;

  fn get_note(
    &self,
    note_id: i64,
  ) -> impl Future<Output = Result<Option<Note>, Self::Error>> + Send + '_;

  fn list_notes<'a>(
    &'a self,
    query: &'a NoteQuery,
  ) -> impl Future<Output = Result<Vec<Note>, Self::Error>> + Send + 'a;

  fn count_notes(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Apply `patch` if `owner` wrote the note.
  fn update_note(
    &self,
    note_id: i64,
    owner: i64,
    patch: NotePatch,
  ) -> impl Future<Output = Result<NoteUpdate, Self::Error>> + Send + '_;

  /// Delete the note if `owner` wrote it.
  fn delete_note(
    &self,
    note_id: i64,
    owner: i64,
  ) -> impl Future<Output = Result<NoteDeletion, Self::Error>> + Send + '_;

  // ── Ratings ───────────────────────────────────────────────────────────

  fn insert_rating(
    &self,
    input: NewRating,
  ) -> impl Future<Output = Result<RatingInsert, Self::Error>> + Send + '_;

  fn get_rating(
    &self,
    user_id: i64,
    show_id: i64,
  ) -> impl Future<Output = Result<Option<ShowRating>, Self::Error>> + Send + '_;

  fn list_ratings(
    &self,
    show_id: i64,
  ) -> impl Future<Output = Result<Vec<ShowRating>, Self::Error>> + Send + '_;

  fn rating_summary(
    &self,
    show_id: i64,
  ) -> impl Future<Output = Result<RatingSummary, Self::Error>> + Send + '_;

  // ── Badges ────────────────────────────────────────────────────────────

  /// Badges held by the user's profile, oldest award first.
  fn list_badges(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<Vec<AwardedBadge>, Self::Error>> + Send + '_;
}
