//! Notes: user-authored reviews of a show.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  badge::Badge,
  rating::{Rating, ShowRating},
};

pub const TITLE_MAX_CHARS: usize = 200;
pub const TEXT_MAX_CHARS: usize = 1000;

/// An image attached to a note. Only the reference lives in the database; the
/// bytes are on disk below the media root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteImage {
  /// Storage key relative to the media root, e.g.
  /// `user_images/1/5f0c…-poster.jpg`.
  pub path:          String,
  /// Filename as uploaded; display only.
  pub original_name: String,
  /// SHA-256 hex digest of the stored bytes.
  pub content_hash:  String,
  pub media_type:    String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
  pub note_id:     i64,
  pub show_id:     i64,
  pub user_id:     i64,
  pub title:       String,
  pub text:        String,
  pub posted_date: DateTime<Utc>,
  pub image:       Option<NoteImage>,
}

/// Input to [`crate::store::LmnStore::record_note`].
#[derive(Debug, Clone)]
pub struct NewNote {
  pub show_id:     i64,
  pub user_id:     i64,
  pub title:       String,
  pub text:        String,
  /// `None` means now.
  pub posted_date: Option<DateTime<Utc>>,
  pub image:       Option<NoteImage>,
  /// Submitted together with the note; stored in the same transaction.
  pub rating:      Option<Rating>,
}

/// Replacement title/text for an existing note, and optionally a new image.
#[derive(Debug, Clone)]
pub struct NotePatch {
  pub title: String,
  pub text:  String,
  /// `None` keeps the current image.
  pub image: Option<NoteImage>,
}

/// What happened to the rating bundled with a note submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RatingOutcome {
  /// No (or a blank) rating was submitted.
  NotSubmitted,
  Saved { rating: ShowRating },
  /// The user had rated the show before; the earlier rating stands.
  AlreadyRated { rating: ShowRating },
}

/// Result of a successful note creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteReceipt {
  pub note:           Note,
  pub rating:         RatingOutcome,
  /// Badges first earned by this note.
  pub badges_awarded: Vec<Badge>,
}
