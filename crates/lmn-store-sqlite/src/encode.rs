//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with a fixed six-digit
//! fraction, so lexical order in SQL equals chronological order.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use lmn_core::{
  badge::{AwardedBadge, Badge},
  catalog::{Artist, ShowListing, Venue},
  note::{Note, NoteImage},
  rating::{Rating, ShowRating},
  user::User,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current time at the precision the database keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Rating ──────────────────────────────────────────────────────────────────

pub fn decode_rating(value: i64) -> Result<Rating> {
  u8::try_from(value)
    .ok()
    .and_then(|v| Rating::new(v).ok())
    .ok_or_else(|| Error::Corrupt {
      table:   "show_ratings",
      message: format!("rating_out_of_five = {value}"),
    })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawUser::from_row`].
pub const USER_COLUMNS: &str =
  "u.user_id, u.username, u.email, u.first_name, u.last_name, u.date_joined";

pub struct RawUser {
  pub user_id:     i64,
  pub username:    String,
  pub email:       String,
  pub first_name:  String,
  pub last_name:   String,
  pub date_joined: String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:     row.get(0)?,
      username:    row.get(1)?,
      email:       row.get(2)?,
      first_name:  row.get(3)?,
      last_name:   row.get(4)?,
      date_joined: row.get(5)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:     self.user_id,
      username:    self.username,
      email:       self.email,
      first_name:  self.first_name,
      last_name:   self.last_name,
      date_joined: decode_dt(&self.date_joined)?,
    })
  }
}

pub fn venue_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Venue> {
  Ok(Venue {
    venue_id: row.get(0)?,
    name:     row.get(1)?,
    city:     row.get(2)?,
    state:    row.get(3)?,
  })
}

pub fn artist_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Artist> {
  Ok(Artist { artist_id: row.get(0)?, name: row.get(1)? })
}

/// Column list and joins matching [`RawShow::from_row`].
pub const SHOW_SELECT: &str = "
  SELECT s.show_id, s.show_date,
         a.artist_id, a.name,
         v.venue_id, v.name, v.city, v.state
  FROM shows s
  JOIN artists a ON a.artist_id = s.artist_id
  JOIN venues  v ON v.venue_id  = s.venue_id";

pub struct RawShow {
  pub show_id:   i64,
  pub show_date: String,
  pub artist:    Artist,
  pub venue:     Venue,
}

impl RawShow {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      show_id:   row.get(0)?,
      show_date: row.get(1)?,
      artist:    Artist { artist_id: row.get(2)?, name: row.get(3)? },
      venue:     Venue {
        venue_id: row.get(4)?,
        name:     row.get(5)?,
        city:     row.get(6)?,
        state:    row.get(7)?,
      },
    })
  }

  pub fn into_listing(self) -> Result<ShowListing> {
    Ok(ShowListing {
      show_id:   self.show_id,
      show_date: decode_dt(&self.show_date)?,
      artist:    self.artist,
      venue:     self.venue,
    })
  }
}

/// Column list matching [`RawNote::from_row`].
pub const NOTE_COLUMNS: &str = "note_id, show_id, user_id, title, text, posted_date,
  image_path, image_name, image_hash, image_media_type";

pub struct RawNote {
  pub note_id:          i64,
  pub show_id:          i64,
  pub user_id:          i64,
  pub title:            String,
  pub text:             String,
  pub posted_date:      String,
  pub image_path:       Option<String>,
  pub image_name:       Option<String>,
  pub image_hash:       Option<String>,
  pub image_media_type: Option<String>,
}

impl RawNote {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      note_id:          row.get(0)?,
      show_id:          row.get(1)?,
      user_id:          row.get(2)?,
      title:            row.get(3)?,
      text:             row.get(4)?,
      posted_date:      row.get(5)?,
      image_path:       row.get(6)?,
      image_name:       row.get(7)?,
      image_hash:       row.get(8)?,
      image_media_type: row.get(9)?,
    })
  }

  pub fn into_note(self) -> Result<Note> {
    let image = match (
      self.image_path,
      self.image_name,
      self.image_hash,
      self.image_media_type,
    ) {
      (Some(path), Some(original_name), Some(content_hash), Some(media_type)) => {
        Some(NoteImage { path, original_name, content_hash, media_type })
      }
      (None, None, None, None) => None,
      _ => {
        return Err(Error::Corrupt {
          table:   "notes",
          message: format!("note {} has a partial image reference", self.note_id),
        });
      }
    };

    Ok(Note {
      note_id: self.note_id,
      show_id: self.show_id,
      user_id: self.user_id,
      title: self.title,
      text: self.text,
      posted_date: decode_dt(&self.posted_date)?,
      image,
    })
  }
}

/// Column list matching [`RawRating::from_row`].
pub const RATING_COLUMNS: &str =
  "rating_id, user_id, show_id, rating_out_of_five, posted_date";

pub struct RawRating {
  pub rating_id:          i64,
  pub user_id:            i64,
  pub show_id:            i64,
  pub rating_out_of_five: i64,
  pub posted_date:        String,
}

impl RawRating {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      rating_id:          row.get(0)?,
      user_id:            row.get(1)?,
      show_id:            row.get(2)?,
      rating_out_of_five: row.get(3)?,
      posted_date:        row.get(4)?,
    })
  }

  pub fn into_rating(self) -> Result<ShowRating> {
    Ok(ShowRating {
      rating_id:          self.rating_id,
      user_id:            self.user_id,
      show_id:            self.show_id,
      rating_out_of_five: decode_rating(self.rating_out_of_five)?,
      posted_date:        decode_dt(&self.posted_date)?,
    })
  }
}

pub fn badge_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Badge> {
  Ok(Badge {
    badge_id:       row.get(0)?,
    slug:           row.get(1)?,
    name:           row.get(2)?,
    description:    row.get(3)?,
    notes_required: row.get::<_, i64>(4)?.max(0) as u64,
  })
}

pub struct RawAward {
  pub badge:      Badge,
  pub awarded_at: String,
}

impl RawAward {
  /// Expects the badge columns followed by `awarded_at`.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { badge: badge_from_row(row)?, awarded_at: row.get(5)? })
  }

  pub fn into_awarded(self) -> Result<AwardedBadge> {
    Ok(AwardedBadge { badge: self.badge, awarded_at: decode_dt(&self.awarded_at)? })
  }
}
