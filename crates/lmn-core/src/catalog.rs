//! Venues, artists and the shows that connect them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  note::Note,
  rating::{RatingSummary, ShowRating},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
  pub venue_id: i64,
  pub name:     String,
  pub city:     String,
  pub state:    String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
  pub artist_id: i64,
  pub name:      String,
}

/// A single performance by one artist at one venue, joined with both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowListing {
  pub show_id:   i64,
  /// Stored in UTC; inputs with any offset are normalised on the way in.
  pub show_date: DateTime<Utc>,
  pub artist:    Artist,
  pub venue:     Venue,
}

/// Read model for a show's page, scoped to the (optional) viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowDetail {
  pub show:          ShowListing,
  /// Most recent first.
  pub notes:         Vec<Note>,
  pub ratings:       RatingSummary,
  /// `true` only if the viewer has rated this show.
  pub already_rated: bool,
  pub viewer_rating: Option<ShowRating>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct NewVenue {
  pub name:  String,
  pub city:  String,
  pub state: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewArtist {
  pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewShow {
  pub show_date: DateTime<Utc>,
  pub artist_id: i64,
  pub venue_id:  i64,
}
