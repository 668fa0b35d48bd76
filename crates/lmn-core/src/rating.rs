//! Show ratings: one 1–5 score per user per show.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FieldError;

pub const RATING_FIELD: &str = "rating_out_of_five";

/// An integer score in `1..=5`. Construction is the only validation point.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
  pub const MIN: u8 = 1;
  pub const MAX: u8 = 5;

  pub fn new(value: u8) -> Result<Self, FieldError> {
    if (Self::MIN..=Self::MAX).contains(&value) {
      Ok(Self(value))
    } else {
      Err(FieldError::new(
        RATING_FIELD,
        format!("must be between {} and {}", Self::MIN, Self::MAX),
      ))
    }
  }

  pub fn get(self) -> u8 { self.0 }

  /// Parse an optional form value. Blank or missing input is `Ok(None)`;
  /// anything else must be a valid rating.
  pub fn parse_optional(raw: Option<&str>) -> Result<Option<Self>, FieldError> {
    match raw.map(str::trim) {
      None | Some("") => Ok(None),
      Some(s) => s.parse().map(Some),
    }
  }
}

impl FromStr for Rating {
  type Err = FieldError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    if s.is_empty() {
      return Err(FieldError::new(RATING_FIELD, "this field is required"));
    }
    // Parse wide so "300" reports out-of-range rather than not-a-number.
    let value: i64 = s
      .parse()
      .map_err(|_| FieldError::new(RATING_FIELD, "enter a whole number"))?;
    u8::try_from(value)
      .map_err(|_| {
        FieldError::new(
          RATING_FIELD,
          format!("must be between {} and {}", Self::MIN, Self::MAX),
        )
      })
      .and_then(Self::new)
  }
}

impl TryFrom<u8> for Rating {
  type Error = FieldError;

  fn try_from(value: u8) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Rating> for u8 {
  fn from(r: Rating) -> Self { r.0 }
}

impl fmt::Display for Rating {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowRating {
  pub rating_id:          i64,
  pub user_id:            i64,
  pub show_id:            i64,
  pub rating_out_of_five: Rating,
  pub posted_date:        DateTime<Utc>,
}

/// Input to [`crate::store::LmnStore::insert_rating`].
#[derive(Debug, Clone, Copy)]
pub struct NewRating {
  pub user_id: i64,
  pub show_id: i64,
  pub rating:  Rating,
}

/// Aggregate over all ratings for one show.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
  pub count:   u64,
  /// `None` when the show has no ratings.
  pub average: Option<f64>,
}
