//! Error types for `lmn-core`.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field:   &'static str,
  pub message: String,
}

impl FieldError {
  pub fn new(field: &'static str, message: impl Into<String>) -> Self {
    Self { field, message: message.into() }
  }
}

impl fmt::Display for FieldError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.field, self.message)
  }
}

/// Every field-level problem found while validating one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
  pub fn push(&mut self, error: FieldError) { self.0.push(error); }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn fields(&self) -> &[FieldError] { &self.0 }

  pub fn has(&self, field: &str) -> bool {
    self.0.iter().any(|e| e.field == field)
  }

  /// `Ok(value)` if nothing was pushed, otherwise `Err(self)`.
  pub fn into_result<T>(self, value: T) -> Result<T, Self> {
    if self.0.is_empty() { Ok(value) } else { Err(self) }
  }
}

impl From<FieldError> for ValidationErrors {
  fn from(e: FieldError) -> Self { Self(vec![e]) }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for e in &self.0 {
      if !first {
        f.write_str("; ")?;
      }
      write!(f, "{e}")?;
      first = false;
    }
    Ok(())
  }
}

impl std::error::Error for ValidationErrors {}

/// The kind of record a [`Error::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
  User,
  Artist,
  Venue,
  Show,
  Note,
  Image,
}

impl fmt::Display for Resource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::User => "user",
      Self::Artist => "artist",
      Self::Venue => "venue",
      Self::Show => "show",
      Self::Note => "note",
      Self::Image => "image",
    })
  }
}

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed or out-of-range input, rejected before any write.
  #[error("validation failed: {0}")]
  Validation(#[from] ValidationErrors),

  /// A storage constraint refused the write (duplicate rating, taken
  /// username).
  #[error("conflict: {0}")]
  Integrity(String),

  #[error("forbidden")]
  Forbidden,

  #[error("unauthorized")]
  Unauthorized,

  #[error("{0} {1} not found")]
  NotFound(Resource, i64),

  #[error("media error: {0}")]
  Media(#[from] std::io::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error into [`Error::Store`].
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
