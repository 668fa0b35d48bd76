//! Error type for `lmn-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value the domain types refuse, e.g. a rating outside
  /// 1..=5 written by another tool.
  #[error("corrupt row in {table}: {message}")]
  Corrupt {
    table:   &'static str,
    message: String,
  },
}

impl From<rusqlite::Error> for Error {
  fn from(e: rusqlite::Error) -> Self { Self::Database(e.into()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
