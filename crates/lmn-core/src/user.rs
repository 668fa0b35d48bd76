//! Users, their profiles, and the request-scoped identity of the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{badge::AwardedBadge, note::Note};

/// Public account details. Credentials live in [`Credentials`] and are never
/// serialised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:     i64,
  pub username:    String,
  pub email:       String,
  pub first_name:  String,
  pub last_name:   String,
  pub date_joined: DateTime<Utc>,
}

/// A user together with the argon2 PHC string used to verify their password.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub user:          User,
  pub password_hash: String,
}

/// The authenticated caller of a single request.
///
/// Produced by the transport layer after verifying credentials and passed
/// explicitly into every mutating operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub user_id:  i64,
  pub username: String,
}

impl From<&User> for Identity {
  fn from(u: &User) -> Self {
    Self { user_id: u.user_id, username: u.username.clone() }
  }
}

/// Input to [`crate::store::LmnStore::create_user`]. The password has already
/// been hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub email:         String,
  pub first_name:    String,
  pub last_name:     String,
  pub password_hash: String,
}

/// Read model for a user's profile page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
  pub user:   User,
  /// Most recent first.
  pub notes:  Vec<Note>,
  pub badges: Vec<AwardedBadge>,
}
