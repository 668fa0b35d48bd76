//! Password hashing and verification with argon2.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use rand_core::OsRng;

use crate::{Error, Result};

/// Hash `password` into an argon2 PHC string, e.g. `$argon2id$v=19$…`.
pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| Error::Store(format!("argon2 error: {e}").into()))
}

/// `true` if `password` matches `phc`. A malformed stored hash never matches.
pub fn verify_password(password: &str, phc: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}
