//! Typed submission inputs and their validation.
//!
//! Each operation accepts a raw form struct, exactly as the transport layer
//! received it, and validates it into a `Valid*` value before any side effect.
//! Validation collects every field problem rather than stopping at the first.

use bytes::Bytes;
use serde::{Deserialize, Deserializer};

use crate::{
  error::{FieldError, ValidationErrors},
  note::{TEXT_MAX_CHARS, TITLE_MAX_CHARS},
  rating::Rating,
};

// ─── Shared helpers ──────────────────────────────────────────────────────────

/// Accept a JSON string, number, or null for a form field and keep it as raw
/// text so the typed parser can report a precise error.
pub fn lenient_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Raw {
    Text(String),
    Number(serde_json::Number),
  }

  Ok(Option::<Raw>::deserialize(d)?.map(|raw| match raw {
    Raw::Text(s) => s,
    Raw::Number(n) => n.to_string(),
  }))
}

fn required(
  errors: &mut ValidationErrors,
  field: &'static str,
  value: Option<&str>,
  max_chars: usize,
) -> String {
  let value = value.map(str::trim).unwrap_or_default();
  if value.is_empty() {
    errors.push(FieldError::new(field, "this field is required"));
  } else if value.chars().count() > max_chars {
    errors.push(FieldError::new(
      field,
      format!("must be at most {max_chars} characters"),
    ));
  }
  value.to_owned()
}

// ─── Images ──────────────────────────────────────────────────────────────────

/// An uploaded file, before it has been checked or written anywhere.
#[derive(Debug, Clone)]
pub struct ImageUpload {
  pub file_name: String,
  pub bytes:     Bytes,
}

// ─── Notes ───────────────────────────────────────────────────────────────────

/// Raw note submission. Used for both creation and edits; edits ignore the
/// rating field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteForm {
  pub title:              Option<String>,
  pub text:               Option<String>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub rating_out_of_five: Option<String>,
  #[serde(skip)]
  pub image:              Option<ImageUpload>,
}

#[derive(Debug, Clone)]
pub struct ValidNote {
  pub title:  String,
  pub text:   String,
  pub rating: Option<Rating>,
  pub image:  Option<ImageUpload>,
}

#[derive(Debug, Clone)]
pub struct ValidNoteEdit {
  pub title: String,
  pub text:  String,
  pub image: Option<ImageUpload>,
}

impl NoteForm {
  /// Validate a new note. A blank rating is dropped; a non-blank invalid one
  /// fails the whole submission.
  pub fn validate_new(self) -> Result<ValidNote, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let title = required(&mut errors, "title", self.title.as_deref(), TITLE_MAX_CHARS);
    let text = required(&mut errors, "text", self.text.as_deref(), TEXT_MAX_CHARS);
    let rating = match Rating::parse_optional(self.rating_out_of_five.as_deref()) {
      Ok(r) => r,
      Err(e) => {
        errors.push(e);
        None
      }
    };
    errors.into_result(ValidNote { title, text, rating, image: self.image })
  }

  pub fn validate_edit(self) -> Result<ValidNoteEdit, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let title = required(&mut errors, "title", self.title.as_deref(), TITLE_MAX_CHARS);
    let text = required(&mut errors, "text", self.text.as_deref(), TEXT_MAX_CHARS);
    errors.into_result(ValidNoteEdit { title, text, image: self.image })
  }
}

// ─── Ratings ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RatingForm {
  #[serde(default, deserialize_with = "lenient_string")]
  pub rating_out_of_five: Option<String>,
}

impl RatingForm {
  /// A standalone rating is required: blank input is an error here.
  pub fn validate(&self) -> Result<Rating, ValidationErrors> {
    self
      .rating_out_of_five
      .as_deref()
      .unwrap_or_default()
      .parse()
      .map_err(ValidationErrors::from)
  }
}

// ─── Registration ────────────────────────────────────────────────────────────

pub const USERNAME_MAX_CHARS: usize = 150;
pub const PASSWORD_MIN_CHARS: usize = 8;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
  pub username:   Option<String>,
  pub email:      Option<String>,
  pub first_name: Option<String>,
  pub last_name:  Option<String>,
  pub password1:  Option<String>,
  pub password2:  Option<String>,
}

#[derive(Debug, Clone)]
pub struct ValidRegistration {
  pub username:   String,
  pub email:      String,
  pub first_name: String,
  pub last_name:  String,
  pub password:   String,
}

impl RegistrationForm {
  pub fn validate(self) -> Result<ValidRegistration, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let username = required(
      &mut errors,
      "username",
      self.username.as_deref(),
      USERNAME_MAX_CHARS,
    );
    if !username.is_empty()
      && !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "@.+-_".contains(c))
    {
      errors.push(FieldError::new(
        "username",
        "may contain only letters, digits and @/./+/-/_",
      ));
    }

    let email = required(&mut errors, "email", self.email.as_deref(), 254);
    if !email.is_empty() && !valid_email(&email) {
      errors.push(FieldError::new("email", "enter a valid email address"));
    }

    let first_name = required(&mut errors, "first_name", self.first_name.as_deref(), 150);
    let last_name = required(&mut errors, "last_name", self.last_name.as_deref(), 150);

    let password = self.password1.unwrap_or_default();
    if password.chars().count() < PASSWORD_MIN_CHARS {
      errors.push(FieldError::new(
        "password1",
        format!("must be at least {PASSWORD_MIN_CHARS} characters"),
      ));
    }
    if self.password2.as_deref() != Some(password.as_str()) {
      errors.push(FieldError::new("password2", "the two passwords do not match"));
    }

    errors.into_result(ValidRegistration {
      username,
      email,
      first_name,
      last_name,
      password,
    })
  }
}

fn valid_email(s: &str) -> bool {
  match s.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !s.contains(char::is_whitespace)
    }
    None => false,
  }
}
