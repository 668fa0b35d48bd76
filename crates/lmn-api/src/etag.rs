//! ETags for note images.
//!
//! The ETag is the quoted SHA-256 content hash recorded when the image was
//! stored, so it changes exactly when the bytes do.

use axum::http::{HeaderMap, header};
use lmn_core::note::NoteImage;

pub fn image_etag(image: &NoteImage) -> String { format!("\"{}\"", image.content_hash) }

/// `true` if `If-None-Match` lists `etag` (or `*`). Weak validators compare
/// equal to their strong form.
pub fn if_none_match(headers: &HeaderMap, etag: &str) -> bool {
  headers
    .get_all(header::IF_NONE_MATCH)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(','))
    .map(|t| t.trim())
    .any(|t| t == "*" || t.trim_start_matches("W/") == etag)
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn image(hash: &str) -> NoteImage {
    NoteImage {
      path:          "user_images/1/x-a.png".into(),
      original_name: "a.png".into(),
      content_hash:  hash.into(),
      media_type:    "image/png".into(),
    }
  }

  #[test]
  fn etag_follows_content() {
    assert_eq!(image_etag(&image("abc")), "\"abc\"");
    assert_ne!(image_etag(&image("abc")), image_etag(&image("abd")));
  }

  #[test]
  fn matches_lists_and_weak_tags() {
    let mut h = HeaderMap::new();
    assert!(!if_none_match(&h, "\"abc\""));

    h.insert(header::IF_NONE_MATCH, HeaderValue::from_static("\"x\", W/\"abc\""));
    assert!(if_none_match(&h, "\"abc\""));
    assert!(!if_none_match(&h, "\"zzz\""));

    h.insert(header::IF_NONE_MATCH, HeaderValue::from_static("*"));
    assert!(if_none_match(&h, "\"anything\""));
  }
}
