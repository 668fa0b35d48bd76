//! Server settings, read from an optional TOML file layered with
//! `LMN_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use lmn_core::{
  badge::{BadgePolicy, BadgeRule},
  media::DEFAULT_MAX_IMAGE_BYTES,
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_database_path")]
  pub database_path:    PathBuf,
  #[serde(default = "default_media_root")]
  pub media_root:       PathBuf,
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes: usize,
  /// Replaces the built-in badge table when present.
  #[serde(default)]
  pub badges:           Option<Vec<BadgeRule>>,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8000 }

fn default_database_path() -> PathBuf { PathBuf::from("lmn.sqlite3") }

fn default_media_root() -> PathBuf { PathBuf::from("media") }

fn default_max_upload_bytes() -> usize { DEFAULT_MAX_IMAGE_BYTES }

impl ServerConfig {
  /// Load `file` (if it exists) and apply `LMN_*` overrides on top.
  pub fn load(file: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(config::Environment::with_prefix("LMN"))
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn badge_policy(&self) -> anyhow::Result<BadgePolicy> {
    match &self.badges {
      Some(rules) => BadgePolicy::new(rules.clone()).context("invalid badge table"),
      None => Ok(BadgePolicy::default()),
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn from_toml(src: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(src, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn defaults_apply() {
    let cfg = from_toml("");
    assert_eq!(cfg.address(), "127.0.0.1:8000");
    assert_eq!(cfg.max_upload_bytes, DEFAULT_MAX_IMAGE_BYTES);
    assert_eq!(cfg.badge_policy().unwrap(), BadgePolicy::default());
  }

  #[test]
  fn custom_badge_table() {
    let cfg = from_toml(
      r#"
      port = 9000

      [[badges]]
      slug = "first"
      name = "First"
      description = "One note"
      notes_required = 1

      [[badges]]
      slug = "third"
      name = "Third"
      description = "Three notes"
      notes_required = 3
      "#,
    );
    assert_eq!(cfg.port, 9000);
    let policy = cfg.badge_policy().unwrap();
    assert_eq!(policy.earned(2).count(), 1);
    assert_eq!(policy.earned(3).count(), 2);
  }

  #[test]
  fn rejects_non_increasing_badges() {
    let cfg = from_toml(
      r#"
      [[badges]]
      slug = "a"
      name = "A"
      description = ""
      notes_required = 2

      [[badges]]
      slug = "b"
      name = "B"
      description = ""
      notes_required = 2
      "#,
    );
    assert!(cfg.badge_policy().is_err());
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/lmn.db")), PathBuf::from(home).join("lmn.db"));
    assert_eq!(expand_tilde(Path::new("/srv/lmn.db")), PathBuf::from("/srv/lmn.db"));
  }
}
