//! Badge engine: awards derived purely from a user's total note count.
//!
//! The policy is an explicit, ordered table of `(notes_required → badge)`
//! rules. After each note is recorded the store counts the author's notes and
//! awards every rule whose threshold has been reached and which the profile
//! does not hold yet. Awards are never revoked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One row of the threshold table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeRule {
  /// Stable identifier; awards reference badges by slug.
  pub slug:           String,
  pub name:           String,
  pub description:    String,
  pub notes_required: u64,
}

impl BadgeRule {
  fn new(slug: &str, name: &str, description: &str, notes_required: u64) -> Self {
    Self {
      slug: slug.to_owned(),
      name: name.to_owned(),
      description: description.to_owned(),
      notes_required,
    }
  }
}

/// A badge as persisted in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
  pub badge_id:       i64,
  pub slug:           String,
  pub name:           String,
  pub description:    String,
  pub notes_required: u64,
}

/// A badge held by a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardedBadge {
  pub badge:      Badge,
  pub awarded_at: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
  #[error("badge table is empty")]
  Empty,
  #[error("badge rule {0} has an empty slug")]
  EmptySlug(usize),
  #[error("badge {0:?} must require at least one note")]
  ZeroThreshold(String),
  #[error("badge {0:?} does not require more notes than the previous badge")]
  NotIncreasing(String),
  #[error("badge slug {0:?} appears more than once")]
  DuplicateSlug(String),
}

/// Validated threshold table, ordered by strictly increasing
/// `notes_required`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgePolicy {
  rules: Vec<BadgeRule>,
}

impl BadgePolicy {
  pub fn new(rules: Vec<BadgeRule>) -> Result<Self, PolicyError> {
    if rules.is_empty() {
      return Err(PolicyError::Empty);
    }
    let mut previous = 0;
    for (i, rule) in rules.iter().enumerate() {
      if rule.slug.trim().is_empty() {
        return Err(PolicyError::EmptySlug(i));
      }
      if rule.notes_required == 0 {
        return Err(PolicyError::ZeroThreshold(rule.slug.clone()));
      }
      if rule.notes_required <= previous {
        return Err(PolicyError::NotIncreasing(rule.slug.clone()));
      }
      if rules[..i].iter().any(|r| r.slug == rule.slug) {
        return Err(PolicyError::DuplicateSlug(rule.slug.clone()));
      }
      previous = rule.notes_required;
    }
    Ok(Self { rules })
  }

  pub fn rules(&self) -> &[BadgeRule] { &self.rules }

  /// Every rule reached at `note_count`, lowest threshold first.
  pub fn earned(&self, note_count: u64) -> impl Iterator<Item = &BadgeRule> {
    self
      .rules
      .iter()
      .take_while(move |r| r.notes_required <= note_count)
  }
}

impl Default for BadgePolicy {
  fn default() -> Self {
    Self {
      rules: vec![
        BadgeRule::new("first-note", "Opening Act", "Posted a first note", 1),
        BadgeRule::new("second-note", "Encore", "Posted a second note", 2),
        BadgeRule::new("five-notes", "Regular", "Posted five notes", 5),
        BadgeRule::new("ten-notes", "Headliner", "Posted ten notes", 10),
        BadgeRule::new("25-notes", "Roadie", "Posted 25 notes", 25),
        BadgeRule::new("50-notes", "Tour Veteran", "Posted 50 notes", 50),
        BadgeRule::new("100-notes", "Hall of Fame", "Posted 100 notes", 100),
      ],
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn rule(slug: &str, n: u64) -> BadgeRule { BadgeRule::new(slug, slug, "", n) }

  #[test]
  fn default_table_matches_observed_counts() {
    let policy = BadgePolicy::default();
    let counts: Vec<usize> =
      (0..=3).map(|n| policy.earned(n).count()).collect();
    assert_eq!(counts, [0, 1, 2, 2]);
  }

  #[test]
  fn earned_is_monotonic() {
    let policy = BadgePolicy::default();
    let mut last = 0;
    for n in 0..200 {
      let c = policy.earned(n).count();
      assert!(c >= last, "count dropped at {n}");
      last = c;
    }
    assert_eq!(last, policy.rules().len());
  }

  #[test]
  fn rejects_bad_tables() {
    assert_eq!(BadgePolicy::new(vec![]), Err(PolicyError::Empty));
    assert_eq!(
      BadgePolicy::new(vec![rule("a", 0)]),
      Err(PolicyError::ZeroThreshold("a".into()))
    );
    assert_eq!(
      BadgePolicy::new(vec![rule("a", 2), rule("b", 2)]),
      Err(PolicyError::NotIncreasing("b".into()))
    );
    assert_eq!(
      BadgePolicy::new(vec![rule("a", 1), rule("a", 3)]),
      Err(PolicyError::DuplicateSlug("a".into()))
    );
    assert_eq!(
      BadgePolicy::new(vec![rule(" ", 1)]),
      Err(PolicyError::EmptySlug(0))
    );
  }

  #[test]
  fn custom_table() {
    let policy =
      BadgePolicy::new(vec![rule("three", 3), rule("seven", 7)]).unwrap();
    assert_eq!(policy.earned(2).count(), 0);
    let slugs: Vec<_> = policy.earned(7).map(|r| r.slug.as_str()).collect();
    assert_eq!(slugs, ["three", "seven"]);
  }
}
