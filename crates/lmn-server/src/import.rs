//! Bulk catalog import.
//!
//! The file holds venues, artists and shows; each show refers to its artist
//! and venue by position in the file's own lists.
//!
//! ```json
//! {
//!   "venues":  [{ "name": "The Anthem", "city": "Washington", "state": "DC" }],
//!   "artists": [{ "name": "Phish" }],
//!   "shows":   [{ "show_date": "2024-04-20T20:00:00Z", "artist": 0, "venue": 0 }]
//! }
//! ```

use std::path::Path;

use anyhow::{Context as _, bail};
use chrono::{DateTime, Utc};
use lmn_core::{
  catalog::{NewArtist, NewShow, NewVenue},
  store::LmnStore,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CatalogFile {
  #[serde(default)]
  pub venues:  Vec<NewVenue>,
  #[serde(default)]
  pub artists: Vec<NewArtist>,
  #[serde(default)]
  pub shows:   Vec<ShowEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ShowEntry {
  pub show_date: DateTime<Utc>,
  pub artist:    usize,
  pub venue:     usize,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
  pub venues:  usize,
  pub artists: usize,
  pub shows:   usize,
}

impl CatalogFile {
  pub async fn read(path: &Path) -> anyhow::Result<Self> {
    let raw = tokio::fs::read(path)
      .await
      .with_context(|| format!("failed to read {path:?}"))?;
    serde_json::from_slice(&raw).with_context(|| format!("{path:?} is not a valid catalog"))
  }

  /// Every show must point at an entry that exists in this file.
  fn check_references(&self) -> anyhow::Result<()> {
    for (i, show) in self.shows.iter().enumerate() {
      if show.artist >= self.artists.len() {
        bail!("show #{i} refers to artist #{} which is not in the file", show.artist);
      }
      if show.venue >= self.venues.len() {
        bail!("show #{i} refers to venue #{} which is not in the file", show.venue);
      }
    }
    Ok(())
  }
}

/// Insert the whole catalog. References are checked before anything is
/// written, so a bad file leaves the store untouched.
pub async fn import_catalog<S: LmnStore>(
  store: &S,
  catalog: CatalogFile,
) -> anyhow::Result<ImportSummary> {
  catalog.check_references()?;

  let mut venue_ids = Vec::with_capacity(catalog.venues.len());
  for venue in catalog.venues {
    let venue = store.add_venue(venue).await.context("failed to add venue")?;
    venue_ids.push(venue.venue_id);
  }

  let mut artist_ids = Vec::with_capacity(catalog.artists.len());
  for artist in catalog.artists {
    let artist = store.add_artist(artist).await.context("failed to add artist")?;
    artist_ids.push(artist.artist_id);
  }

  let mut shows = 0;
  for entry in catalog.shows {
    let input = NewShow {
      show_date: entry.show_date,
      artist_id: artist_ids[entry.artist],
      venue_id:  venue_ids[entry.venue],
    };
    match store.add_show(input).await.context("failed to add show")? {
      Some(show) => {
        tracing::debug!(show_id = show.show_id, "imported show");
        shows += 1;
      }
      None => bail!("show on {} lost its artist or venue", entry.show_date),
    }
  }

  let summary = ImportSummary {
    venues: venue_ids.len(),
    artists: artist_ids.len(),
    shows,
  };
  tracing::info!(?summary, "catalog imported");
  Ok(summary)
}
