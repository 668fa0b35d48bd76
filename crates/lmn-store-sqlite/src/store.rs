//! [`SqliteStore`], the SQLite implementation of [`LmnStore`].

use std::path::Path;

use rusqlite::{OptionalExtension as _, Transaction, params};

use lmn_core::{
  badge::{AwardedBadge, Badge, BadgePolicy},
  catalog::{Artist, NewArtist, NewShow, NewVenue, ShowListing, Venue},
  note::{NewNote, Note, NotePatch, NoteReceipt, RatingOutcome},
  rating::{NewRating, RatingSummary, ShowRating},
  store::{
    LmnStore, NameQuery, NoteDeletion, NoteInsert, NoteQuery, NoteUpdate,
    Page, RatingInsert, ShowQuery, UserInsert,
  },
  user::{Credentials, NewUser, User},
};

use crate::{
  Result,
  encode::{
    NOTE_COLUMNS, RATING_COLUMNS, RawAward, RawNote, RawRating, RawShow,
    RawUser, SHOW_SELECT, USER_COLUMNS, artist_from_row, badge_from_row,
    encode_dt, now, venue_from_row,
  },
  schema::SCHEMA,
};

// ─── Raw transaction outcomes ────────────────────────────────────────────────

// Undecoded results handed back from the connection thread.

enum RawRatingOutcome {
  NotSubmitted,
  Saved(RawRating),
  AlreadyRated(RawRating),
}

enum RawNoteInsert {
  Recorded {
    note:   RawNote,
    rating: RawRatingOutcome,
    badges: Vec<Badge>,
  },
  ShowNotFound,
}

enum RawNoteUpdate {
  Updated { before: RawNote, after: RawNote, image_replaced: bool },
  NotFound,
  NotOwner,
}

enum RawNoteDeletion {
  Deleted(RawNote),
  NotFound,
  NotOwner,
}

enum RawRatingInsert {
  Created(RawRating),
  AlreadyRated(RawRating),
  ShowNotFound,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An LMN store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = %path.display(), "opened sqlite store");
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Helpers run on the connection thread ────────────────────────────────────

/// `%needle%` with SQL wildcards in the needle escaped for `ESCAPE '\'`.
/// Blank searches mean "no filter".
fn like_pattern(search: Option<&str>) -> Option<String> {
  let needle = search.map(str::trim).filter(|s| !s.is_empty())?;
  let mut out = String::with_capacity(needle.len() + 2);
  out.push('%');
  for c in needle.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  Some(out)
}

/// SQLite reads a negative OFFSET as zero, so oversized offsets saturate.
fn page_params(page: Page) -> (i64, i64) {
  let to_sql = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
  (to_sql(page.limit()), to_sql(page.offset()))
}

fn show_exists(tx: &Transaction<'_>, show_id: i64) -> rusqlite::Result<bool> {
  Ok(
    tx.query_row("SELECT 1 FROM shows WHERE show_id = ?1", [show_id], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

fn note_row(tx: &Transaction<'_>, note_id: i64) -> rusqlite::Result<Option<RawNote>> {
  tx.query_row(
    &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE note_id = ?1"),
    [note_id],
    RawNote::from_row,
  )
  .optional()
}

fn rating_row(
  tx: &Transaction<'_>,
  user_id: i64,
  show_id: i64,
) -> rusqlite::Result<RawRating> {
  tx.query_row(
    &format!(
      "SELECT {RATING_COLUMNS} FROM show_ratings WHERE user_id = ?1 AND show_id = ?2"
    ),
    [user_id, show_id],
    RawRating::from_row,
  )
}

/// Insert a rating unless the pair is already rated. The `UNIQUE` constraint
/// decides, so concurrent duplicates cannot both succeed.
fn insert_rating_row(
  tx: &Transaction<'_>,
  input: NewRating,
  posted: &str,
) -> rusqlite::Result<(bool, RawRating)> {
  let inserted = tx.execute(
    "INSERT INTO show_ratings (user_id, show_id, rating_out_of_five, posted_date)
     VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT (user_id, show_id) DO NOTHING",
    params![input.user_id, input.show_id, input.rating.get(), posted],
  )?;
  Ok((inserted == 1, rating_row(tx, input.user_id, input.show_id)?))
}

/// Award every rule the user's note count has reached and the profile does
/// not hold yet. Returns the newly awarded badges.
fn award_badges(
  tx: &Transaction<'_>,
  user_id: i64,
  policy: &BadgePolicy,
  awarded_at: &str,
) -> rusqlite::Result<Vec<Badge>> {
  let count: i64 = tx.query_row(
    "SELECT COUNT(*) FROM notes WHERE user_id = ?1",
    [user_id],
    |r| r.get(0),
  )?;

  let mut awarded = Vec::new();
  for rule in policy.earned(count.max(0) as u64) {
    tx.execute(
      "INSERT INTO badges (slug, name, description, notes_required)
       VALUES (?1, ?2, ?3, ?4)
       ON CONFLICT (slug) DO UPDATE SET
         name           = excluded.name,
         description    = excluded.description,
         notes_required = excluded.notes_required",
      params![
        rule.slug,
        rule.name,
        rule.description,
        i64::try_from(rule.notes_required).unwrap_or(i64::MAX)
      ],
    )?;
    let badge = tx.query_row(
      "SELECT badge_id, slug, name, description, notes_required
       FROM badges WHERE slug = ?1",
      [&rule.slug],
      badge_from_row,
    )?;
    let inserted = tx.execute(
      "INSERT INTO profile_badges (user_id, badge_id, awarded_at)
       VALUES (?1, ?2, ?3)
       ON CONFLICT (user_id, badge_id) DO NOTHING",
      params![user_id, badge.badge_id, awarded_at],
    )?;
    if inserted == 1 {
      awarded.push(badge);
    }
  }
  Ok(awarded)
}

fn decode_notes(raws: Vec<RawNote>) -> Result<Vec<Note>> {
  raws.into_iter().map(RawNote::into_note).collect()
}

fn decode_shows(raws: Vec<RawShow>) -> Result<Vec<ShowListing>> {
  raws.into_iter().map(RawShow::into_listing).collect()
}

// ─── LmnStore impl ───────────────────────────────────────────────────────────

impl LmnStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<UserInsert> {
    let joined = encode_dt(now());

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let inserted = tx.execute(
          "INSERT INTO users
             (username, email, first_name, last_name, password_hash, date_joined)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (username) DO NOTHING",
          params![
            input.username,
            input.email,
            input.first_name,
            input.last_name,
            input.password_hash,
            joined,
          ],
        )?;
        if inserted == 0 {
          return Ok(None);
        }
        let user_id = tx.last_insert_rowid();
        tx.execute("INSERT INTO profiles (user_id) VALUES (?1)", [user_id])?;
        let raw = tx.query_row(
          &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.user_id = ?1"),
          [user_id],
          RawUser::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    match raw {
      Some(raw) => Ok(UserInsert::Created(raw.into_user()?)),
      None => Ok(UserInsert::UsernameTaken),
    }
  }

  async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.user_id = ?1"),
              [user_id],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn get_credentials(&self, username: &str) -> Result<Option<Credentials>> {
    let username = username.to_owned();

    let raw: Option<(RawUser, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {USER_COLUMNS}, u.password_hash FROM users u
                 WHERE u.username = ?1"
              ),
              [username],
              |row| Ok((RawUser::from_row(row)?, row.get(6)?)),
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(user, password_hash)| {
        Ok(Credentials { user: user.into_user()?, password_hash })
      })
      .transpose()
  }

  // ── Catalog ───────────────────────────────────────────────────────────

  async fn add_venue(&self, input: NewVenue) -> Result<Venue> {
    let venue = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO venues (name, city, state) VALUES (?1, ?2, ?3)",
          params![input.name, input.city, input.state],
        )?;
        Ok(Venue {
          venue_id: conn.last_insert_rowid(),
          name:     input.name,
          city:     input.city,
          state:    input.state,
        })
      })
      .await?;
    Ok(venue)
  }

  async fn add_artist(&self, input: NewArtist) -> Result<Artist> {
    let artist = self
      .conn
      .call(move |conn| {
        conn.execute("INSERT INTO artists (name) VALUES (?1)", [&input.name])?;
        Ok(Artist { artist_id: conn.last_insert_rowid(), name: input.name })
      })
      .await?;
    Ok(artist)
  }

  async fn add_show(&self, input: NewShow) -> Result<Option<ShowListing>> {
    let date = encode_dt(input.show_date);

    let raw: Option<RawShow> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let inserted = tx.execute(
          "INSERT INTO shows (show_date, artist_id, venue_id)
           SELECT ?1, ?2, ?3
           WHERE EXISTS (SELECT 1 FROM artists WHERE artist_id = ?2)
             AND EXISTS (SELECT 1 FROM venues  WHERE venue_id  = ?3)",
          params![date, input.artist_id, input.venue_id],
        )?;
        if inserted == 0 {
          return Ok(None);
        }
        let raw = tx.query_row(
          &format!("{SHOW_SELECT} WHERE s.show_id = ?1"),
          [tx.last_insert_rowid()],
          RawShow::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw.map(RawShow::into_listing).transpose()
  }

  async fn get_venue(&self, venue_id: i64) -> Result<Option<Venue>> {
    let venue = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT venue_id, name, city, state FROM venues WHERE venue_id = ?1",
              [venue_id],
              venue_from_row,
            )
            .optional()?,
        )
      })
      .await?;
    Ok(venue)
  }

  async fn list_venues(&self, query: &NameQuery) -> Result<Vec<Venue>> {
    let pattern = like_pattern(query.search_name.as_deref());
    let (limit, offset) = page_params(query.page);

    let venues = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT venue_id, name, city, state FROM venues
           WHERE ?1 IS NULL OR name LIKE ?1 ESCAPE '\\'
           ORDER BY name COLLATE NOCASE, venue_id
           LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt
          .query_map(params![pattern, limit, offset], venue_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(venues)
  }

  async fn get_artist(&self, artist_id: i64) -> Result<Option<Artist>> {
    let artist = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT artist_id, name FROM artists WHERE artist_id = ?1",
              [artist_id],
              artist_from_row,
            )
            .optional()?,
        )
      })
      .await?;
    Ok(artist)
  }

  async fn list_artists(&self, query: &NameQuery) -> Result<Vec<Artist>> {
    let pattern = like_pattern(query.search_name.as_deref());
    let (limit, offset) = page_params(query.page);

    let artists = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT artist_id, name FROM artists
           WHERE ?1 IS NULL OR name LIKE ?1 ESCAPE '\\'
           ORDER BY name COLLATE NOCASE, artist_id
           LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt
          .query_map(params![pattern, limit, offset], artist_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(artists)
  }

  async fn get_show(&self, show_id: i64) -> Result<Option<ShowListing>> {
    let raw: Option<RawShow> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("{SHOW_SELECT} WHERE s.show_id = ?1"),
              [show_id],
              RawShow::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawShow::into_listing).transpose()
  }

  async fn list_shows(&self, query: &ShowQuery) -> Result<Vec<ShowListing>> {
    let (artist_id, venue_id) = (query.artist_id, query.venue_id);
    let (limit, offset) = page_params(query.page);

    let raws: Vec<RawShow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "{SHOW_SELECT}
           WHERE (?1 IS NULL OR s.artist_id = ?1)
             AND (?2 IS NULL OR s.venue_id  = ?2)
           ORDER BY s.show_date DESC, s.show_id
           LIMIT ?3 OFFSET ?4"
        ))?;
        let rows = stmt
          .query_map(params![artist_id, venue_id, limit, offset], RawShow::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    decode_shows(raws)
  }

  // ── Notes ─────────────────────────────────────────────────────────────

  async fn record_note(&self, input: NewNote, badges: &BadgePolicy) -> Result<NoteInsert> {
    let policy = badges.clone();
    let stamp = encode_dt(now());
    let posted = input.posted_date.map(encode_dt).unwrap_or_else(|| stamp.clone());

    let raw: RawNoteInsert = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !show_exists(&tx, input.show_id)? {
          return Ok(RawNoteInsert::ShowNotFound);
        }

        let image = input.image.as_ref();
        tx.execute(
          "INSERT INTO notes
             (show_id, user_id, title, text, posted_date,
              image_path, image_name, image_hash, image_media_type)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          params![
            input.show_id,
            input.user_id,
            input.title,
            input.text,
            posted,
            image.map(|i| &i.path),
            image.map(|i| &i.original_name),
            image.map(|i| &i.content_hash),
            image.map(|i| &i.media_type),
          ],
        )?;
        let note_id = tx.last_insert_rowid();

        let rating = match input.rating {
          None => RawRatingOutcome::NotSubmitted,
          Some(rating) => {
            let new = NewRating { user_id: input.user_id, show_id: input.show_id, rating };
            match insert_rating_row(&tx, new, &stamp)? {
              (true, row) => RawRatingOutcome::Saved(row),
              (false, row) => RawRatingOutcome::AlreadyRated(row),
            }
          }
        };

        let awarded = award_badges(&tx, input.user_id, &policy, &stamp)?;

        let note = note_row(&tx, note_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(RawNoteInsert::Recorded { note, rating, badges: awarded })
      })
      .await?;

    match raw {
      RawNoteInsert::ShowNotFound => Ok(NoteInsert::ShowNotFound),
      RawNoteInsert::Recorded { note, rating, badges } => {
        let rating = match rating {
          RawRatingOutcome::NotSubmitted => RatingOutcome::NotSubmitted,
          RawRatingOutcome::Saved(r) => RatingOutcome::Saved { rating: r.into_rating()? },
          RawRatingOutcome::AlreadyRated(r) => {
            RatingOutcome::AlreadyRated { rating: r.into_rating()? }
          }
        };
        Ok(NoteInsert::Recorded(NoteReceipt {
          note: note.into_note()?,
          rating,
          badges_awarded: badges,
        }))
      }
    }
  }

  async fn get_note(&self, note_id: i64) -> Result<Option<Note>> {
    let raw: Option<RawNote> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE note_id = ?1"),
              [note_id],
              RawNote::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawNote::into_note).transpose()
  }

  async fn list_notes(&self, query: &NoteQuery) -> Result<Vec<Note>> {
    let (show_id, user_id) = (query.show_id, query.user_id);
    let (limit, offset) = page_params(query.page);

    let raws: Vec<RawNote> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {NOTE_COLUMNS} FROM notes
           WHERE (?1 IS NULL OR show_id = ?1)
             AND (?2 IS NULL OR user_id = ?2)
           ORDER BY posted_date DESC, note_id ASC
           LIMIT ?3 OFFSET ?4"
        ))?;
        let rows = stmt
          .query_map(params![show_id, user_id, limit, offset], RawNote::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    decode_notes(raws)
  }

  async fn count_notes(&self, user_id: i64) -> Result<u64> {
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM notes WHERE user_id = ?1",
          [user_id],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(count.max(0) as u64)
  }

  async fn update_note(&self, note_id: i64, owner: i64, patch: NotePatch) -> Result<NoteUpdate> {
    let raw: RawNoteUpdate = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(before) = note_row(&tx, note_id)? else {
          return Ok(RawNoteUpdate::NotFound);
        };
        if before.user_id != owner {
          return Ok(RawNoteUpdate::NotOwner);
        }

        tx.execute(
          "UPDATE notes SET title = ?2, text = ?3 WHERE note_id = ?1",
          params![note_id, patch.title, patch.text],
        )?;
        let image_replaced = match &patch.image {
          Some(image) => {
            tx.execute(
              "UPDATE notes SET image_path = ?2, image_name = ?3,
                 image_hash = ?4, image_media_type = ?5
               WHERE note_id = ?1",
              params![
                note_id,
                image.path,
                image.original_name,
                image.content_hash,
                image.media_type,
              ],
            )?;
            true
          }
          None => false,
        };

        let after = note_row(&tx, note_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(RawNoteUpdate::Updated { before, after, image_replaced })
      })
      .await?;

    match raw {
      RawNoteUpdate::NotFound => Ok(NoteUpdate::NotFound),
      RawNoteUpdate::NotOwner => Ok(NoteUpdate::NotOwner),
      RawNoteUpdate::Updated { before, after, image_replaced } => {
        let replaced_image = if image_replaced { before.into_note()?.image } else { None };
        Ok(NoteUpdate::Updated { note: after.into_note()?, replaced_image })
      }
    }
  }

  async fn delete_note(&self, note_id: i64, owner: i64) -> Result<NoteDeletion> {
    let raw: RawNoteDeletion = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(note) = note_row(&tx, note_id)? else {
          return Ok(RawNoteDeletion::NotFound);
        };
        if note.user_id != owner {
          return Ok(RawNoteDeletion::NotOwner);
        }
        tx.execute("DELETE FROM notes WHERE note_id = ?1", [note_id])?;
        tx.commit()?;
        Ok(RawNoteDeletion::Deleted(note))
      })
      .await?;

    match raw {
      RawNoteDeletion::Deleted(note) => Ok(NoteDeletion::Deleted(note.into_note()?)),
      RawNoteDeletion::NotFound => Ok(NoteDeletion::NotFound),
      RawNoteDeletion::NotOwner => Ok(NoteDeletion::NotOwner),
    }
  }

  // ── Ratings ───────────────────────────────────────────────────────────

  async fn insert_rating(&self, input: NewRating) -> Result<RatingInsert> {
    let posted = encode_dt(now());

    let raw: RawRatingInsert = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !show_exists(&tx, input.show_id)? {
          return Ok(RawRatingInsert::ShowNotFound);
        }
        let outcome = match insert_rating_row(&tx, input, &posted)? {
          (true, row) => RawRatingInsert::Created(row),
          (false, row) => RawRatingInsert::AlreadyRated(row),
        };
        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    match raw {
      RawRatingInsert::Created(r) => Ok(RatingInsert::Created(r.into_rating()?)),
      RawRatingInsert::AlreadyRated(r) => Ok(RatingInsert::AlreadyRated(r.into_rating()?)),
      RawRatingInsert::ShowNotFound => Ok(RatingInsert::ShowNotFound),
    }
  }

  async fn get_rating(&self, user_id: i64, show_id: i64) -> Result<Option<ShowRating>> {
    let raw: Option<RawRating> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {RATING_COLUMNS} FROM show_ratings
                 WHERE user_id = ?1 AND show_id = ?2"
              ),
              [user_id, show_id],
              RawRating::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRating::into_rating).transpose()
  }

  async fn list_ratings(&self, show_id: i64) -> Result<Vec<ShowRating>> {
    let raws: Vec<RawRating> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RATING_COLUMNS} FROM show_ratings
           WHERE show_id = ?1
           ORDER BY posted_date, rating_id"
        ))?;
        let rows = stmt
          .query_map([show_id], RawRating::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRating::into_rating).collect()
  }

  async fn rating_summary(&self, show_id: i64) -> Result<RatingSummary> {
    let (count, average): (i64, Option<f64>) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*), AVG(rating_out_of_five) FROM show_ratings WHERE show_id = ?1",
          [show_id],
          |r| Ok((r.get(0)?, r.get(1)?)),
        )?)
      })
      .await?;

    Ok(RatingSummary { count: count.max(0) as u64, average })
  }

  // ── Badges ────────────────────────────────────────────────────────────

  async fn list_badges(&self, user_id: i64) -> Result<Vec<AwardedBadge>> {
    let raws: Vec<RawAward> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT b.badge_id, b.slug, b.name, b.description, b.notes_required,
                  pb.awarded_at
           FROM profile_badges pb
           JOIN badges b ON b.badge_id = pb.badge_id
           WHERE pb.user_id = ?1
           ORDER BY pb.awarded_at, b.notes_required, b.badge_id",
        )?;
        let rows = stmt
          .query_map([user_id], RawAward::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAward::into_awarded).collect()
  }
}
