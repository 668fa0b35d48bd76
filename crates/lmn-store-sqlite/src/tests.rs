//! Integration tests for `SqliteStore` and the service layer it backs,
//! against in-memory databases.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{TimeZone, Utc};
use lmn_core::{
  Error,
  badge::BadgePolicy,
  catalog::{NewArtist, NewShow, NewVenue},
  error::Resource,
  input::{ImageUpload, NoteForm, RatingForm, RegistrationForm},
  media::{DEFAULT_MAX_IMAGE_BYTES, MediaRoot},
  note::{NewNote, NotePatch, RatingOutcome},
  rating::{NewRating, Rating},
  service::Service,
  store::{
    LmnStore, NameQuery, NoteDeletion, NoteInsert, NoteQuery, NoteUpdate, Page,
    RatingInsert, ShowQuery, UserInsert,
  },
  user::{Identity, NewUser},
};

use crate::SqliteStore;

const TINY_PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, username: &str) -> Identity {
  let outcome = s
    .create_user(NewUser {
      username:      username.into(),
      email:         format!("{username}@example.com"),
      first_name:    String::new(),
      last_name:     String::new(),
      password_hash: "unused".into(),
    })
    .await
    .unwrap();
  match outcome {
    UserInsert::Created(u) => Identity::from(&u),
    UserInsert::UsernameTaken => panic!("username {username} taken"),
  }
}

/// Two artists, two venues and two shows; returns the show ids.
async fn seed(s: &SqliteStore) -> (i64, i64) {
  let slowdive = s.add_artist(NewArtist { name: "Slowdive".into() }).await.unwrap();
  let low = s.add_artist(NewArtist { name: "Low".into() }).await.unwrap();
  let fillmore = s
    .add_venue(NewVenue {
      name:  "The Fillmore".into(),
      city:  "San Francisco".into(),
      state: "CA".into(),
    })
    .await
    .unwrap();
  let first_ave = s
    .add_venue(NewVenue {
      name:  "First Avenue".into(),
      city:  "Minneapolis".into(),
      state: "MN".into(),
    })
    .await
    .unwrap();

  let one = s
    .add_show(NewShow {
      show_date: Utc.with_ymd_and_hms(2017, 2, 3, 1, 30, 0).unwrap(),
      artist_id: slowdive.artist_id,
      venue_id:  fillmore.venue_id,
    })
    .await
    .unwrap()
    .unwrap();
  let two = s
    .add_show(NewShow {
      show_date: Utc.with_ymd_and_hms(2019, 10, 12, 2, 0, 0).unwrap(),
      artist_id: low.artist_id,
      venue_id:  first_ave.venue_id,
    })
    .await
    .unwrap()
    .unwrap();
  (one.show_id, two.show_id)
}

fn note(show_id: i64, user_id: i64, title: &str) -> NewNote {
  NewNote {
    show_id,
    user_id,
    title: title.into(),
    text: "text".into(),
    posted_date: None,
    image: None,
    rating: None,
  }
}

fn rating(v: u8) -> Rating { Rating::new(v).unwrap() }

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_username_is_reported() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let again = s
    .create_user(NewUser {
      username:      "alice".into(),
      email:         "other@example.com".into(),
      first_name:    String::new(),
      last_name:     String::new(),
      password_hash: "x".into(),
    })
    .await
    .unwrap();
  assert!(matches!(again, UserInsert::UsernameTaken));

  let creds = s.get_credentials("alice").await.unwrap().unwrap();
  assert_eq!(creds.user.user_id, alice.user_id);
  assert_eq!(creds.password_hash, "unused");
  assert!(s.get_credentials("nobody").await.unwrap().is_none());
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn artists_are_alphabetical_and_searchable() {
  let s = store().await;
  for name in ["slowdive", "Beach House", "Low", "100% Gecs", "alvvays"] {
    s.add_artist(NewArtist { name: name.into() }).await.unwrap();
  }

  let all = s.list_artists(&NameQuery::default()).await.unwrap();
  let names: Vec<_> = all.iter().map(|a| a.name.as_str()).collect();
  assert_eq!(names, ["100% Gecs", "alvvays", "Beach House", "Low", "slowdive"]);

  let hits = s
    .list_artists(&NameQuery { search_name: Some("LOW".into()), ..Default::default() })
    .await
    .unwrap();
  let names: Vec<_> = hits.iter().map(|a| a.name.as_str()).collect();
  assert_eq!(names, ["Low", "slowdive"]);

  // Wildcards in the search match literally.
  let pct = s
    .list_artists(&NameQuery { search_name: Some("%".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(pct.len(), 1);
  assert_eq!(pct[0].name, "100% Gecs");

  let page = s
    .list_artists(&NameQuery {
      search_name: None,
      page:        Page { limit: Some(2), offset: Some(1) },
    })
    .await
    .unwrap();
  let names: Vec<_> = page.iter().map(|a| a.name.as_str()).collect();
  assert_eq!(names, ["alvvays", "Beach House"]);

  // An offset past i64::MAX is past the end, not the first page.
  let beyond = s
    .list_artists(&NameQuery {
      search_name: None,
      page:        Page { limit: None, offset: Some(usize::MAX) },
    })
    .await
    .unwrap();
  assert!(beyond.is_empty());
}

#[tokio::test]
async fn venue_search_ignores_case() {
  let s = store().await;
  seed(&s).await;
  let hits = s
    .list_venues(&NameQuery { search_name: Some("fill".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].city, "San Francisco");
}

#[tokio::test]
async fn add_show_rejects_unknown_references() {
  let s = store().await;
  let artist = s.add_artist(NewArtist { name: "Low".into() }).await.unwrap();
  let show = s
    .add_show(NewShow { show_date: Utc::now(), artist_id: artist.artist_id, venue_id: 99 })
    .await
    .unwrap();
  assert!(show.is_none());
}

#[tokio::test]
async fn shows_filter_by_artist_and_venue() {
  let s = store().await;
  let (one, two) = seed(&s).await;
  let show = s.get_show(one).await.unwrap().unwrap();
  assert_eq!(show.artist.name, "Slowdive");
  assert_eq!(show.venue.name, "The Fillmore");

  let all = s.list_shows(&ShowQuery::default()).await.unwrap();
  assert_eq!(all.iter().map(|s| s.show_id).collect::<Vec<_>>(), [two, one]);

  let by_artist = s
    .list_shows(&ShowQuery { artist_id: Some(show.artist.artist_id), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(by_artist.len(), 1);
  assert_eq!(by_artist[0].show_id, one);

  let by_venue = s
    .list_shows(&ShowQuery { venue_id: Some(12345), ..Default::default() })
    .await
    .unwrap();
  assert!(by_venue.is_empty());
}

// ─── Ratings ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn second_rating_keeps_the_first() {
  let s = store().await;
  let (show, _) = seed(&s).await;
  let alice = user(&s, "alice").await;

  let first = s
    .insert_rating(NewRating { user_id: alice.user_id, show_id: show, rating: rating(4) })
    .await
    .unwrap();
  let RatingInsert::Created(first) = first else { panic!("expected Created") };

  let second = s
    .insert_rating(NewRating { user_id: alice.user_id, show_id: show, rating: rating(1) })
    .await
    .unwrap();
  match second {
    RatingInsert::AlreadyRated(existing) => assert_eq!(existing, first),
    other => panic!("expected AlreadyRated, got {other:?}"),
  }

  let all = s.list_ratings(show).await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].rating_out_of_five.get(), 4);
}

#[tokio::test]
async fn two_users_can_rate_the_same_show() {
  let s = store().await;
  let (show, _) = seed(&s).await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  for (who, v) in [(&alice, 5), (&bob, 2)] {
    let r = s
      .insert_rating(NewRating { user_id: who.user_id, show_id: show, rating: rating(v) })
      .await
      .unwrap();
    assert!(matches!(r, RatingInsert::Created(_)));
  }

  let summary = s.rating_summary(show).await.unwrap();
  assert_eq!(summary.count, 2);
  assert_eq!(summary.average, Some(3.5));
  assert!(s.get_rating(bob.user_id, show).await.unwrap().is_some());
}

#[tokio::test]
async fn rating_unknown_show() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let r = s
    .insert_rating(NewRating { user_id: alice.user_id, show_id: 42, rating: rating(3) })
    .await
    .unwrap();
  assert!(matches!(r, RatingInsert::ShowNotFound));
  assert_eq!(s.rating_summary(42).await.unwrap().count, 0);
}

// ─── Notes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn notes_are_most_recent_first_ties_by_id() {
  let s = store().await;
  let (one, two) = seed(&s).await;
  let alice = user(&s, "alice").await;
  let policy = BadgePolicy::default();

  let t = |h| Utc.with_ymd_and_hms(2024, 5, 1, h, 0, 0).unwrap();
  let mut ids = Vec::new();
  for (show, hour) in [(one, 9), (two, 11), (one, 11), (one, 10)] {
    let input = NewNote { posted_date: Some(t(hour)), ..note(show, alice.user_id, "n") };
    let NoteInsert::Recorded(r) = s.record_note(input, &policy).await.unwrap() else {
      panic!("show exists");
    };
    ids.push(r.note.note_id);
  }

  let latest = s.list_notes(&NoteQuery::default()).await.unwrap();
  assert_eq!(
    latest.iter().map(|n| n.note_id).collect::<Vec<_>>(),
    [ids[1], ids[2], ids[3], ids[0]]
  );

  let for_show = s
    .list_notes(&NoteQuery { show_id: Some(one), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(
    for_show.iter().map(|n| n.note_id).collect::<Vec<_>>(),
    [ids[2], ids[3], ids[0]]
  );

  let for_user = s
    .list_notes(&NoteQuery { user_id: Some(alice.user_id), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(
    for_user.iter().map(|n| n.note_id).collect::<Vec<_>>(),
    [ids[1], ids[2], ids[3], ids[0]]
  );
  assert_eq!(s.count_notes(alice.user_id).await.unwrap(), 4);
}

#[tokio::test]
async fn note_on_unknown_show_is_not_recorded() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let out = s.record_note(note(7, alice.user_id, "x"), &BadgePolicy::default()).await.unwrap();
  assert!(matches!(out, NoteInsert::ShowNotFound));
  assert_eq!(s.count_notes(alice.user_id).await.unwrap(), 0);
}

#[tokio::test]
async fn note_with_rating_on_rated_show_still_saves() {
  let s = store().await;
  let (show, _) = seed(&s).await;
  let alice = user(&s, "alice").await;
  s.insert_rating(NewRating { user_id: alice.user_id, show_id: show, rating: rating(5) })
    .await
    .unwrap();

  let input = NewNote { rating: Some(rating(2)), ..note(show, alice.user_id, "again") };
  let NoteInsert::Recorded(receipt) =
    s.record_note(input, &BadgePolicy::default()).await.unwrap()
  else {
    panic!("show exists");
  };
  match receipt.rating {
    RatingOutcome::AlreadyRated { rating } => assert_eq!(rating.rating_out_of_five.get(), 5),
    other => panic!("expected AlreadyRated, got {other:?}"),
  }
  assert_eq!(s.count_notes(alice.user_id).await.unwrap(), 1);
}

#[tokio::test]
async fn only_the_owner_updates_or_deletes() {
  let s = store().await;
  let (show, _) = seed(&s).await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let NoteInsert::Recorded(r) =
    s.record_note(note(show, alice.user_id, "mine"), &BadgePolicy::default()).await.unwrap()
  else {
    panic!("show exists");
  };
  let id = r.note.note_id;

  let patch = NotePatch { title: "hijacked".into(), text: "x".into(), image: None };
  assert!(matches!(
    s.update_note(id, bob.user_id, patch.clone()).await.unwrap(),
    NoteUpdate::NotOwner
  ));
  assert!(matches!(s.delete_note(id, bob.user_id).await.unwrap(), NoteDeletion::NotOwner));
  assert!(matches!(s.update_note(999, alice.user_id, patch).await.unwrap(), NoteUpdate::NotFound));
  assert_eq!(s.get_note(id).await.unwrap().unwrap().title, "mine");

  let patch = NotePatch { title: "edited".into(), text: "better".into(), image: None };
  let NoteUpdate::Updated { note, replaced_image } =
    s.update_note(id, alice.user_id, patch).await.unwrap()
  else {
    panic!("owner may edit");
  };
  assert_eq!(note.title, "edited");
  assert!(replaced_image.is_none());

  assert!(matches!(s.delete_note(id, alice.user_id).await.unwrap(), NoteDeletion::Deleted(_)));
  assert!(s.get_note(id).await.unwrap().is_none());
  assert!(matches!(s.delete_note(id, alice.user_id).await.unwrap(), NoteDeletion::NotFound));
}

// ─── Badges ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn badge_counts_follow_the_table() {
  let s = store().await;
  let (show, _) = seed(&s).await;
  let alice = user(&s, "alice").await;
  let policy = BadgePolicy::default();

  assert!(s.list_badges(alice.user_id).await.unwrap().is_empty());

  let mut newly = Vec::new();
  for n in 1..=3 {
    let NoteInsert::Recorded(r) =
      s.record_note(note(show, alice.user_id, &format!("note {n}")), &policy).await.unwrap()
    else {
      panic!("show exists");
    };
    newly.push(r.badges_awarded.len());
    let held = s.list_badges(alice.user_id).await.unwrap().len();
    assert_eq!(held, [1, 2, 2][n - 1], "after {n} notes");
  }
  assert_eq!(newly, [1, 1, 0]);

  let held = s.list_badges(alice.user_id).await.unwrap();
  assert_eq!(held[0].badge.slug, "first-note");
  assert_eq!(held[1].badge.slug, "second-note");
}

#[tokio::test]
async fn deleting_notes_keeps_badges() {
  let s = store().await;
  let (show, _) = seed(&s).await;
  let alice = user(&s, "alice").await;
  let NoteInsert::Recorded(r) =
    s.record_note(note(show, alice.user_id, "only"), &BadgePolicy::default()).await.unwrap()
  else {
    panic!("show exists");
  };
  s.delete_note(r.note.note_id, alice.user_id).await.unwrap();
  assert_eq!(s.count_notes(alice.user_id).await.unwrap(), 0);
  assert_eq!(s.list_badges(alice.user_id).await.unwrap().len(), 1);
}

// ─── Service ─────────────────────────────────────────────────────────────────

struct Fixture {
  service: Service<SqliteStore>,
  media:   tempfile::TempDir,
  shows:   (i64, i64),
}

async fn fixture() -> Fixture {
  let s = store().await;
  let shows = seed(&s).await;
  let media = tempfile::tempdir().unwrap();
  let service = Service::new(
    Arc::new(s),
    MediaRoot::new(media.path(), DEFAULT_MAX_IMAGE_BYTES),
    BadgePolicy::default(),
  );
  Fixture { service, media, shows }
}

fn note_form(title: &str, text: &str, rating: Option<&str>) -> NoteForm {
  NoteForm {
    title: Some(title.into()),
    text: Some(text.into()),
    rating_out_of_five: rating.map(Into::into),
    image: None,
  }
}

fn png(name: &str) -> ImageUpload {
  ImageUpload { file_name: name.into(), bytes: Bytes::from_static(TINY_PNG) }
}

fn rating_form(raw: &str) -> RatingForm {
  RatingForm { rating_out_of_five: Some(raw.into()) }
}

#[tokio::test]
async fn out_of_range_ratings_are_rejected() {
  let f = fixture().await;
  let (show, _) = f.shows;
  let store = f.service.store();
  let mut users = Vec::new();
  for name in ["u0", "u1", "u2", "u3", "u4", "u5"] {
    users.push(user(store, name).await);
  }

  for (who, raw) in users.iter().zip(["0", "6", "abc", "   "]) {
    let err = f.service.submit_rating(who, show, &rating_form(raw)).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "{raw:?} gave {err:?}");
  }
  assert_eq!(store.rating_summary(show).await.unwrap().count, 0);

  for (who, raw) in users[4..].iter().zip(["1", "5"]) {
    let r = f.service.submit_rating(who, show, &rating_form(raw)).await.unwrap();
    assert_eq!(r.rating_out_of_five.to_string(), raw);
  }
  assert_eq!(store.rating_summary(show).await.unwrap().count, 2);
}

#[tokio::test]
async fn duplicate_rating_is_an_integrity_error() {
  let f = fixture().await;
  let (show, _) = f.shows;
  let alice = user(f.service.store(), "alice").await;

  f.service.submit_rating(&alice, show, &rating_form("3")).await.unwrap();
  let err = f.service.submit_rating(&alice, show, &rating_form("5")).await.unwrap_err();
  assert!(matches!(err, Error::Integrity(_)));

  let kept = f.service.store().get_rating(alice.user_id, show).await.unwrap().unwrap();
  assert_eq!(kept.rating_out_of_five.get(), 3);
}

#[tokio::test]
async fn unknown_show_wins_over_bad_input() {
  let f = fixture().await;
  let alice = user(f.service.store(), "alice").await;
  let err = f.service.submit_rating(&alice, 404, &rating_form("9")).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(Resource::Show, 404)));

  let err = f.service.create_note(&alice, 404, note_form("", "", None)).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(Resource::Show, 404)));
}

#[tokio::test]
async fn already_rated_is_per_viewer() {
  let f = fixture().await;
  let (show, _) = f.shows;
  let alice = user(f.service.store(), "alice").await;
  let bob = user(f.service.store(), "bob").await;

  f.service.submit_rating(&alice, show, &rating_form("4")).await.unwrap();

  let page = Page::default();
  assert!(f.service.show_detail(show, Some(&alice), page).await.unwrap().already_rated);
  assert!(!f.service.show_detail(show, Some(&bob), page).await.unwrap().already_rated);
  let anon = f.service.show_detail(show, None, page).await.unwrap();
  assert!(!anon.already_rated);
  assert_eq!(anon.ratings.count, 1);
}

#[tokio::test]
async fn create_note_for_show_two() {
  let f = fixture().await;
  let (_, two) = f.shows;
  let alice = user(f.service.store(), "alice").await;
  let before = f.service.store().count_notes(alice.user_id).await.unwrap();

  let receipt = f
    .service
    .create_note(&alice, two, note_form("blah blah", "ok", None))
    .await
    .unwrap();

  assert_eq!(f.service.store().count_notes(alice.user_id).await.unwrap(), before + 1);
  assert_eq!(receipt.note.title, "blah blah");
  assert_eq!(receipt.rating, RatingOutcome::NotSubmitted);
  assert_eq!(receipt.badges_awarded.len(), 1);

  let profile = f.service.user_profile(alice.user_id, Page::default()).await.unwrap();
  assert_eq!(profile.notes.len(), 1);
  assert_eq!(profile.badges.len(), 1);
}

#[tokio::test]
async fn invalid_rating_fails_the_whole_note() {
  let f = fixture().await;
  let (show, _) = f.shows;
  let alice = user(f.service.store(), "alice").await;

  let err = f
    .service
    .create_note(&alice, show, note_form("title", "text", Some("seven")))
    .await
    .unwrap_err();
  let Error::Validation(fields) = err else { panic!("expected validation error") };
  assert!(fields.has("rating_out_of_five"));
  assert_eq!(f.service.store().count_notes(alice.user_id).await.unwrap(), 0);

  // Blank is simply omitted.
  let receipt = f
    .service
    .create_note(&alice, show, note_form("title", "text", Some("")))
    .await
    .unwrap();
  assert_eq!(receipt.rating, RatingOutcome::NotSubmitted);
}

#[tokio::test]
async fn note_rating_saved_then_already_rated() {
  let f = fixture().await;
  let (show, _) = f.shows;
  let alice = user(f.service.store(), "alice").await;

  let first = f
    .service
    .create_note(&alice, show, note_form("one", "text", Some("4")))
    .await
    .unwrap();
  assert!(matches!(first.rating, RatingOutcome::Saved { .. }));

  let second = f
    .service
    .create_note(&alice, show, note_form("two", "text", Some("1")))
    .await
    .unwrap();
  assert!(matches!(second.rating, RatingOutcome::AlreadyRated { .. }));
  assert_eq!(f.service.store().count_notes(alice.user_id).await.unwrap(), 2);
}

#[tokio::test]
async fn deleting_a_note_removes_its_image() {
  let f = fixture().await;
  let (show, _) = f.shows;
  let alice = user(f.service.store(), "alice").await;

  let mut form = note_form("with pic", "text", None);
  form.image = Some(png("poster.png"));
  let receipt = f.service.create_note(&alice, show, form).await.unwrap();
  let image = receipt.note.image.clone().unwrap();
  let on_disk = f.media.path().join(&image.path);
  assert!(on_disk.exists());

  let (fetched, bytes) = f.service.note_image(receipt.note.note_id).await.unwrap();
  assert_eq!(fetched, image);
  assert_eq!(bytes.as_ref(), TINY_PNG);

  f.service.delete_note(&alice, receipt.note.note_id).await.unwrap();
  assert!(!on_disk.exists());
  assert!(f.service.store().get_note(receipt.note.note_id).await.unwrap().is_none());
}

#[tokio::test]
async fn strangers_cannot_touch_a_note() {
  let f = fixture().await;
  let (show, _) = f.shows;
  let alice = user(f.service.store(), "alice").await;
  let mallory = user(f.service.store(), "mallory").await;

  let mut form = note_form("mine", "text", None);
  form.image = Some(png("mine.png"));
  let receipt = f.service.create_note(&alice, show, form).await.unwrap();
  let id = receipt.note.note_id;
  let on_disk = f.media.path().join(&receipt.note.image.as_ref().unwrap().path);

  let mut edit = note_form("theirs", "text", None);
  edit.image = Some(png("theirs.png"));
  assert!(matches!(f.service.edit_note(&mallory, id, edit).await, Err(Error::Forbidden)));
  assert!(matches!(f.service.delete_note(&mallory, id).await, Err(Error::Forbidden)));

  let unchanged = f.service.store().get_note(id).await.unwrap().unwrap();
  assert_eq!(unchanged, receipt.note);
  assert!(on_disk.exists());
  // No file was written for the refused edit.
  let dir = f.media.path().join(format!("user_images/{}", mallory.user_id));
  assert!(!dir.exists());
}

#[tokio::test]
async fn replacing_an_image_removes_the_old_file() {
  let f = fixture().await;
  let (show, _) = f.shows;
  let alice = user(f.service.store(), "alice").await;

  let mut form = note_form("pic", "text", None);
  form.image = Some(png("a.png"));
  let receipt = f.service.create_note(&alice, show, form).await.unwrap();
  let old = f.media.path().join(&receipt.note.image.as_ref().unwrap().path);

  let kept = f
    .service
    .edit_note(&alice, receipt.note.note_id, note_form("pic", "no new image", None))
    .await
    .unwrap();
  assert_eq!(kept.image, receipt.note.image);
  assert!(old.exists());

  let mut edit = note_form("pic", "new image", None);
  edit.image = Some(png("b.png"));
  let edited = f.service.edit_note(&alice, receipt.note.note_id, edit).await.unwrap();
  let new_image = edited.image.unwrap();
  assert_eq!(new_image.original_name, "b.png");
  assert!(!old.exists());
  assert!(f.media.path().join(&new_image.path).exists());
}

#[tokio::test]
async fn register_then_authenticate() {
  let f = fixture().await;
  let form = RegistrationForm {
    username:   Some("concertgoer".into()),
    email:      Some("cg@example.com".into()),
    first_name: Some("Casey".into()),
    last_name:  Some("Jones".into()),
    password1:  Some("feRpj4w4pso3az".into()),
    password2:  Some("feRpj4w4pso3az".into()),
  };
  let user = f.service.register(form.clone()).await.unwrap();
  assert_eq!(user.username, "concertgoer");

  let id = f.service.authenticate("concertgoer", "feRpj4w4pso3az").await.unwrap();
  assert_eq!(id.user_id, user.user_id);
  assert!(matches!(
    f.service.authenticate("concertgoer", "wrong").await,
    Err(Error::Unauthorized)
  ));
  assert!(matches!(f.service.authenticate("ghost", "x").await, Err(Error::Unauthorized)));

  assert!(matches!(f.service.register(form).await, Err(Error::Integrity(_))));
}

// ─── Failed writes ───────────────────────────────────────────────────────────

mod failed_writes {
  use std::path::Path;

  use lmn_core::{
    badge::AwardedBadge,
    catalog::{Artist, ShowListing, Venue},
    note::Note,
    rating::{RatingSummary, ShowRating},
    user::{Credentials, User},
  };

  use super::*;
  use crate::{Error as StoreError, Result as StoreResult};

  #[derive(Debug, Clone, Copy)]
  enum Failure {
    /// The transaction errors out.
    Error,
    /// The show or note is gone by the time the write runs.
    Vanished,
    /// The note changed hands by the time the write runs.
    Reassigned,
  }

  /// Delegates to [`SqliteStore`] except for note inserts and updates, which
  /// fail as `failure` says.
  struct RefusingStore {
    inner:   SqliteStore,
    failure: Failure,
  }

  fn refused() -> StoreError {
    StoreError::Corrupt { table: "notes", message: "write refused".into() }
  }

  impl LmnStore for RefusingStore {
    type Error = StoreError;

    async fn create_user(&self, input: NewUser) -> StoreResult<UserInsert> {
      self.inner.create_user(input).await
    }

    async fn get_user(&self, user_id: i64) -> StoreResult<Option<User>> {
      self.inner.get_user(user_id).await
    }

    async fn get_credentials(&self, username: &str) -> StoreResult<Option<Credentials>> {
      self.inner.get_credentials(username).await
    }

    async fn add_venue(&self, input: NewVenue) -> StoreResult<Venue> {
      self.inner.add_venue(input).await
    }

    async fn add_artist(&self, input: NewArtist) -> StoreResult<Artist> {
      self.inner.add_artist(input).await
    }

    async fn add_show(&self, input: NewShow) -> StoreResult<Option<ShowListing>> {
      self.inner.add_show(input).await
    }

    async fn get_venue(&self, venue_id: i64) -> StoreResult<Option<Venue>> {
      self.inner.get_venue(venue_id).await
    }

    async fn list_venues(&self, query: &NameQuery) -> StoreResult<Vec<Venue>> {
      self.inner.list_venues(query).await
    }

    async fn get_artist(&self, artist_id: i64) -> StoreResult<Option<Artist>> {
      self.inner.get_artist(artist_id).await
    }

    async fn list_artists(&self, query: &NameQuery) -> StoreResult<Vec<Artist>> {
      self.inner.list_artists(query).await
    }

    async fn get_show(&self, show_id: i64) -> StoreResult<Option<ShowListing>> {
      self.inner.get_show(show_id).await
    }

    async fn list_shows(&self, query: &ShowQuery) -> StoreResult<Vec<ShowListing>> {
      self.inner.list_shows(query).await
    }

    async fn record_note(
      &self,
      _input: NewNote,
      _badges: &BadgePolicy,
    ) -> StoreResult<NoteInsert> {
      match self.failure {
        Failure::Error => Err(refused()),
        Failure::Vanished | Failure::Reassigned => Ok(NoteInsert::ShowNotFound),
      }
    }

    async fn get_note(&self, note_id: i64) -> StoreResult<Option<Note>> {
      self.inner.get_note(note_id).await
    }

    async fn list_notes(&self, query: &NoteQuery) -> StoreResult<Vec<Note>> {
      self.inner.list_notes(query).await
    }

    async fn count_notes(&self, user_id: i64) -> StoreResult<u64> {
      self.inner.count_notes(user_id).await
    }

    async fn update_note(
      &self,
      _note_id: i64,
      _owner: i64,
      _patch: NotePatch,
    ) -> StoreResult<NoteUpdate> {
      match self.failure {
        Failure::Error => Err(refused()),
        Failure::Vanished => Ok(NoteUpdate::NotFound),
        Failure::Reassigned => Ok(NoteUpdate::NotOwner),
      }
    }

    async fn delete_note(&self, note_id: i64, owner: i64) -> StoreResult<NoteDeletion> {
      self.inner.delete_note(note_id, owner).await
    }

    async fn insert_rating(&self, input: NewRating) -> StoreResult<RatingInsert> {
      self.inner.insert_rating(input).await
    }

    async fn get_rating(&self, user_id: i64, show_id: i64) -> StoreResult<Option<ShowRating>> {
      self.inner.get_rating(user_id, show_id).await
    }

    async fn list_ratings(&self, show_id: i64) -> StoreResult<Vec<ShowRating>> {
      self.inner.list_ratings(show_id).await
    }

    async fn rating_summary(&self, show_id: i64) -> StoreResult<RatingSummary> {
      self.inner.rating_summary(show_id).await
    }

    async fn list_badges(&self, user_id: i64) -> StoreResult<Vec<AwardedBadge>> {
      self.inner.list_badges(user_id).await
    }
  }

  struct Refusing {
    service: Service<RefusingStore>,
    media:   tempfile::TempDir,
    alice:   Identity,
    show:    i64,
    note_id: i64,
  }

  async fn refusing(failure: Failure) -> Refusing {
    let inner = store().await;
    let (show, _) = seed(&inner).await;
    let alice = user(&inner, "alice").await;
    let NoteInsert::Recorded(existing) = inner
      .record_note(note(show, alice.user_id, "existing"), &BadgePolicy::default())
      .await
      .unwrap()
    else {
      panic!("show exists");
    };

    let media = tempfile::tempdir().unwrap();
    let service = Service::new(
      Arc::new(RefusingStore { inner, failure }),
      MediaRoot::new(media.path(), DEFAULT_MAX_IMAGE_BYTES),
      BadgePolicy::default(),
    );
    Refusing { service, media, alice, show, note_id: existing.note.note_id }
  }

  /// Files left in the user's upload directory.
  fn uploads(media: &Path, user: &Identity) -> usize {
    std::fs::read_dir(media.join(format!("user_images/{}", user.user_id)))
      .map(|dir| dir.count())
      .unwrap_or(0)
  }

  #[tokio::test]
  async fn failed_note_insert_removes_the_new_image() {
    for failure in [Failure::Error, Failure::Vanished] {
      let r = refusing(failure).await;
      let mut form = note_form("poster", "text", Some("4"));
      form.image = Some(png("poster.png"));

      let result = r.service.create_note(&r.alice, r.show, form).await;
      match failure {
        Failure::Error => assert!(matches!(result, Err(Error::Store(_))), "{result:?}"),
        _ => assert!(
          matches!(result, Err(Error::NotFound(Resource::Show, _))),
          "{result:?}"
        ),
      }
      // The image was written before the insert, so its directory exists.
      assert!(r.media.path().join(format!("user_images/{}", r.alice.user_id)).is_dir());
      assert_eq!(uploads(r.media.path(), &r.alice), 0, "{failure:?}");
    }
  }

  #[tokio::test]
  async fn failed_note_update_removes_the_new_image() {
    for failure in [Failure::Error, Failure::Vanished, Failure::Reassigned] {
      let r = refusing(failure).await;
      let mut form = note_form("edited", "text", None);
      form.image = Some(png("replacement.png"));

      let result = r.service.edit_note(&r.alice, r.note_id, form).await;
      match failure {
        Failure::Error => assert!(matches!(result, Err(Error::Store(_))), "{result:?}"),
        Failure::Vanished => assert!(
          matches!(result, Err(Error::NotFound(Resource::Note, _))),
          "{result:?}"
        ),
        Failure::Reassigned => assert!(matches!(result, Err(Error::Forbidden)), "{result:?}"),
      }
      assert!(r.media.path().join(format!("user_images/{}", r.alice.user_id)).is_dir());
      assert_eq!(uploads(r.media.path(), &r.alice), 0, "{failure:?}");

      let unchanged = r.service.store().get_note(r.note_id).await.unwrap().unwrap();
      assert_eq!(unchanged.title, "existing");
      assert!(unchanged.image.is_none());
    }
  }
}
