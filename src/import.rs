//! Merge-on-import of movie and TV show batches.
//!
//! Each entry is matched on its natural key and either updates the existing
//! row or creates a new one. An entry that fails is rolled back to its own
//! savepoint and reported; the rest of the batch carries on. The batch as a
//! whole commits once, and a failed commit discards everything.

use rusqlite::{Connection, Transaction};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::db::{movies, tv_shows, Database};
use crate::error::{Error, Result};
use crate::models::{MediaKind, MovieImport, TvShowImport};

/// Body of an import request; the shape produced by an export.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ImportDocument {
    #[serde(default)]
    pub movies: Vec<MovieImport>,
    #[serde(default)]
    pub tv_shows: Vec<TvShowImport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merged {
    Created,
    Updated,
}

/// Result of importing one batch of a single kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub created: usize,
    pub updated: usize,
    pub errors: Vec<String>,
}

impl BatchOutcome {
    fn failed(message: String) -> Self {
        Self {
            errors: vec![message],
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub movies_created: usize,
    pub movies_updated: usize,
    pub tv_shows_created: usize,
    pub tv_shows_updated: usize,
    pub errors: Vec<String>,
}

impl ImportSummary {
    fn failed(message: String) -> Self {
        Self {
            errors: vec![message],
            ..Self::default()
        }
    }
}

/// An import entry that knows how to merge itself into the store.
pub trait ImportItem {
    const KIND: MediaKind;

    fn title(&self) -> &str;

    fn merge(&self, conn: &Connection) -> Result<Merged>;
}

impl ImportItem for MovieImport {
    const KIND: MediaKind = MediaKind::Movie;

    fn title(&self) -> &str {
        &self.title
    }

    fn merge(&self, conn: &Connection) -> Result<Merged> {
        self.validate()?;
        match movies::find_by_key(conn, &self.title, &self.director)? {
            Some(existing) => {
                movies::update(conn, existing.id, self.to_patch())?;
                Ok(Merged::Updated)
            }
            None => {
                movies::insert(conn, self.to_new()?)?;
                Ok(Merged::Created)
            }
        }
    }
}

impl ImportItem for TvShowImport {
    const KIND: MediaKind = MediaKind::TvShow;

    fn title(&self) -> &str {
        &self.title
    }

    fn merge(&self, conn: &Connection) -> Result<Merged> {
        self.validate()?;
        match tv_shows::find_by_key(conn, &self.title, self.year)? {
            Some(existing) => {
                tv_shows::update(conn, existing.id, self.to_patch())?;
                Ok(Merged::Updated)
            }
            None => {
                tv_shows::insert(conn, self.to_new())?;
                Ok(Merged::Created)
            }
        }
    }
}

/// Merges `items` in order inside `tx`, isolating each one in a savepoint.
/// Only store-level failures (savepoint bookkeeping) are returned as `Err`.
fn merge_batch<T: ImportItem>(tx: &mut Transaction<'_>, items: &[T]) -> Result<BatchOutcome> {
    let mut outcome = BatchOutcome::default();
    for item in items {
        let sp = tx.savepoint()?;
        match item.merge(&sp) {
            Ok(merged) => {
                sp.commit()?;
                match merged {
                    Merged::Created => outcome.created += 1,
                    Merged::Updated => outcome.updated += 1,
                }
            }
            Err(e) => {
                // dropping the savepoint rolls the entry back
                drop(sp);
                warn!("Skipping {} '{}': {}", T::KIND.label(), item.title(), e);
                outcome.errors.push(format!(
                    "Failed to import {} '{}': {}",
                    T::KIND.label(),
                    item.title(),
                    e
                ));
            }
        }
    }
    Ok(outcome)
}

fn commit_failure(e: &Error) -> String {
    warn!("Import rolled back: {}", e);
    format!("Import failed, all changes were rolled back: {e}")
}

impl Database {
    /// Imports one batch of a single kind as its own transaction.
    pub fn import_batch<T: ImportItem>(&mut self, items: &[T]) -> BatchOutcome {
        match self.try_import_batch(items) {
            Ok(outcome) => {
                info!(
                    "Imported {} batch: {} created, {} updated, {} failed",
                    T::KIND.label(),
                    outcome.created,
                    outcome.updated,
                    outcome.errors.len()
                );
                outcome
            }
            Err(e) => BatchOutcome::failed(commit_failure(&e)),
        }
    }

    /// Imports movies then TV shows under a single transaction.
    pub fn import_document(&mut self, document: &ImportDocument) -> ImportSummary {
        match self.try_import_document(document) {
            Ok(summary) => {
                info!(
                    "Import finished: movies {}+{}, TV shows {}+{}, {} errors",
                    summary.movies_created,
                    summary.movies_updated,
                    summary.tv_shows_created,
                    summary.tv_shows_updated,
                    summary.errors.len()
                );
                summary
            }
            Err(e) => ImportSummary::failed(commit_failure(&e)),
        }
    }

    fn try_import_batch<T: ImportItem>(&mut self, items: &[T]) -> Result<BatchOutcome> {
        let mut tx = self.transaction()?;
        let outcome = merge_batch(&mut tx, items)?;
        tx.commit()?;
        Ok(outcome)
    }

    fn try_import_document(&mut self, document: &ImportDocument) -> Result<ImportSummary> {
        let mut tx = self.transaction()?;
        let movie_outcome = merge_batch(&mut tx, &document.movies)?;
        let show_outcome = merge_batch(&mut tx, &document.tv_shows)?;
        tx.commit()?;

        let mut errors = movie_outcome.errors;
        errors.extend(show_outcome.errors);
        Ok(ImportSummary {
            movies_created: movie_outcome.created,
            movies_updated: movie_outcome.updated,
            tv_shows_created: show_outcome.created,
            tv_shows_updated: show_outcome.updated,
            errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewMovie;
    use crate::query::ListQuery;
    use serde_json::json;

    fn movie_item(value: serde_json::Value) -> MovieImport {
        serde_json::from_value(value).unwrap()
    }

    fn show_item(value: serde_json::Value) -> TvShowImport {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let mut db = Database::open_in_memory().unwrap();
        let outcome = db.import_batch::<MovieImport>(&[]);
        assert_eq!(outcome, BatchOutcome::default());
        let summary = db.import_document(&ImportDocument::default());
        assert_eq!(summary, ImportSummary::default());
    }

    #[test]
    fn matching_movie_is_updated_not_created() {
        let mut db = Database::open_in_memory().unwrap();
        let existing = db
            .insert_movie(NewMovie {
                title: "Heat".to_string(),
                director: "Michael Mann".to_string(),
                year: 1995,
                rating: None,
                watched: false,
                review: Some("keep me".to_string()),
                poster_url: None,
            })
            .unwrap();

        let outcome = db.import_batch(&[
            movie_item(json!({ "title": "Heat", "director": "Michael Mann", "rating": 9, "watched": true })),
            movie_item(json!({ "title": "Heat", "director": "Someone Else", "year": 1986 })),
        ]);
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.created, 1);
        assert!(outcome.errors.is_empty());

        let merged = db.get_movie(existing.id).unwrap().unwrap();
        assert_eq!(merged.rating, Some(9.0));
        assert!(merged.watched);
        assert_eq!(merged.year, 1995);
        assert_eq!(merged.review.as_deref(), Some("keep me"));

        let other = db.find_movie("Heat", "Someone Else").unwrap().unwrap();
        assert_ne!(other.id, existing.id);
        assert!(!other.watched);
    }

    #[test]
    fn bad_entry_is_reported_and_batch_continues() {
        let mut db = Database::open_in_memory().unwrap();
        let outcome = db.import_batch(&[
            movie_item(json!({ "title": "Alien", "director": "Ridley Scott", "year": 1979 })),
            movie_item(json!({ "title": "Broken", "director": "Nobody", "year": 2000, "rating": 42 })),
            movie_item(json!({ "title": "Aliens", "director": "James Cameron", "year": 1986 })),
        ]);
        assert_eq!(outcome.created, 2);
        assert_eq!(outcome.updated, 0);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("Broken"));
        assert_eq!(db.list_movies(&ListQuery::default()).unwrap().len(), 2);
    }

    #[test]
    fn new_movie_without_year_is_an_entry_error() {
        let mut db = Database::open_in_memory().unwrap();
        let outcome =
            db.import_batch(&[movie_item(json!({ "title": "Heat", "director": "Michael Mann" }))]);
        assert_eq!(outcome.created, 0);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("year is required"));
    }

    #[test]
    fn tv_shows_match_on_title_and_year() {
        let mut db = Database::open_in_memory().unwrap();
        let first = db.import_batch(&[show_item(
            json!({ "title": "Dark", "year": 2017, "seasons": 1, "rating": 8 }),
        )]);
        assert_eq!(first.created, 1);

        let second = db.import_batch(&[
            show_item(json!({ "title": "Dark", "year": 2017, "seasons": 3, "rating": null })),
            show_item(json!({ "title": "Dark", "year": 2019 })),
        ]);
        assert_eq!(second.updated, 1);
        assert_eq!(second.created, 1);

        let dark = db.find_tv_show("Dark", 2017).unwrap().unwrap();
        assert_eq!(dark.seasons, Some(3));
        assert_eq!(dark.rating, None);
    }

    #[test]
    fn document_import_counts_both_kinds() {
        let mut db = Database::open_in_memory().unwrap();
        let document: ImportDocument = serde_json::from_value(json!({
            "exported_at": "2024-01-01T00:00:00Z",
            "version": "1.0",
            "movies": [
                { "id": 99, "title": "Heat", "director": "Michael Mann", "year": 1995 }
            ],
            "tv_shows": [
                { "title": "Dark", "year": 2017 },
                { "title": "", "year": 2017 }
            ]
        }))
        .unwrap();
        let summary = db.import_document(&document);
        assert_eq!(summary.movies_created, 1);
        assert_eq!(summary.tv_shows_created, 1);
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].contains("TV show"));
    }

    #[test]
    fn failed_commit_rolls_back_everything() {
        let mut db = Database::open_in_memory().unwrap();
        // Every movie insert leaves a dangling deferred reference, so the
        // final COMMIT fails even though each entry merged cleanly.
        db.conn()
            .execute_batch(
                "CREATE TABLE owners (id INTEGER PRIMARY KEY);
                 CREATE TABLE dangling (
                     owner_id INTEGER REFERENCES owners(id) DEFERRABLE INITIALLY DEFERRED
                 );
                 CREATE TRIGGER movies_dangling AFTER INSERT ON movies
                 BEGIN
                     INSERT INTO dangling (owner_id) VALUES (NEW.id + 1000);
                 END;",
            )
            .unwrap();

        let outcome = db.import_batch(&[
            movie_item(json!({ "title": "Alien", "director": "Ridley Scott", "year": 1979 })),
            movie_item(json!({ "title": "Broken", "director": "Nobody", "year": -1 })),
        ]);
        assert_eq!(outcome.created, 0);
        assert_eq!(outcome.updated, 0);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("rolled back"));
        assert!(db.list_movies(&ListQuery::default()).unwrap().is_empty());
    }
}
