use rusqlite::{Connection, Transaction};
use std::path::Path;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{Movie, MoviePatch, NewMovie, NewTvShow, TvShow, TvShowPatch};
use crate::query::ListQuery;

mod migrations;
pub(crate) mod movies;
pub(crate) mod tv_shows;

use migrations::MIGRATIONS;

/// Every record of both kinds, in id order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    pub movies: Vec<Movie>,
    pub tv_shows: Vec<TvShow>,
}

/// SQLite-backed record store for movies and TV shows.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database file and bring its schema up to date.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        info!(
            "Opened database at {} (journal mode {})",
            path.as_ref().display(),
            mode
        );
        Self::init(conn)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let mut db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Underlying connection, for ad-hoc queries.
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    /// Highest applied migration version, 0 for a fresh file.
    pub fn schema_version(&self) -> Result<u32> {
        let version: Option<u32> =
            self.conn
                .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                    row.get(0)
                })?;
        Ok(version.unwrap_or(0))
    }

    fn apply_migrations(&mut self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let applied = self.schema_version()?;
        for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
            info!(
                "Applying migration {} ({})",
                migration.version, migration.name
            );
            let tx = self.conn.transaction()?;
            tx.execute_batch(migration.sql)?;
            tx.execute(
                "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                rusqlite::params![migration.version, migration.name],
            )?;
            tx.commit()?;
        }
        Ok(())
    }

    pub fn collection(&self) -> Result<Collection> {
        let all = ListQuery::default();
        Ok(Collection {
            movies: movies::list(&self.conn, &all)?,
            tv_shows: tv_shows::list(&self.conn, &all)?,
        })
    }
}

// Movies
impl Database {
    pub fn list_movies(&self, query: &ListQuery) -> Result<Vec<Movie>> {
        let found = movies::list(&self.conn, query)?;
        debug!(query = ?query, count = found.len(), "Listed movies");
        Ok(found)
    }

    pub fn get_movie(&self, id: i64) -> Result<Option<Movie>> {
        movies::get(&self.conn, id)
    }

    /// Looks a movie up by its natural key (title, director).
    pub fn find_movie(&self, title: &str, director: &str) -> Result<Option<Movie>> {
        movies::find_by_key(&self.conn, title, director)
    }

    pub fn insert_movie(&self, new: NewMovie) -> Result<Movie> {
        let movie = movies::insert(&self.conn, new)?;
        info!("Created movie {} '{}'", movie.id, movie.title);
        Ok(movie)
    }

    pub fn update_movie(&mut self, id: i64, patch: MoviePatch) -> Result<Option<Movie>> {
        let tx = self.conn.transaction()?;
        let updated = movies::update(&tx, id, patch)?;
        tx.commit()?;
        match &updated {
            Some(movie) => info!("Updated movie {} '{}'", movie.id, movie.title),
            None => debug!("Update skipped, no movie with id {}", id),
        }
        Ok(updated)
    }

    pub fn delete_movie(&mut self, id: i64) -> Result<Option<Movie>> {
        let tx = self.conn.transaction()?;
        let removed = movies::delete(&tx, id)?;
        tx.commit()?;
        if let Some(movie) = &removed {
            info!("Deleted movie {} '{}'", movie.id, movie.title);
        }
        Ok(removed)
    }
}

// TV shows
impl Database {
    pub fn list_tv_shows(&self, query: &ListQuery) -> Result<Vec<TvShow>> {
        let found = tv_shows::list(&self.conn, query)?;
        debug!(query = ?query, count = found.len(), "Listed TV shows");
        Ok(found)
    }

    pub fn get_tv_show(&self, id: i64) -> Result<Option<TvShow>> {
        tv_shows::get(&self.conn, id)
    }

    /// Looks a show up by its natural key (title, year).
    pub fn find_tv_show(&self, title: &str, year: i32) -> Result<Option<TvShow>> {
        tv_shows::find_by_key(&self.conn, title, year)
    }

    pub fn insert_tv_show(&self, new: NewTvShow) -> Result<TvShow> {
        let show = tv_shows::insert(&self.conn, new)?;
        info!("Created TV show {} '{}'", show.id, show.title);
        Ok(show)
    }

    pub fn update_tv_show(&mut self, id: i64, patch: TvShowPatch) -> Result<Option<TvShow>> {
        let tx = self.conn.transaction()?;
        let updated = tv_shows::update(&tx, id, patch)?;
        tx.commit()?;
        match &updated {
            Some(show) => info!("Updated TV show {} '{}'", show.id, show.title),
            None => debug!("Update skipped, no TV show with id {}", id),
        }
        Ok(updated)
    }

    pub fn delete_tv_show(&mut self, id: i64) -> Result<Option<TvShow>> {
        let tx = self.conn.transaction()?;
        let removed = tv_shows::delete(&tx, id)?;
        tx.commit()?;
        if let Some(show) = &removed {
            info!("Deleted TV show {} '{}'", show.id, show.title);
        }
        Ok(removed)
    }
}
