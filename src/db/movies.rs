use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::error::Result;
use crate::models::{Movie, MoviePatch, NewMovie};
use crate::query::ListQuery;

const COLUMNS: &str = "id, title, director, year, rating, watched, review, poster_url";

fn row_to_movie(row: &Row) -> rusqlite::Result<Movie> {
    Ok(Movie {
        id: row.get(0)?,
        title: row.get(1)?,
        director: row.get(2)?,
        year: row.get(3)?,
        rating: row.get(4)?,
        watched: row.get(5)?,
        review: row.get(6)?,
        poster_url: row.get(7)?,
    })
}

pub(crate) fn list(conn: &Connection, query: &ListQuery) -> Result<Vec<Movie>> {
    let (sql, pattern) = query.to_sql("movies", COLUMNS, &["title", "director"]);
    let mut stmt = conn.prepare(&sql)?;
    let movies = stmt
        .query_map(params_from_iter(pattern.iter()), row_to_movie)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(movies)
}

pub(crate) fn get(conn: &Connection, id: i64) -> Result<Option<Movie>> {
    let movie = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM movies WHERE id = ?1"),
            [id],
            row_to_movie,
        )
        .optional()?;
    Ok(movie)
}

pub(crate) fn find_by_key(conn: &Connection, title: &str, director: &str) -> Result<Option<Movie>> {
    let movie = conn
        .query_row(
            &format!(
                "SELECT {COLUMNS} FROM movies WHERE title = ?1 AND director = ?2 ORDER BY id LIMIT 1"
            ),
            params![title, director],
            row_to_movie,
        )
        .optional()?;
    Ok(movie)
}

pub(crate) fn insert(conn: &Connection, new: NewMovie) -> Result<Movie> {
    conn.execute(
        "INSERT INTO movies (title, director, year, rating, watched, review, poster_url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            new.title,
            new.director,
            new.year,
            new.rating,
            new.watched,
            new.review,
            new.poster_url,
        ],
    )?;
    Ok(new.into_movie(conn.last_insert_rowid()))
}

pub(crate) fn update(conn: &Connection, id: i64, patch: MoviePatch) -> Result<Option<Movie>> {
    let Some(existing) = get(conn, id)? else {
        return Ok(None);
    };
    let movie = existing.patched(patch);
    conn.execute(
        "UPDATE movies SET
            title = ?2, director = ?3, year = ?4, rating = ?5,
            watched = ?6, review = ?7, poster_url = ?8
         WHERE id = ?1",
        params![
            movie.id,
            movie.title,
            movie.director,
            movie.year,
            movie.rating,
            movie.watched,
            movie.review,
            movie.poster_url,
        ],
    )?;
    Ok(Some(movie))
}

pub(crate) fn delete(conn: &Connection, id: i64) -> Result<Option<Movie>> {
    let Some(existing) = get(conn, id)? else {
        return Ok(None);
    };
    conn.execute("DELETE FROM movies WHERE id = ?1", [id])?;
    Ok(Some(existing))
}
