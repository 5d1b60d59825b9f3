use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::error::Result;
use crate::models::{NewTvShow, TvShow, TvShowPatch};
use crate::query::ListQuery;

const COLUMNS: &str =
    "id, title, year, seasons, episodes, rating, watched, review, poster_url";

fn row_to_tv_show(row: &Row) -> rusqlite::Result<TvShow> {
    Ok(TvShow {
        id: row.get(0)?,
        title: row.get(1)?,
        year: row.get(2)?,
        seasons: row.get(3)?,
        episodes: row.get(4)?,
        rating: row.get(5)?,
        watched: row.get(6)?,
        review: row.get(7)?,
        poster_url: row.get(8)?,
    })
}

pub(crate) fn list(conn: &Connection, query: &ListQuery) -> Result<Vec<TvShow>> {
    let (sql, pattern) = query.to_sql("tv_shows", COLUMNS, &["title"]);
    let mut stmt = conn.prepare(&sql)?;
    let shows = stmt
        .query_map(params_from_iter(pattern.iter()), row_to_tv_show)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(shows)
}

pub(crate) fn get(conn: &Connection, id: i64) -> Result<Option<TvShow>> {
    let show = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM tv_shows WHERE id = ?1"),
            [id],
            row_to_tv_show,
        )
        .optional()?;
    Ok(show)
}

pub(crate) fn find_by_key(conn: &Connection, title: &str, year: i32) -> Result<Option<TvShow>> {
    let show = conn
        .query_row(
            &format!(
                "SELECT {COLUMNS} FROM tv_shows WHERE title = ?1 AND year = ?2 ORDER BY id LIMIT 1"
            ),
            params![title, year],
            row_to_tv_show,
        )
        .optional()?;
    Ok(show)
}

pub(crate) fn insert(conn: &Connection, new: NewTvShow) -> Result<TvShow> {
    conn.execute(
        "INSERT INTO tv_shows (title, year, seasons, episodes, rating, watched, review, poster_url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            new.title,
            new.year,
            new.seasons,
            new.episodes,
            new.rating,
            new.watched,
            new.review,
            new.poster_url,
        ],
    )?;
    Ok(new.into_tv_show(conn.last_insert_rowid()))
}

pub(crate) fn update(conn: &Connection, id: i64, patch: TvShowPatch) -> Result<Option<TvShow>> {
    let Some(existing) = get(conn, id)? else {
        return Ok(None);
    };
    let show = existing.patched(patch);
    conn.execute(
        "UPDATE tv_shows SET
            title = ?2, year = ?3, seasons = ?4, episodes = ?5, rating = ?6,
            watched = ?7, review = ?8, poster_url = ?9
         WHERE id = ?1",
        params![
            show.id,
            show.title,
            show.year,
            show.seasons,
            show.episodes,
            show.rating,
            show.watched,
            show.review,
            show.poster_url,
        ],
    )?;
    Ok(Some(show))
}

pub(crate) fn delete(conn: &Connection, id: i64) -> Result<Option<TvShow>> {
    let Some(existing) = get(conn, id)? else {
        return Ok(None);
    };
    conn.execute("DELETE FROM tv_shows WHERE id = ?1", [id])?;
    Ok(Some(existing))
}
