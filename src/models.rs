use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};

const MIN_RATING: f64 = 0.0;
const MAX_RATING: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    TvShow,
}

impl MediaKind {
    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::TvShow => "TV show",
        }
    }

    /// Message used when a lookup by id comes back empty.
    pub fn not_found(&self) -> &'static str {
        match self {
            MediaKind::Movie => "Movie not found",
            MediaKind::TvShow => "TV show not found",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub director: String,
    pub year: i32,
    pub rating: Option<f64>,
    pub watched: bool,
    pub review: Option<String>,
    pub poster_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TvShow {
    pub id: i64,
    pub title: String,
    pub year: i32,
    pub seasons: Option<i32>,
    pub episodes: Option<i32>,
    pub rating: Option<f64>,
    pub watched: bool,
    pub review: Option<String>,
    pub poster_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub director: String,
    pub year: i32,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub watched: bool,
    #[serde(default)]
    pub review: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct NewTvShow {
    pub title: String,
    pub year: i32,
    #[serde(default)]
    pub seasons: Option<i32>,
    #[serde(default)]
    pub episodes: Option<i32>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub watched: bool,
    #[serde(default)]
    pub review: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
}

/// Partial update for a movie. `None` leaves a field alone; for nullable
/// columns `Some(None)` clears the stored value.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct MoviePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub rating: Option<Option<f64>>,
    #[serde(default)]
    pub watched: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub review: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub poster_url: Option<Option<String>>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct TvShowPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub seasons: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub episodes: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub rating: Option<Option<f64>>,
    #[serde(default)]
    pub watched: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub review: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub poster_url: Option<Option<String>>,
}

/// One movie entry of an import document. Matched against existing rows by
/// (title, director).
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MovieImport {
    pub title: String,
    pub director: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub rating: Option<Option<f64>>,
    #[serde(default)]
    pub watched: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub review: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub poster_url: Option<Option<String>>,
}

/// One TV show entry of an import document. Matched against existing rows
/// by (title, year).
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TvShowImport {
    pub title: String,
    pub year: i32,
    #[serde(default, deserialize_with = "nullable")]
    pub seasons: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub episodes: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub rating: Option<Option<f64>>,
    #[serde(default)]
    pub watched: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub review: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub poster_url: Option<Option<String>>,
}

// A present key always yields `Some`, so an explicit `null` becomes `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn check_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn check_year(year: i32) -> Result<()> {
    if year < 0 {
        return Err(Error::validation(format!(
            "year must be greater than or equal to 0 (got {year})"
        )));
    }
    Ok(())
}

fn check_rating(rating: Option<f64>) -> Result<()> {
    match rating {
        Some(r) if !(MIN_RATING..=MAX_RATING).contains(&r) => Err(Error::validation(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING} (got {r})"
        ))),
        _ => Ok(()),
    }
}

fn check_count(field: &str, value: Option<i32>) -> Result<()> {
    match value {
        Some(v) if v < 0 => Err(Error::validation(format!(
            "{field} must be greater than or equal to 0 (got {v})"
        ))),
        _ => Ok(()),
    }
}

impl NewMovie {
    pub fn validate(&self) -> Result<()> {
        check_text("title", &self.title)?;
        check_text("director", &self.director)?;
        check_year(self.year)?;
        check_rating(self.rating)
    }

    pub fn into_movie(self, id: i64) -> Movie {
        Movie {
            id,
            title: self.title,
            director: self.director,
            year: self.year,
            rating: self.rating,
            watched: self.watched,
            review: self.review,
            poster_url: self.poster_url,
        }
    }
}

impl NewTvShow {
    pub fn validate(&self) -> Result<()> {
        check_text("title", &self.title)?;
        check_year(self.year)?;
        check_count("seasons", self.seasons)?;
        check_count("episodes", self.episodes)?;
        check_rating(self.rating)
    }

    pub fn into_tv_show(self, id: i64) -> TvShow {
        TvShow {
            id,
            title: self.title,
            year: self.year,
            seasons: self.seasons,
            episodes: self.episodes,
            rating: self.rating,
            watched: self.watched,
            review: self.review,
            poster_url: self.poster_url,
        }
    }
}

impl MoviePatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            check_text("title", title)?;
        }
        if let Some(director) = &self.director {
            check_text("director", director)?;
        }
        if let Some(year) = self.year {
            check_year(year)?;
        }
        check_rating(self.rating.flatten())
    }
}

impl TvShowPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            check_text("title", title)?;
        }
        if let Some(year) = self.year {
            check_year(year)?;
        }
        check_count("seasons", self.seasons.flatten())?;
        check_count("episodes", self.episodes.flatten())?;
        check_rating(self.rating.flatten())
    }
}

impl Movie {
    pub fn patched(mut self, patch: MoviePatch) -> Self {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(director) = patch.director {
            self.director = director;
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        if let Some(watched) = patch.watched {
            self.watched = watched;
        }
        if let Some(review) = patch.review {
            self.review = review;
        }
        if let Some(poster_url) = patch.poster_url {
            self.poster_url = poster_url;
        }
        self
    }
}

impl TvShow {
    pub fn patched(mut self, patch: TvShowPatch) -> Self {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(seasons) = patch.seasons {
            self.seasons = seasons;
        }
        if let Some(episodes) = patch.episodes {
            self.episodes = episodes;
        }
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        if let Some(watched) = patch.watched {
            self.watched = watched;
        }
        if let Some(review) = patch.review {
            self.review = review;
        }
        if let Some(poster_url) = patch.poster_url {
            self.poster_url = poster_url;
        }
        self
    }
}

impl MovieImport {
    pub fn validate(&self) -> Result<()> {
        check_text("title", &self.title)?;
        check_text("director", &self.director)?;
        if let Some(year) = self.year {
            check_year(year)?;
        }
        check_rating(self.rating.flatten())
    }

    /// The fields this entry carries, as an update to the matching row.
    pub fn to_patch(&self) -> MoviePatch {
        MoviePatch {
            title: None,
            director: None,
            year: self.year,
            rating: self.rating,
            watched: self.watched,
            review: self.review.clone(),
            poster_url: self.poster_url.clone(),
        }
    }

    pub fn to_new(&self) -> Result<NewMovie> {
        let year = self
            .year
            .ok_or_else(|| Error::validation("year is required to create a movie"))?;
        Ok(NewMovie {
            title: self.title.clone(),
            director: self.director.clone(),
            year,
            rating: self.rating.flatten(),
            watched: self.watched.unwrap_or(false),
            review: self.review.clone().flatten(),
            poster_url: self.poster_url.clone().flatten(),
        })
    }
}

impl TvShowImport {
    pub fn validate(&self) -> Result<()> {
        check_text("title", &self.title)?;
        check_year(self.year)?;
        check_count("seasons", self.seasons.flatten())?;
        check_count("episodes", self.episodes.flatten())?;
        check_rating(self.rating.flatten())
    }

    pub fn to_patch(&self) -> TvShowPatch {
        TvShowPatch {
            title: None,
            year: None,
            seasons: self.seasons,
            episodes: self.episodes,
            rating: self.rating,
            watched: self.watched,
            review: self.review.clone(),
            poster_url: self.poster_url.clone(),
        }
    }

    pub fn to_new(&self) -> NewTvShow {
        NewTvShow {
            title: self.title.clone(),
            year: self.year,
            seasons: self.seasons.flatten(),
            episodes: self.episodes.flatten(),
            rating: self.rating.flatten(),
            watched: self.watched.unwrap_or(false),
            review: self.review.clone().flatten(),
            poster_url: self.poster_url.clone().flatten(),
        }
    }
}
