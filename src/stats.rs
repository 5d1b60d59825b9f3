//! Aggregate views over the whole collection. Every view is recomputed from
//! the records passed in; nothing is cached.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::db::Collection;
use crate::models::{MediaKind, Movie, TvShow};

const RATED_LIST_LEN: usize = 5;
const DIRECTOR_LIST_LEN: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WatchCounts {
    pub total: usize,
    pub watched: usize,
    pub unwatched: usize,
}

impl WatchCounts {
    fn tally(flags: impl Iterator<Item = bool>) -> Self {
        let mut counts = Self::default();
        for watched in flags {
            counts.total += 1;
            if watched {
                counts.watched += 1;
            } else {
                counts.unwatched += 1;
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WatchStats {
    pub movies: WatchCounts,
    pub tv_shows: WatchCounts,
    pub total: WatchCounts,
    pub completion_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatedTitle {
    pub title: String,
    pub kind: MediaKind,
    pub rating: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RatingStats {
    pub rated_count: usize,
    pub average_rating: f64,
    /// Whole-number rating (1..=10) to occurrences; fractional ratings count
    /// toward the whole number below them.
    pub rating_distribution: BTreeMap<u8, usize>,
    pub highest_rated: Vec<RatedTitle>,
    pub lowest_rated: Vec<RatedTitle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecadeCounts {
    pub movies: usize,
    pub tv_shows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YearStats {
    pub movies_by_year: BTreeMap<i32, usize>,
    pub tv_shows_by_year: BTreeMap<i32, usize>,
    pub all_years: Vec<i32>,
    pub decade_stats: BTreeMap<String, DecadeCounts>,
    pub oldest_year: Option<i32>,
    pub newest_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectorCount {
    pub director: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectorRating {
    pub director: String,
    pub average_rating: f64,
    pub movie_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DirectorStats {
    pub top_directors: Vec<DirectorCount>,
    pub highest_rated_directors: Vec<DirectorRating>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub watch: WatchStats,
    pub ratings: RatingStats,
    pub years: YearStats,
    pub directors: DirectorStats,
}

impl Statistics {
    pub fn compute(collection: &Collection) -> Self {
        Self {
            watch: watch_stats(&collection.movies, &collection.tv_shows),
            ratings: rating_stats(&collection.movies, &collection.tv_shows),
            years: year_stats(&collection.movies, &collection.tv_shows),
            directors: director_stats(&collection.movies),
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn watch_stats(movies: &[Movie], tv_shows: &[TvShow]) -> WatchStats {
    let movie_counts = WatchCounts::tally(movies.iter().map(|m| m.watched));
    let show_counts = WatchCounts::tally(tv_shows.iter().map(|s| s.watched));
    let total = WatchCounts {
        total: movie_counts.total + show_counts.total,
        watched: movie_counts.watched + show_counts.watched,
        unwatched: movie_counts.unwatched + show_counts.unwatched,
    };
    let completion_percentage = if total.total == 0 {
        0.0
    } else {
        round1(total.watched as f64 / total.total as f64 * 100.0)
    };
    WatchStats {
        movies: movie_counts,
        tv_shows: show_counts,
        total,
        completion_percentage,
    }
}

pub fn rating_stats(movies: &[Movie], tv_shows: &[TvShow]) -> RatingStats {
    // movies first, then shows, each in id order
    let pool: Vec<RatedTitle> = movies
        .iter()
        .filter_map(|m| {
            m.rating.map(|rating| RatedTitle {
                title: m.title.clone(),
                kind: MediaKind::Movie,
                rating,
            })
        })
        .chain(tv_shows.iter().filter_map(|s| {
            s.rating.map(|rating| RatedTitle {
                title: s.title.clone(),
                kind: MediaKind::TvShow,
                rating,
            })
        }))
        .collect();

    if pool.is_empty() {
        return RatingStats::default();
    }

    let sum: f64 = pool.iter().map(|r| r.rating).sum();
    let mut rating_distribution = BTreeMap::new();
    for rated in &pool {
        let bucket = rated.rating.trunc();
        if (1.0..=10.0).contains(&bucket) {
            *rating_distribution.entry(bucket as u8).or_insert(0) += 1;
        }
    }

    let max = pool.iter().map(|r| r.rating).fold(f64::MIN, f64::max);
    let min = pool.iter().map(|r| r.rating).fold(f64::MAX, f64::min);
    let matching = |target: f64| -> Vec<RatedTitle> {
        pool.iter()
            .filter(|r| r.rating == target)
            .take(RATED_LIST_LEN)
            .cloned()
            .collect()
    };

    RatingStats {
        rated_count: pool.len(),
        average_rating: round1(sum / pool.len() as f64),
        rating_distribution,
        highest_rated: matching(max),
        lowest_rated: matching(min),
    }
}

fn decade_label(year: i32) -> String {
    format!("{}s", year - year % 10)
}

pub fn year_stats(movies: &[Movie], tv_shows: &[TvShow]) -> YearStats {
    let mut stats = YearStats::default();
    for movie in movies {
        *stats.movies_by_year.entry(movie.year).or_insert(0) += 1;
        stats
            .decade_stats
            .entry(decade_label(movie.year))
            .or_default()
            .movies += 1;
    }
    for show in tv_shows {
        *stats.tv_shows_by_year.entry(show.year).or_insert(0) += 1;
        stats
            .decade_stats
            .entry(decade_label(show.year))
            .or_default()
            .tv_shows += 1;
    }

    let mut all_years: Vec<i32> = stats
        .movies_by_year
        .keys()
        .chain(stats.tv_shows_by_year.keys())
        .copied()
        .collect();
    all_years.sort_unstable();
    all_years.dedup();

    stats.oldest_year = all_years.first().copied();
    stats.newest_year = all_years.last().copied();
    stats.all_years = all_years;
    stats
}

/// Directors ranked by movie count, and by average rating over rated movies.
/// Ties keep the order in which a director first appears (lowest movie id).
pub fn director_stats(movies: &[Movie]) -> DirectorStats {
    let mut counts: Vec<DirectorCount> = Vec::new();
    let mut count_index: HashMap<&str, usize> = HashMap::new();
    let mut rated: Vec<(String, f64, usize)> = Vec::new();
    let mut rated_index: HashMap<&str, usize> = HashMap::new();

    for movie in movies {
        let director = movie.director.as_str();
        match count_index.get(director) {
            Some(&i) => counts[i].count += 1,
            None => {
                count_index.insert(director, counts.len());
                counts.push(DirectorCount {
                    director: director.to_string(),
                    count: 1,
                });
            }
        }

        if let Some(rating) = movie.rating {
            match rated_index.get(director) {
                Some(&i) => {
                    rated[i].1 += rating;
                    rated[i].2 += 1;
                }
                None => {
                    rated_index.insert(director, rated.len());
                    rated.push((director.to_string(), rating, 1));
                }
            }
        }
    }

    // sort_by is stable, so equal counts keep first-seen order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(DIRECTOR_LIST_LEN);

    let mut averages: Vec<(String, f64, usize)> = rated
        .into_iter()
        .map(|(director, sum, n)| (director, sum / n as f64, n))
        .collect();
    averages.sort_by(|a, b| b.1.total_cmp(&a.1).then(b.2.cmp(&a.2)));
    averages.truncate(DIRECTOR_LIST_LEN);

    DirectorStats {
        top_directors: counts,
        highest_rated_directors: averages
            .into_iter()
            .map(|(director, average, movie_count)| DirectorRating {
                director,
                average_rating: round1(average),
                movie_count,
            })
            .collect(),
    }
}
