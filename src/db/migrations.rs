/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r#"
CREATE TABLE IF NOT EXISTS movies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    director TEXT NOT NULL,
    year INTEGER NOT NULL CHECK (year >= 0),
    rating REAL CHECK (rating IS NULL OR (rating >= 0 AND rating <= 10)),
    watched INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_movies_title ON movies(title);
CREATE INDEX IF NOT EXISTS idx_movies_director ON movies(director);
"#;

const MIGRATION_002: &str = r#"
CREATE TABLE IF NOT EXISTS tv_shows (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    year INTEGER NOT NULL CHECK (year >= 0),
    seasons INTEGER CHECK (seasons IS NULL OR seasons >= 0),
    episodes INTEGER CHECK (episodes IS NULL OR episodes >= 0),
    rating REAL CHECK (rating IS NULL OR (rating >= 0 AND rating <= 10)),
    watched INTEGER NOT NULL DEFAULT 0,
    review TEXT,
    poster_url TEXT
);

CREATE INDEX IF NOT EXISTS idx_tv_shows_title_year ON tv_shows(title, year);
"#;

const MIGRATION_003: &str = r#"
ALTER TABLE movies ADD COLUMN review TEXT;
ALTER TABLE movies ADD COLUMN poster_url TEXT;
"#;

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_movies",
        sql: MIGRATION_001,
    },
    Migration {
        version: 2,
        name: "create_tv_shows",
        sql: MIGRATION_002,
    },
    Migration {
        version: 3,
        name: "movie_review_and_poster",
        sql: MIGRATION_003,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_strictly_increasing() {
        for pair in MIGRATIONS.windows(2) {
            assert!(pair[0].version < pair[1].version);
        }
    }
}
