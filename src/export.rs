use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{Collection, Database};
use crate::error::Result;
use crate::models::{Movie, TvShow};

/// Version of the export document layout, bumped when its shape changes.
pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportDocument {
    pub exported_at: DateTime<Utc>,
    pub version: &'static str,
    pub movies: Vec<Movie>,
    pub tv_shows: Vec<TvShow>,
}

impl ExportDocument {
    pub fn new(collection: Collection, exported_at: DateTime<Utc>) -> Self {
        Self {
            exported_at,
            version: EXPORT_VERSION,
            movies: collection.movies,
            tv_shows: collection.tv_shows,
        }
    }
}

impl Database {
    pub fn export(&self) -> Result<ExportDocument> {
        Ok(ExportDocument::new(self.collection()?, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::ImportDocument;
    use crate::models::{NewMovie, NewTvShow};

    #[test]
    fn export_can_be_imported_back() {
        let source = Database::open_in_memory().unwrap();
        source
            .insert_movie(NewMovie {
                title: "Heat".to_string(),
                director: "Michael Mann".to_string(),
                year: 1995,
                rating: Some(9.0),
                watched: true,
                review: None,
                poster_url: Some("https://example.org/heat.jpg".to_string()),
            })
            .unwrap();
        source
            .insert_tv_show(NewTvShow {
                title: "Dark".to_string(),
                year: 2017,
                seasons: Some(3),
                episodes: Some(26),
                rating: None,
                watched: false,
                review: None,
                poster_url: None,
            })
            .unwrap();

        let exported = source.export().unwrap();
        assert_eq!(exported.version, EXPORT_VERSION);
        let value = serde_json::to_value(&exported).unwrap();
        assert!(value["exported_at"].is_string());

        let document: ImportDocument = serde_json::from_value(value).unwrap();
        let mut target = Database::open_in_memory().unwrap();
        let summary = target.import_document(&document);
        assert_eq!(summary.movies_created, 1);
        assert_eq!(summary.tv_shows_created, 1);
        assert!(summary.errors.is_empty());
        assert_eq!(target.collection().unwrap(), source.collection().unwrap());

        // a second pass only updates
        let again = target.import_document(&document);
        assert_eq!(again.movies_updated, 1);
        assert_eq!(again.tv_shows_updated, 1);
        assert_eq!(again.movies_created + again.tv_shows_created, 0);
    }
}
