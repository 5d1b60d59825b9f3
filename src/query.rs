//! Search and sort parameters for list endpoints, and the SQL they turn into.
//!
//! Rows with no rating sort as SQLite orders NULL: before every number when
//! ascending, after every number when descending. Ties on the sort column
//! keep id order.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Rating,
    Year,
}

impl SortKey {
    /// Unknown keys are ignored rather than rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "rating" => Some(SortKey::Rating),
            "year" => Some(SortKey::Year),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            SortKey::Rating => "rating",
            SortKey::Year => "year",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, alias = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
}

impl ListQuery {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }

    pub fn sorted(key: &str, order: &str) -> Self {
        Self {
            sort_by: Some(key.to_string()),
            order: Some(order.to_string()),
            ..Self::default()
        }
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }

    pub fn sort(&self) -> Option<(SortKey, SortOrder)> {
        let key = self.sort_by.as_deref().and_then(SortKey::parse)?;
        Some((key, SortOrder::from_param(self.order.as_deref())))
    }

    /// Builds the SELECT for `table`, filtering on `search_columns`. Returns
    /// the statement and the LIKE pattern to bind as `?1`, if any.
    pub(crate) fn to_sql(
        &self,
        table: &str,
        columns: &str,
        search_columns: &[&str],
    ) -> (String, Option<String>) {
        let mut sql = format!("SELECT {columns} FROM {table}");
        let pattern = match search_columns {
            [] => None,
            _ => self.search_term().map(like_pattern),
        };
        if pattern.is_some() {
            let filter = search_columns
                .iter()
                .map(|c| format!("{c} LIKE ?1 ESCAPE '\\'"))
                .collect::<Vec<_>>()
                .join(" OR ");
            sql.push_str(" WHERE ");
            sql.push_str(&filter);
        }
        match self.sort() {
            Some((key, order)) => {
                sql.push_str(&format!(
                    " ORDER BY {} {}, id ASC",
                    key.column(),
                    order.keyword()
                ));
            }
            None => sql.push_str(" ORDER BY id ASC"),
        }
        (sql, pattern)
    }
}

/// Wraps a search term for a case-insensitive LIKE substring match, escaping
/// the LIKE wildcards so they match literally.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
