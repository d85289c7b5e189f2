use serde::{Deserialize, Serialize};

// ─── Source rows ───────────────────────────────────────────

/// One row of the book catalog, projected to the columns the join needs.
/// Null cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBookRecord {
    pub title: Option<String>,
    pub alternate_title: Option<String>,
    pub genre_field: Option<String>,
    pub author_field: Option<String>,
}

impl RawBookRecord {
    /// True if the author field mentions `surname`. Null author fields never match.
    pub fn is_by(&self, surname: &str) -> bool {
        self.author_field
            .as_deref()
            .is_some_and(|names| names.contains(surname))
    }
}

/// One row of the film catalog (`title.basics`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFilmRecord {
    pub id: String,
    pub primary_title: Option<String>,
    pub original_title: Option<String>,
    pub genre_field: Option<String>,
}

/// One row of the ratings table (`title.ratings`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRatingRecord {
    pub id: String,
    pub rating: f64,
}
