use serde::{Deserialize, Serialize};

// ─── MergedRow ─────────────────────────────────────────────

/// A book, its adaptation (if any) and the adaptation's rating.
///
/// `film`, `genre` and `rating` are either all present or all absent;
/// `bookgenre` is independent of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRow {
    pub book: String,
    pub bookgenre: Option<String>,
    pub film: Option<String>,
    pub genre: Option<String>,
    pub rating: Option<f64>,
}

impl MergedRow {
    /// A book without an adaptation.
    pub fn unadapted(book: impl Into<String>, bookgenre: Option<String>) -> Self {
        Self {
            book: book.into(),
            bookgenre,
            film: None,
            genre: None,
            rating: None,
        }
    }

    /// A book joined to a rated film.
    pub fn adapted(
        book: impl Into<String>,
        bookgenre: Option<String>,
        film: impl Into<String>,
        genre: impl Into<String>,
        rating: f64,
    ) -> Self {
        Self {
            book: book.into(),
            bookgenre,
            film: Some(film.into()),
            genre: Some(genre.into()),
            rating: Some(rating),
        }
    }

    pub fn is_adapted(&self) -> bool {
        self.film.is_some()
    }

    /// Film genres followed by book genres, nulls as empty strings.
    /// No separator is inserted, so a match may straddle the two fields.
    pub fn combined_genres(&self) -> String {
        let mut all = self.genre.clone().unwrap_or_default();
        all.push_str(self.bookgenre.as_deref().unwrap_or(""));
        all
    }
}

// ─── MergedTable ───────────────────────────────────────────

/// The denormalized books ⨝ films ⨝ ratings table. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedTable {
    rows: Vec<MergedRow>,
}

impl MergedTable {
    pub fn new(rows: Vec<MergedRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[MergedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MergedRow> {
        self.rows.iter()
    }

    /// Number of rows carrying a film match.
    pub fn adapted_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_adapted()).count()
    }
}

impl<'a> IntoIterator for &'a MergedTable {
    type Item = &'a MergedRow;
    type IntoIter = std::slice::Iter<'a, MergedRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
