use std::collections::BTreeSet;

use crate::models::{EXIT_SENTINEL, MergedTable};

/// The de-duplicated genre tokens found in a merged table, plus the `EXIT`
/// sentinel as the last entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreIndex {
    /// Tokens in sorted order, sentinel last.
    genres: Vec<String>,
}

impl GenreIndex {
    /// Collect tokens from the film `genre` and `bookgenre` columns.
    pub fn from_table(table: &MergedTable) -> Self {
        let raw = table
            .iter()
            .flat_map(|row| [row.genre.as_deref(), row.bookgenre.as_deref()])
            .flatten();
        Self::from_raw(raw)
    }

    /// Build the index from raw genre fields.
    ///
    /// A field containing a backslash or the text `nan` is discarded whole.
    /// Otherwise it is split on `,` if present, else on `;`; each piece is
    /// trimmed and empty pieces are dropped.
    pub fn from_raw<'a>(fields: impl IntoIterator<Item = &'a str>) -> Self {
        let mut tokens: BTreeSet<String> = fields
            .into_iter()
            .filter(|field| !is_malformed(field))
            .flat_map(split_field)
            .collect();
        tokens.remove(EXIT_SENTINEL);

        let mut genres: Vec<String> = tokens.into_iter().collect();
        genres.push(EXIT_SENTINEL.to_string());
        Self { genres }
    }

    /// Every token including the trailing sentinel.
    pub fn list(&self) -> &[String] {
        &self.genres
    }

    /// Real genre tokens, without the sentinel.
    pub fn tokens(&self) -> &[String] {
        &self.genres[..self.genres.len() - 1]
    }

    pub fn contains(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }

    pub fn is_sentinel(genre: &str) -> bool {
        genre == EXIT_SENTINEL
    }

    /// Tokens grouped for display, `per_line` to a group.
    pub fn chunks(&self, per_line: usize) -> impl Iterator<Item = &[String]> {
        self.tokens().chunks(per_line.max(1))
    }
}

fn is_malformed(field: &str) -> bool {
    field.contains('\\') || field.contains("nan")
}

fn split_field(field: &str) -> Vec<String> {
    let pieces: Vec<&str> = if field.contains(',') {
        field.split(',').collect()
    } else if field.contains(';') {
        field.split(';').collect()
    } else {
        vec![field]
    };

    pieces
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
