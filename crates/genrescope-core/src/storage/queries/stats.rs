use std::collections::HashSet;

use rand::Rng;
use rand::seq::index;

use crate::error::{GenrescopeError, Result};
use crate::models::{FilmRecommendation, MergedTable};
use crate::storage::queries::GenreIndex;

/// Per-genre statistics over a merged table.
///
/// Every method expects `genre` to be a member of the genre index; other
/// strings are not rejected and simply produce empty or missing results.
/// Genre matching is by substring, so `War` also matches `Warfare`.
pub struct GenreStatsQuery<'a> {
    table: &'a MergedTable,
    genres: &'a GenreIndex,
    /// `genre ++ bookgenre` per row, parallel to `table`.
    combined: &'a [String],
    author_full_name: &'a str,
    max_books: usize,
}

impl<'a> GenreStatsQuery<'a> {
    pub fn new(
        table: &'a MergedTable,
        genres: &'a GenreIndex,
        combined: &'a [String],
        author_full_name: &'a str,
        max_books: usize,
    ) -> Self {
        debug_assert_eq!(table.len(), combined.len());
        Self {
            table,
            genres,
            combined,
            author_full_name,
            max_books,
        }
    }

    /// Mean film rating over rows whose combined genres mention `genre`,
    /// rounded to two decimals. `None` if no such row has a rating.
    pub fn average_rating(&self, genre: &str) -> Option<f64> {
        let (sum, count) = self
            .table
            .iter()
            .zip(self.combined)
            .filter(|(_, all)| all.contains(genre))
            .filter_map(|(row, _)| row.rating)
            .fold((0.0, 0usize), |(sum, count), r| (sum + r, count + 1));

        (count > 0).then(|| round2(sum / count as f64))
    }

    /// How much better `genre` rates than the rest, in percent, floored at 0.
    ///
    /// The baseline is the mean of every other genre's average, truncated to
    /// a whole number. A zero baseline (or no other rated genre) is an error.
    /// Returns `None` if `genre` itself has no average.
    pub fn relative_rating(&self, genre: &str) -> Result<Option<f64>> {
        let others: Vec<f64> = self
            .genres
            .tokens()
            .iter()
            .filter(|g| g.as_str() != genre)
            .filter_map(|g| self.average_rating(g))
            .collect();

        let baseline = if others.is_empty() {
            0.0
        } else {
            (others.iter().sum::<f64>() / others.len() as f64).floor()
        };
        if baseline == 0.0 {
            return Err(GenrescopeError::DivisionByZero {
                genre: genre.to_string(),
            });
        }

        Ok(self.average_rating(genre).map(|own| {
            let relative = own * 100.0 / baseline - 100.0;
            round2(relative.max(0.0))
        }))
    }

    /// Films whose genres mention `genre`, best rated first, one entry per
    /// film title, ranked from 1.
    pub fn recommend_films(&self, genre: &str) -> Vec<FilmRecommendation> {
        let mut candidates: Vec<(&str, f64)> = self
            .table
            .iter()
            .filter(|row| row.genre.as_deref().is_some_and(|g| g.contains(genre)))
            .filter_map(|row| Some((row.film.as_deref()?, row.rating?)))
            .collect();

        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|(film, _)| seen.insert(*film))
            .enumerate()
            .map(|(i, (film, rating))| FilmRecommendation {
                rank: i + 1,
                film: film.to_string(),
                rating,
            })
            .collect()
    }

    /// Unadapted books of `genre` that are worth suggesting, in table order.
    ///
    /// Anthologies and editions are left out: titles containing `(` or `[`,
    /// starting with the author's name, or mentioning `Edited`/`edit`.
    pub fn unadapted_books(&self, genre: &str) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        self.table
            .iter()
            .filter(|row| !row.is_adapted())
            .filter(|row| row.bookgenre.as_deref().is_some_and(|g| g.contains(genre)))
            .map(|row| row.book.as_str())
            .filter(|book| seen.insert(*book))
            .filter(|book| self.is_recommendable(book))
            .collect()
    }

    /// A random sample of at most `max_books` of [`Self::unadapted_books`].
    /// Smaller sets are returned whole, in table order.
    pub fn recommend_books<R: Rng + ?Sized>(&self, genre: &str, rng: &mut R) -> Vec<String> {
        let books = self.unadapted_books(genre);
        if books.len() < self.max_books {
            return books.into_iter().map(str::to_string).collect();
        }

        index::sample(rng, books.len(), self.max_books)
            .into_iter()
            .map(|i| books[i].to_string())
            .collect()
    }

    fn is_recommendable(&self, book: &str) -> bool {
        !(book.contains('(')
            || book.contains('[')
            || book.starts_with(self.author_full_name)
            || book.contains("Edited")
            || book.contains("edit"))
    }
}

/// Round to two decimals from the exact binary value, so `8.225` (stored
/// just below) gives `8.22`.
fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}
