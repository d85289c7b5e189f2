use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::models::{MergedRow, MergedTable, RawBookRecord, RawFilmRecord, RawRatingRecord};

/// A matched film carrying its rating, before it is attached to a book.
#[derive(Debug, Clone, PartialEq)]
struct RatedFilm<'a> {
    title: &'a str,
    genre: &'a str,
    rating: f64,
}

/// Join the three catalogs into one row per (book, adaptation) pair.
///
/// Books are kept if their author field contains `surname`. A film is an
/// adaptation when its primary or original title equals a kept book's title
/// or alternate title; films without a rating or genres are dropped, which
/// leaves their book unadapted. The final join
/// attaches rated films to books by `title == primaryTitle`, keeping books
/// without one. A book with several such films yields several rows.
pub fn build_merged_table(
    books: &[RawBookRecord],
    films: &[RawFilmRecord],
    ratings: &[RawRatingRecord],
    surname: &str,
) -> MergedTable {
    let author_books: Vec<(&str, &RawBookRecord)> = books
        .iter()
        .filter(|b| b.is_by(surname))
        .filter_map(|b| b.title.as_deref().map(|title| (title, b)))
        .collect();
    debug!(surname, books = author_books.len(), "filtered book catalog");

    let known_titles: HashSet<&str> = author_books
        .iter()
        .flat_map(|(title, b)| std::iter::once(*title).chain(b.alternate_title.as_deref()))
        .collect();

    let adaptations: Vec<&RawFilmRecord> = films
        .iter()
        .filter(|f| {
            [f.primary_title.as_deref(), f.original_title.as_deref()]
                .into_iter()
                .flatten()
                .any(|t| known_titles.contains(t))
        })
        .collect();
    debug!(films = adaptations.len(), "matched films by title");

    let adaptation_ids: HashSet<&str> = adaptations.iter().map(|f| f.id.as_str()).collect();
    let mut ratings_by_id: HashMap<&str, Vec<f64>> = HashMap::new();
    for r in ratings.iter().filter(|r| adaptation_ids.contains(r.id.as_str())) {
        ratings_by_id.entry(r.id.as_str()).or_default().push(r.rating);
    }

    // Inner join on id, in film order.
    let mut rated: Vec<RatedFilm<'_>> = Vec::new();
    for film in &adaptations {
        let Some(film_ratings) = ratings_by_id.get(film.id.as_str()) else {
            continue;
        };
        let (Some(title), Some(genre)) = (film.primary_title.as_deref(), film.genre_field.as_deref())
        else {
            debug!(id = %film.id, "dropping rated film without title or genres");
            continue;
        };
        rated.extend(film_ratings.iter().map(|&rating| RatedFilm {
            title,
            genre,
            rating,
        }));
    }
    debug!(films = rated.len(), "joined films to ratings");

    let mut by_title: HashMap<&str, Vec<&RatedFilm<'_>>> = HashMap::new();
    for film in &rated {
        by_title.entry(film.title).or_default().push(film);
    }

    let mut rows = Vec::with_capacity(author_books.len());
    for (title, book) in author_books {
        match by_title.get(title) {
            Some(matches) => rows.extend(matches.iter().map(|film| {
                MergedRow::adapted(
                    title,
                    book.genre_field.clone(),
                    film.title,
                    film.genre,
                    film.rating,
                )
            })),
            None => rows.push(MergedRow::unadapted(title, book.genre_field.clone())),
        }
    }

    let table = MergedTable::new(rows);
    debug!(rows = table.len(), adapted = table.adapted_count(), "built merged table");
    table
}
