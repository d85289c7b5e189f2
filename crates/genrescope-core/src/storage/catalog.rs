use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::error::{GenrescopeError, Result};
use crate::models::{RawBookRecord, RawFilmRecord, RawRatingRecord};
use crate::storage::tabular::{TableFormat, read_projected};

// Column names of the three source files.
pub const BOOK_COLUMNS: [&str; 4] = ["Title", "Other titles", "Genre", "All names"];
pub const FILM_COLUMNS: [&str; 4] = ["tconst", "primaryTitle", "originalTitle", "genres"];
pub const RATING_COLUMNS: [&str; 2] = ["tconst", "averageRating"];

/// Where the three raw tables come from.
pub trait CatalogSource {
    fn load_book_catalog(&self) -> Result<Vec<RawBookRecord>>;
    fn load_film_catalog(&self) -> Result<Vec<RawFilmRecord>>;
    fn load_film_ratings(&self) -> Result<Vec<RawRatingRecord>>;
}

// ─── Files on disk ─────────────────────────────────────────

/// Reads the catalogs from one CSV and two TSV files.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    pub books_path: PathBuf,
    pub films_path: PathBuf,
    pub ratings_path: PathBuf,
}

impl FileCatalog {
    pub fn new(books_path: PathBuf, films_path: PathBuf, ratings_path: PathBuf) -> Self {
        Self {
            books_path,
            films_path,
            ratings_path,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.books_path(), config.films_path(), config.ratings_path())
    }

    /// All three source paths, for diagnostics.
    pub fn paths(&self) -> [&Path; 3] {
        [
            self.books_path.as_path(),
            self.films_path.as_path(),
            self.ratings_path.as_path(),
        ]
    }
}

impl CatalogSource for FileCatalog {
    fn load_book_catalog(&self) -> Result<Vec<RawBookRecord>> {
        let rows = read_projected(&self.books_path, TableFormat::CSV, &BOOK_COLUMNS)?;
        Ok(rows
            .into_iter()
            .map(|mut row| RawBookRecord {
                title: row[0].take(),
                alternate_title: row[1].take(),
                genre_field: row[2].take(),
                author_field: row[3].take(),
            })
            .collect())
    }

    fn load_film_catalog(&self) -> Result<Vec<RawFilmRecord>> {
        let rows = read_projected(&self.films_path, TableFormat::TSV, &FILM_COLUMNS)?;
        let mut films = Vec::with_capacity(rows.len());
        for mut row in rows {
            let Some(id) = row[0].take() else {
                tracing::warn!(path = %self.films_path.display(), "skipping film row without tconst");
                continue;
            };
            films.push(RawFilmRecord {
                id,
                primary_title: row[1].take(),
                original_title: row[2].take(),
                genre_field: row[3].take(),
            });
        }
        Ok(films)
    }

    fn load_film_ratings(&self) -> Result<Vec<RawRatingRecord>> {
        let rows = read_projected(&self.ratings_path, TableFormat::TSV, &RATING_COLUMNS)?;
        let mut ratings = Vec::with_capacity(rows.len());
        for (line, mut row) in rows.into_iter().enumerate() {
            let (Some(id), Some(raw)) = (row[0].take(), row[1].take()) else {
                tracing::warn!(path = %self.ratings_path.display(), line = line + 2, "skipping incomplete rating row");
                continue;
            };
            let rating = raw.trim().parse::<f64>().map_err(|e| {
                GenrescopeError::unavailable(
                    &self.ratings_path,
                    format!("line {}: invalid rating '{raw}': {e}", line + 2),
                )
            })?;
            ratings.push(RawRatingRecord { id, rating });
        }
        Ok(ratings)
    }
}

// ─── Memoization ───────────────────────────────────────────

/// Loads each table from `S` at most once and hands out borrows afterwards.
/// Not `Sync`; share it behind a one-time initializer if threads are added.
pub struct CachedCatalog<S> {
    source: S,
    books: OnceCell<Vec<RawBookRecord>>,
    films: OnceCell<Vec<RawFilmRecord>>,
    ratings: OnceCell<Vec<RawRatingRecord>>,
}

impl<S: CatalogSource> CachedCatalog<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            books: OnceCell::new(),
            films: OnceCell::new(),
            ratings: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn books(&self) -> Result<&[RawBookRecord]> {
        cached(&self.books, || {
            let books = self.source.load_book_catalog()?;
            tracing::info!(rows = books.len(), "loaded book catalog");
            Ok(books)
        })
    }

    pub fn films(&self) -> Result<&[RawFilmRecord]> {
        cached(&self.films, || {
            let films = self.source.load_film_catalog()?;
            tracing::info!(rows = films.len(), "loaded film catalog");
            Ok(films)
        })
    }

    pub fn ratings(&self) -> Result<&[RawRatingRecord]> {
        cached(&self.ratings, || {
            let ratings = self.source.load_film_ratings()?;
            tracing::info!(rows = ratings.len(), "loaded film ratings");
            Ok(ratings)
        })
    }
}

/// `OnceCell::get_or_try_init` is unstable; a failed load leaves the cell empty.
fn cached<T>(cell: &OnceCell<Vec<T>>, load: impl FnOnce() -> Result<Vec<T>>) -> Result<&[T]> {
    if let Some(value) = cell.get() {
        return Ok(value.as_slice());
    }
    let value = load()?;
    Ok(cell.get_or_init(|| value).as_slice())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::TempDir;

    /// In-memory source that counts how often each table is loaded.
    #[derive(Default)]
    pub(crate) struct MemoryCatalog {
        pub books: Vec<RawBookRecord>,
        pub films: Vec<RawFilmRecord>,
        pub ratings: Vec<RawRatingRecord>,
        pub loads: Cell<usize>,
    }

    impl CatalogSource for MemoryCatalog {
        fn load_book_catalog(&self) -> Result<Vec<RawBookRecord>> {
            self.loads.set(self.loads.get() + 1);
            Ok(self.books.clone())
        }

        fn load_film_catalog(&self) -> Result<Vec<RawFilmRecord>> {
            self.loads.set(self.loads.get() + 1);
            Ok(self.films.clone())
        }

        fn load_film_ratings(&self) -> Result<Vec<RawRatingRecord>> {
            self.loads.set(self.loads.get() + 1);
            Ok(self.ratings.clone())
        }
    }

    pub(crate) fn write_fixture(dir: &Path) -> FileCatalog {
        let books = dir.join("titles.csv");
        let films = dir.join("title.basics.tsv");
        let ratings = dir.join("title.ratings.tsv");
        std::fs::write(
            &books,
            "Title,Other titles,Genre,All names\n\
             Maurice,,\"Fiction, Romance\",\"Forster, E. M.\"\n\
             Howards End,Howard's End,Fiction,\"Forster, E. M.\"\n\
             Aspects of the Novel,,Criticism,\"Forster, E. M.\"\n\
             Mrs Dalloway,,Fiction,\"Woolf, Virginia\"\n",
        )
        .unwrap();
        std::fs::write(
            &films,
            "tconst\ttitleType\tprimaryTitle\toriginalTitle\tisAdult\tgenres\n\
             tt0093512\tmovie\tMaurice\tMaurice\t0\tDrama,Romance\n\
             tt0104454\tmovie\tHowards End\tHowards End\t0\tDrama,Romance\n\
             tt0000001\tshort\tCarmencita\tCarmencita\t0\tDocumentary,Short\n",
        )
        .unwrap();
        std::fs::write(
            &ratings,
            "tconst\taverageRating\tnumVotes\n\
             tt0000001\t5.6\t2000\n\
             tt0093512\t7.7\t1500\n\
             tt0104454\t7.4\t30000\n",
        )
        .unwrap();
        FileCatalog::new(books, films, ratings)
    }

    #[test]
    fn test_file_catalog_loads_all_tables() {
        let dir = TempDir::new().unwrap();
        let catalog = write_fixture(dir.path());

        let books = catalog.load_book_catalog().unwrap();
        assert_eq!(books.len(), 4);
        assert_eq!(books[0].title.as_deref(), Some("Maurice"));
        assert_eq!(books[0].alternate_title, None);
        assert_eq!(books[0].genre_field.as_deref(), Some("Fiction, Romance"));
        assert_eq!(books[1].alternate_title.as_deref(), Some("Howard's End"));

        let films = catalog.load_film_catalog().unwrap();
        assert_eq!(films.len(), 3);
        assert_eq!(films[1].primary_title.as_deref(), Some("Howards End"));
        assert_eq!(films[1].genre_field.as_deref(), Some("Drama,Romance"));

        let ratings = catalog.load_film_ratings().unwrap();
        assert_eq!(ratings.len(), 3);
        assert_eq!(ratings[1].id, "tt0093512");
        assert!((ratings[1].rating - 7.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bad_rating_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let mut catalog = write_fixture(dir.path());
        let ratings = dir.path().join("bad.tsv");
        std::fs::write(&ratings, "tconst\taverageRating\ntt1\tseven\n").unwrap();
        catalog.ratings_path = ratings;

        let err = catalog.load_film_ratings().unwrap_err();
        assert!(matches!(err, GenrescopeError::DataSourceUnavailable { .. }));
        assert!(err.to_string().contains("seven"));
    }

    #[test]
    fn test_null_rating_row_skipped() {
        let dir = TempDir::new().unwrap();
        let mut catalog = write_fixture(dir.path());
        let ratings = dir.path().join("partial.tsv");
        std::fs::write(&ratings, "tconst\taverageRating\ntt1\t\ntt2\t6.1\n").unwrap();
        catalog.ratings_path = ratings;

        let ratings = catalog.load_film_ratings().unwrap();
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0].id, "tt2");
    }

    #[test]
    fn test_missing_author_column_is_schema_mismatch() {
        let dir = TempDir::new().unwrap();
        let mut catalog = write_fixture(dir.path());
        let books = dir.path().join("books.csv");
        std::fs::write(&books, "Title,Other titles,Genre\nMaurice,,Fiction\n").unwrap();
        catalog.books_path = books;

        let err = catalog.load_book_catalog().unwrap_err();
        match err {
            GenrescopeError::SchemaMismatch { column, .. } => assert_eq!(column, "All names"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cached_catalog_loads_once() {
        let source = MemoryCatalog {
            books: vec![RawBookRecord {
                title: Some("Maurice".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let cached = CachedCatalog::new(source);

        assert_eq!(cached.books().unwrap().len(), 1);
        assert_eq!(cached.books().unwrap().len(), 1);
        cached.films().unwrap();
        cached.films().unwrap();
        cached.ratings().unwrap();
        assert_eq!(cached.source().loads.get(), 3);
    }

    #[test]
    fn test_cached_catalog_does_not_reread_deleted_files() {
        let dir = TempDir::new().unwrap();
        let cached = CachedCatalog::new(write_fixture(dir.path()));
        assert_eq!(cached.books().unwrap().len(), 4);

        for path in cached.source().paths() {
            std::fs::remove_file(path).unwrap();
        }
        assert_eq!(cached.books().unwrap().len(), 4);
        assert!(cached.films().is_err());
    }
}
