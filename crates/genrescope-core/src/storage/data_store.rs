use std::cell::OnceCell;
use std::path::Path;

use rand::Rng;

use crate::config::{AppConfig, AuthorConfig};
use crate::error::{GenrescopeError, Result};
use crate::models::{FilmRecommendation, GenreReport, MergedRow, MergedTable};
use crate::storage::catalog::{CachedCatalog, CatalogSource, FileCatalog};
use crate::storage::export;
use crate::storage::join::build_merged_table;
use crate::storage::queries::{GenreIndex, GenreStatsQuery};

/// Process-lifetime access to the merged table and everything derived from it.
///
/// Each derived table is computed on first use and cached; sources are read
/// at most once. Single-threaded by construction (`OnceCell`).
pub struct DataStore<S = FileCatalog> {
    catalog: Option<CachedCatalog<S>>,
    author: AuthorConfig,
    max_books: usize,
    table: OnceCell<MergedTable>,
    genres: OnceCell<GenreIndex>,
    combined: OnceCell<Vec<String>>,
}

impl DataStore<FileCatalog> {
    /// Store backed by the files named in `config`.
    pub fn open(config: &AppConfig) -> Self {
        Self::new(
            FileCatalog::from_config(config),
            config.author.clone(),
            config.recommend.max_books,
        )
    }
}

impl<S: CatalogSource> DataStore<S> {
    pub fn new(source: S, author: AuthorConfig, max_books: usize) -> Self {
        Self {
            catalog: Some(CachedCatalog::new(source)),
            author,
            max_books,
            table: OnceCell::new(),
            genres: OnceCell::new(),
            combined: OnceCell::new(),
        }
    }

    /// Store around an already merged table; no sources are ever read.
    pub fn from_table(table: MergedTable, author: AuthorConfig, max_books: usize) -> Self {
        Self {
            catalog: None,
            author,
            max_books,
            table: OnceCell::from(table),
            genres: OnceCell::new(),
            combined: OnceCell::new(),
        }
    }

    pub fn catalog(&self) -> Option<&CachedCatalog<S>> {
        self.catalog.as_ref()
    }

    pub fn author(&self) -> &AuthorConfig {
        &self.author
    }

    pub fn merged_table(&self) -> Result<&MergedTable> {
        if let Some(table) = self.table.get() {
            return Ok(table);
        }
        let catalog = self
            .catalog
            .as_ref()
            .ok_or_else(|| GenrescopeError::ConfigError("data store has no catalog".to_string()))?;

        let table = build_merged_table(
            catalog.books()?,
            catalog.films()?,
            catalog.ratings()?,
            &self.author.surname,
        );
        Ok(self.table.get_or_init(|| table))
    }

    /// The genre tokens of the merged table, `EXIT` last.
    pub fn list_genres(&self) -> Result<&GenreIndex> {
        if let Some(genres) = self.genres.get() {
            return Ok(genres);
        }
        let genres = GenreIndex::from_table(self.merged_table()?);
        Ok(self.genres.get_or_init(|| genres))
    }

    fn combined_genres(&self) -> Result<&[String]> {
        if let Some(combined) = self.combined.get() {
            return Ok(combined.as_slice());
        }
        let combined = self
            .merged_table()?
            .iter()
            .map(MergedRow::combined_genres)
            .collect();
        Ok(self.combined.get_or_init(|| combined).as_slice())
    }

    pub fn stats(&self) -> Result<GenreStatsQuery<'_>> {
        Ok(GenreStatsQuery::new(
            self.merged_table()?,
            self.list_genres()?,
            self.combined_genres()?,
            &self.author.full_name,
            self.max_books,
        ))
    }

    pub fn average_rating(&self, genre: &str) -> Result<Option<f64>> {
        Ok(self.stats()?.average_rating(genre))
    }

    pub fn relative_rating(&self, genre: &str) -> Result<Option<f64>> {
        self.stats()?.relative_rating(genre)
    }

    pub fn recommend_films(&self, genre: &str) -> Result<Vec<FilmRecommendation>> {
        Ok(self.stats()?.recommend_films(genre))
    }

    pub fn recommend_books<R: Rng + ?Sized>(&self, genre: &str, rng: &mut R) -> Result<Vec<String>> {
        Ok(self.stats()?.recommend_books(genre, rng))
    }

    /// All statistics for one genre.
    pub fn report<R: Rng + ?Sized>(&self, genre: &str, rng: &mut R) -> Result<GenreReport> {
        let stats = self.stats()?;
        Ok(GenreReport {
            genre: genre.to_string(),
            average_rating: stats.average_rating(genre),
            relative_rating: stats.relative_rating(genre)?,
            films: stats.recommend_films(genre),
            books: stats.recommend_books(genre, rng),
        })
    }

    pub fn export_csv(&self, path: &Path) -> Result<()> {
        export::export_csv(self.merged_table()?, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawBookRecord, RawFilmRecord, RawRatingRecord};
    use crate::storage::catalog::tests::{MemoryCatalog, write_fixture};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::TempDir;

    fn memory_store() -> DataStore<MemoryCatalog> {
        let author = Some("Forster, E. M.".to_string());
        let source = MemoryCatalog {
            books: vec![
                RawBookRecord {
                    title: Some("A Room with a View".into()),
                    genre_field: Some("Fiction; Romance".into()),
                    author_field: author.clone(),
                    ..Default::default()
                },
                RawBookRecord {
                    title: Some("The Hill of Devi".into()),
                    genre_field: Some("Travel".into()),
                    author_field: author.clone(),
                    ..Default::default()
                },
            ],
            films: vec![RawFilmRecord {
                id: "tt0091867".into(),
                primary_title: Some("A Room with a View".into()),
                original_title: Some("A Room with a View".into()),
                genre_field: Some("Drama,Romance".into()),
            }],
            ratings: vec![RawRatingRecord {
                id: "tt0091867".into(),
                rating: 7.3,
            }],
            ..Default::default()
        };
        DataStore::new(source, AuthorConfig::default(), 5)
    }

    #[test]
    fn test_tables_computed_once() {
        let store = memory_store();
        let first = store.merged_table().unwrap() as *const MergedTable;
        let second = store.merged_table().unwrap() as *const MergedTable;
        assert_eq!(first, second);

        store.list_genres().unwrap();
        store.average_rating("Drama").unwrap();
        store.relative_rating("Romance").ok();
        assert_eq!(store.catalog().unwrap().source().loads.get(), 3);
    }

    #[test]
    fn test_list_genres_from_store() {
        let store = memory_store();
        let genres = store.list_genres().unwrap();
        assert_eq!(
            genres.list(),
            ["Drama", "Fiction", "Romance", "Travel", "EXIT"].map(String::from).as_slice()
        );
        assert_eq!(store.list_genres().unwrap(), genres);
    }

    #[test]
    fn test_report() {
        let store = memory_store();
        let mut rng = StdRng::seed_from_u64(0);
        let report = store.report("Travel", &mut rng).unwrap();
        assert_eq!(report.average_rating, None);
        assert_eq!(report.relative_rating, None);
        assert!(!report.has_films());
        assert_eq!(report.books, vec!["The Hill of Devi".to_string()]);

        let report = store.report("Romance", &mut rng).unwrap();
        assert_eq!(report.average_rating, Some(7.3));
        assert_eq!(report.films.len(), 1);
        assert_eq!(report.films[0].film, "A Room with a View");
        assert!(report.books.is_empty());
    }

    #[test]
    fn test_from_table_reads_nothing() {
        let table = MergedTable::new(vec![
            MergedRow::adapted("A", Some("Drama".into()), "A", "Drama", 8.0),
            MergedRow::unadapted("B", Some("Drama".into())),
        ]);
        let store: DataStore<FileCatalog> = DataStore::from_table(table, AuthorConfig::default(), 5);
        assert_eq!(store.average_rating("Drama").unwrap(), Some(8.0));
        assert!(store.catalog().is_none());
    }

    #[test]
    fn test_open_from_files_and_export() {
        let dir = TempDir::new().unwrap();
        write_fixture(dir.path());
        let mut config = AppConfig::default();
        config.set_data_dir(dir.path().to_path_buf());

        let store = DataStore::open(&config);
        let table = store.merged_table().unwrap();
        let books: Vec<&str> = table.iter().map(|r| r.book.as_str()).collect();
        assert_eq!(books, vec!["Maurice", "Howards End", "Aspects of the Novel"]);
        assert_eq!(table.adapted_count(), 2);

        // Drama 7.55, Romance 7.55, Fiction 7.55 (via book genre), Criticism none.
        assert_eq!(store.average_rating("Drama").unwrap(), Some(7.55));

        let out = dir.path().join("filtered_data.csv");
        store.export_csv(&out).unwrap();
        let text = std::fs::read_to_string(out).unwrap();
        assert!(text.starts_with(",book,bookgenre,film,genre,rating"));
        assert!(text.contains("Aspects of the Novel,Criticism,,,"));
    }

    #[test]
    fn test_missing_source_surfaces_error() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.set_data_dir(dir.path().to_path_buf());

        let store = DataStore::open(&config);
        assert!(matches!(
            store.list_genres(),
            Err(GenrescopeError::DataSourceUnavailable { .. })
        ));
    }
}
