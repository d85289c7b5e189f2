pub mod config;
pub mod error;
pub mod models;
pub mod storage;

pub use config::AppConfig;
pub use error::{ExitCode, GenrescopeError, Result};
pub use models::*;

pub use storage::catalog::{CachedCatalog, CatalogSource, FileCatalog};
pub use storage::data_store::DataStore;
pub use storage::export::{export_csv, write_csv};
pub use storage::join::build_merged_table;
pub use storage::queries::{GenreIndex, GenreStatsQuery};
