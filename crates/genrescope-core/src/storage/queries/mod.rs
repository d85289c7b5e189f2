mod genres;
mod stats;

pub use genres::GenreIndex;
pub use stats::GenreStatsQuery;
