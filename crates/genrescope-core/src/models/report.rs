use serde::{Deserialize, Serialize};

/// Sentinel appended to the genre list; the shell treats it as "quit".
pub const EXIT_SENTINEL: &str = "EXIT";

/// A ranked film recommendation. `rank` starts at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmRecommendation {
    pub rank: usize,
    pub film: String,
    pub rating: f64,
}

/// Everything the shell shows for one genre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreReport {
    pub genre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    /// Percent by which this genre out-rates the baseline, floored at 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_rating: Option<f64>,
    #[serde(default)]
    pub films: Vec<FilmRecommendation>,
    #[serde(default)]
    pub books: Vec<String>,
}

impl GenreReport {
    pub fn has_films(&self) -> bool {
        !self.films.is_empty()
    }
}
