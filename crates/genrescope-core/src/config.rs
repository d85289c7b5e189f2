use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Root application configuration, loaded from `~/.config/genrescope/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub author: AuthorConfig,
    pub recommend: RecommendConfig,
    pub shell: ShellConfig,
}

/// Locations of the three source tables and the export target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory relative paths below are resolved against.
    pub data_dir: String,
    pub books_path: String,
    pub films_path: String,
    pub ratings_path: String,
    pub export_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorConfig {
    /// Matched as a substring of the catalog's author field.
    pub surname: String,
    /// Books whose title starts with this are not recommended.
    pub full_name: String,
    pub bio: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    pub max_books: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Delay between characters of animated output. 0 prints instantly.
    pub typing_delay_ms: u64,
    pub genres_per_line: usize,
    pub color: bool,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: ".".to_string(),
            books_path: "titles.csv".to_string(),
            films_path: "title.basics.tsv".to_string(),
            ratings_path: "title.ratings.tsv".to_string(),
            export_path: "filtered_data.csv".to_string(),
        }
    }
}

impl Default for AuthorConfig {
    fn default() -> Self {
        Self {
            surname: "Forster".to_string(),
            full_name: "E. M. Forster".to_string(),
            bio: "E. M. Forster is a british novelist, essayist, and social and\n\
                  literary critic. His fame rests largely on his novels\n\
                  Howards End (1910) and A Passage to India (1924) and on a large\n\
                  body of criticism."
                .to_string(),
        }
    }
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self { max_books: 5 }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            typing_delay_ms: 30,
            genres_per_line: 6,
            color: true,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/genrescope/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("GENRESCOPE_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("genrescope")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to the standard path.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn set_data_dir(&mut self, dir: PathBuf) {
        self.data.data_dir = dir.to_string_lossy().to_string();
    }

    // ─── Derived paths ─────────────────────────────────────

    fn resolve(&self, file: &str) -> PathBuf {
        let path = PathBuf::from(file);
        if path.is_absolute() {
            path
        } else {
            PathBuf::from(&self.data.data_dir).join(path)
        }
    }

    pub fn books_path(&self) -> PathBuf {
        self.resolve(&self.data.books_path)
    }

    pub fn films_path(&self) -> PathBuf {
        self.resolve(&self.data.films_path)
    }

    pub fn ratings_path(&self) -> PathBuf {
        self.resolve(&self.data.ratings_path)
    }

    pub fn export_path(&self) -> PathBuf {
        self.resolve(&self.data.export_path)
    }
}
