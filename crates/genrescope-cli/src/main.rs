mod shell;

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

use genrescope_core::storage::catalog::{BOOK_COLUMNS, FILM_COLUMNS, RATING_COLUMNS};
use genrescope_core::storage::export::format_rating;
use genrescope_core::storage::tabular::{TableFormat, read_projected};
use genrescope_core::{AppConfig, DataStore, ExitCode, GenrescopeError};

use shell::Shell;

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "genrescope",
    about = "Genre statistics for an author's books and their screen adaptations",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting GENRESCOPE_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the data files. Also GENRESCOPE_DATA_DIR.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the genres found in the merged table.
    Genres,

    /// Show statistics and recommendations for one genre.
    Analyze {
        genre: String,
        /// Seed for the book sample, for reproducible output.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Write the merged table as CSV.
    Export {
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Check that the data files exist and have the expected columns.
    Doctor,

    /// Show version information.
    Version,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all config values.
    List,
    /// Get a specific config key.
    Get { key: String },
}

/// Warnings from the binary and `genrescope_core`; the target matches by prefix.
const DEFAULT_LOG_FILTER: &str = "genrescope=warn";

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        let code = err
            .downcast_ref::<GenrescopeError>()
            .map(GenrescopeError::exit_code)
            .unwrap_or(ExitCode::GeneralError);
        std::process::exit(code as i32);
    }
}

fn run(cli: Cli) -> Result<()> {
    let start = Instant::now();
    let json_output = cli.json || std::env::var("GENRESCOPE_JSON").as_deref() == Ok("1");

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    if let Some(dir) = cli
        .data_dir
        .or_else(|| std::env::var_os("GENRESCOPE_DATA_DIR").map(PathBuf::from))
    {
        config.set_data_dir(dir);
    }
    tracing::debug!(books = %config.books_path().display(), "config loaded");

    match cli.command {
        None => {
            let store = DataStore::open(&config);
            let stdin = io::stdin();
            let stdout = io::stdout();
            let mut rng = rand::thread_rng();
            Shell::new(&store, &config.shell, &config.author, stdin.lock(), stdout.lock())
                .run(&mut rng)?;
        }

        Some(Commands::Genres) => {
            let store = DataStore::open(&config);
            let genres = store.list_genres()?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": genres.tokens(), "total": genres.tokens().len() },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if genres.tokens().is_empty() {
                println!("No genres found. Check the data files with `genrescope doctor`.");
            } else {
                for chunk in genres.chunks(config.shell.genres_per_line) {
                    println!("{}", chunk.join(", "));
                }
            }
        }

        Some(Commands::Analyze { genre, seed }) => {
            let store = DataStore::open(&config);
            let genres = store.list_genres()?;
            if !genres.contains(&genre) || genre == genrescope_core::EXIT_SENTINEL {
                let dur = start.elapsed().as_millis();
                if json_output {
                    print_json(&serde_json::json!({"status":"error","error":"not_found","message":format!("Unknown genre: {genre}"),"meta":{"duration_ms":dur}}))?;
                } else {
                    eprintln!("Unknown genre: {genre}. Run `genrescope genres` to list them.");
                }
                std::process::exit(ExitCode::NotFound as i32);
            }

            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let report = store.report(&genre, &mut rng)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":report,"meta":{"duration_ms":dur}}))?;
            } else {
                let avg = report.average_rating.map(format_rating).unwrap_or_else(|| "-".into());
                let rel = report.relative_rating.map(format_rating).unwrap_or_else(|| "-".into());
                println!("Genre:           {genre}");
                println!("Average rating:  {avg}");
                println!("Relative rating: {rel}%");
                if report.films.is_empty() {
                    println!("Films:           none");
                } else {
                    println!("Films:");
                    for f in &report.films {
                        println!("  {:>2}. {} ({})", f.rank, f.film, format_rating(f.rating));
                    }
                }
                if report.books.is_empty() {
                    println!("Books:           none");
                } else {
                    println!("Books:");
                    for b in &report.books {
                        println!("  {b}");
                    }
                }
            }
        }

        Some(Commands::Export { output }) => {
            let path = output.unwrap_or_else(|| config.export_path());
            let store = DataStore::open(&config);
            store.export_csv(&path)?;
            let rows = store.merged_table()?.len();
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"path":path,"rows":rows},"meta":{"duration_ms":dur}}))?;
            } else {
                println!("Exported {rows} row(s) to {}", path.display());
            }
        }

        // ── Config ─────────────────────────────────────────────────────────

        Some(Commands::Config { action }) => {
            let dur = start.elapsed().as_millis();
            let kv = config_key_values(&config);
            match action {
                ConfigAction::List => {
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":kv,"meta":{"duration_ms":dur}}))?;
                    } else {
                        for (k, v) in &kv {
                            println!("{k} = {v}");
                        }
                    }
                }
                ConfigAction::Get { key } => match kv.get(key.as_str()) {
                    Some(val) => {
                        if json_output {
                            print_json(&serde_json::json!({"status":"ok","data":{"key":key,"value":val},"meta":{"duration_ms":dur}}))?;
                        } else {
                            println!("{val}");
                        }
                    }
                    None => {
                        eprintln!("Unknown config key: {key}");
                        std::process::exit(ExitCode::NotFound as i32);
                    }
                },
            }
        }

        // ── Doctor ─────────────────────────────────────────────────────────

        Some(Commands::Doctor) => {
            let config_path = cli.config.unwrap_or_else(AppConfig::config_path);
            if config_path.exists() {
                println!("✓ Config: {}", config_path.display());
            } else {
                println!("○ Config: not found (using defaults)");
            }

            let checks: [(&str, PathBuf, TableFormat, &[&str]); 3] = [
                ("Books", config.books_path(), TableFormat::CSV, &BOOK_COLUMNS[..]),
                ("Films", config.films_path(), TableFormat::TSV, &FILM_COLUMNS[..]),
                ("Ratings", config.ratings_path(), TableFormat::TSV, &RATING_COLUMNS[..]),
            ];
            let mut issues = 0;
            for (label, path, format, columns) in checks {
                match read_projected(&path, format, columns) {
                    Ok(rows) => println!("✓ {label}: {} ({} rows)", path.display(), rows.len()),
                    Err(e) => {
                        issues += 1;
                        println!("✗ {label}: {e}");
                    }
                }
            }

            if issues == 0 {
                let store = DataStore::open(&config);
                let table = store.merged_table()?;
                println!(
                    "✓ Merged: {} rows, {} with adaptations",
                    table.len(),
                    table.adapted_count()
                );
                println!("\nAll checks passed ✓");
            } else {
                println!("\n{issues} issues found");
                std::process::exit(ExitCode::DataSourceError as i32);
            }
        }

        // ── Version ────────────────────────────────────────────────────────

        Some(Commands::Version) => {
            let version = env!("CARGO_PKG_VERSION");
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"version":version},"meta":{"duration_ms":dur}}))?;
            } else {
                println!("genrescope v{version}");
            }
        }
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn print_json(val: &serde_json::Value) -> Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", serde_json::to_string_pretty(val)?)?;
    Ok(())
}

fn config_key_values(config: &AppConfig) -> BTreeMap<&'static str, String> {
    let mut map = BTreeMap::new();
    map.insert("data_dir", config.data.data_dir.clone());
    map.insert("books_path", config.books_path().to_string_lossy().to_string());
    map.insert("films_path", config.films_path().to_string_lossy().to_string());
    map.insert("ratings_path", config.ratings_path().to_string_lossy().to_string());
    map.insert("export_path", config.export_path().to_string_lossy().to_string());
    map.insert("author.surname", config.author.surname.clone());
    map.insert("author.full_name", config.author.full_name.clone());
    map.insert("recommend.max_books", config.recommend.max_books.to_string());
    map.insert("shell.typing_delay_ms", config.shell.typing_delay_ms.to_string());
    map.insert("shell.genres_per_line", config.shell.genres_per_line.to_string());
    map.insert("shell.color", config.shell.color.to_string());
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_filter_is_one_directive() {
        let filter = EnvFilter::try_new(DEFAULT_LOG_FILTER).unwrap();
        assert_eq!(filter.to_string(), "genrescope=warn");
    }

    #[test]
    fn test_config_keys_cover_all_sections() {
        let kv = config_key_values(&AppConfig::default());
        assert_eq!(kv["author.surname"], "Forster");
        assert_eq!(kv["recommend.max_books"], "5");
        assert!(kv.contains_key("shell.color"));
    }
}
