use std::fs;
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;

use crate::error::Result;
use crate::models::MergedTable;

const HEADER: [&str; 6] = ["", "book", "bookgenre", "film", "genre", "rating"];

/// Write the merged table as CSV with a leading 0-based index column.
/// Null cells are written empty.
pub fn write_csv<W: Write>(table: &MergedTable, writer: W) -> Result<()> {
    let mut out = WriterBuilder::new().from_writer(writer);
    out.write_record(HEADER)?;

    for (index, row) in table.iter().enumerate() {
        out.write_record([
            index.to_string(),
            row.book.clone(),
            row.bookgenre.clone().unwrap_or_default(),
            row.film.clone().unwrap_or_default(),
            row.genre.clone().unwrap_or_default(),
            row.rating.map(format_rating).unwrap_or_default(),
        ])?;
    }

    out.flush()?;
    Ok(())
}

/// Export the merged table to `path` (UTF-8), creating parent directories.
pub fn export_csv(table: &MergedTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    write_csv(table, file)?;
    tracing::info!(path = %path.display(), rows = table.len(), "exported merged table");
    Ok(())
}

/// Whole ratings keep one decimal (`8.0`), matching the source datasets.
pub fn format_rating(rating: f64) -> String {
    if rating.fract() == 0.0 {
        format!("{rating:.1}")
    } else {
        rating.to_string()
    }
}
