use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};

use crate::error::{GenrescopeError, Result};

/// Cell values the catalogs use for "missing". `\N` is deliberately absent:
/// IMDb dumps use it, and it survives as a literal string.
const NULL_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "#N/A N/A",
    "#NA", "<NA>", "-1.#IND", "-1.#QNAN", "1.#IND", "1.#QNAN",
];

/// Delimited-file dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableFormat {
    pub delimiter: u8,
    /// Honour `"` quoting. Off for IMDb dumps, which contain stray quotes.
    pub quoting: bool,
}

impl TableFormat {
    pub const CSV: Self = Self {
        delimiter: b',',
        quoting: true,
    };

    pub const TSV: Self = Self {
        delimiter: b'\t',
        quoting: false,
    };
}

/// A projected row: one entry per requested column, `None` for null cells.
pub type ProjectedRow = Vec<Option<String>>;

/// Returns `None` for empty cells and the usual missing-value markers.
pub fn non_null(cell: &str) -> Option<&str> {
    if NULL_MARKERS.contains(&cell) {
        None
    } else {
        Some(cell)
    }
}

/// Read `path` and project every row onto `columns`, in that order.
pub fn read_projected(path: &Path, format: TableFormat, columns: &[&str]) -> Result<Vec<ProjectedRow>> {
    let file = File::open(path).map_err(|e| GenrescopeError::unavailable(path, e))?;
    read_projected_from(path, file, format, columns)
}

/// Like [`read_projected`], reading from an already open source. `path` is
/// only used to label errors.
pub fn read_projected_from<R: Read>(
    path: &Path,
    reader: R,
    format: TableFormat,
    columns: &[&str],
) -> Result<Vec<ProjectedRow>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(format.delimiter)
        .quoting(format.quoting)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let headers = reader
        .byte_headers()
        .map_err(|e| GenrescopeError::unavailable(path, e))?
        .clone();

    let indices = columns
        .iter()
        .map(|name| {
            headers
                .iter()
                .position(|h| String::from_utf8_lossy(h).trim_start_matches('\u{feff}') == *name)
                .ok_or_else(|| GenrescopeError::SchemaMismatch {
                    path: path.to_path_buf(),
                    column: name.to_string(),
                })
        })
        .collect::<Result<Vec<usize>>>()?;

    let mut rows = Vec::new();
    let mut record = ByteRecord::new();
    loop {
        match reader.read_byte_record(&mut record) {
            Ok(true) => rows.push(project(&record, &indices)),
            Ok(false) => break,
            Err(e) => return Err(GenrescopeError::unavailable(path, e)),
        }
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "read table");
    Ok(rows)
}

fn project(record: &ByteRecord, indices: &[usize]) -> ProjectedRow {
    indices
        .iter()
        .map(|&i| {
            // Short rows are tolerated; missing trailing cells are null.
            let raw = record.get(i).unwrap_or_default();
            let cell = String::from_utf8_lossy(raw);
            non_null(&cell).map(str::to_string)
        })
        .collect()
}
