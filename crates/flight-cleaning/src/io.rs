//! Reading and writing flight tables as CSV.

use crate::error::{CleaningError, Result};
use anyhow::Context;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, info};

/// Cell texts read as missing, in addition to empty fields.
pub const NULL_MARKERS: [&str; 5] = ["NA", "N/A", "null", "NULL", "NaN"];

/// Rows scanned to infer column dtypes on the first read attempt.
const INFER_SCHEMA_ROWS: usize = 100;

/// Read attempts in order: sampled inference, full-scan inference, then
/// full-scan inference with quoting disabled.
const READ_ATTEMPTS: [(Option<usize>, bool); 3] = [
    (Some(INFER_SCHEMA_ROWS), true),
    (None, true),
    (None, false),
];

fn read_options(infer_schema_length: Option<usize>, quoted: bool) -> CsvReadOptions {
    let null_values = NullValues::AllColumns(NULL_MARKERS.iter().map(|m| (*m).into()).collect());
    let quote_char = if quoted { Some(b'"') } else { None };
    let parse_options = CsvParseOptions::default()
        .with_missing_is_null(true)
        .with_null_values(Some(null_values))
        .with_quote_char(quote_char);

    CsvReadOptions::default()
        .with_infer_schema_length(infer_schema_length)
        .with_has_header(true)
        .with_parse_options(parse_options)
}

/// Load a headered CSV file.
///
/// Dtypes are inferred from the first rows. If a later cell does not fit the
/// inferred dtype, the file is read again with every row scanned, so such a
/// column arrives as text and is left to type coercion. A missing,
/// unreadable or unparsable file is reported as
/// [`CleaningError::SourceUnavailable`].
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let shown = path.display().to_string();

    if !path.is_file() {
        return Err(CleaningError::source_unavailable(shown, "file not found"));
    }

    let mut last_error = None;
    for (infer_schema_length, quoted) in READ_ATTEMPTS {
        let attempt = read_options(infer_schema_length, quoted)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish());
        match attempt {
            Ok(df) => {
                info!("Loaded '{}': {} rows x {} columns", shown, df.height(), df.width());
                return Ok(df);
            }
            Err(e) => {
                debug!(
                    "Loading '{}' (infer rows: {:?}, quoted: {}) failed: {}",
                    shown, infer_schema_length, quoted, e
                );
                last_error = Some(e);
            }
        }
    }

    Err(CleaningError::source_unavailable(
        shown,
        last_error.map_or_else(|| "unreadable".to_string(), |e| e.to_string()),
    ))
}

/// Write a table as CSV with a header row and no index column.
///
/// Missing parent directories are created.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory '{}'", parent.display()))?;
    }

    let mut file = File::create(path)
        .with_context(|| format!("Failed to create '{}'", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)
        .with_context(|| format!("Failed to write '{}'", path.display()))?;

    info!("Dataset saved: {}", path.display());
    Ok(())
}
