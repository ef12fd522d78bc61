//! Loading [`Record`]s from CSV or JSON files.

use std::{fs::File, io::Read, path::Path};

use tracing::debug;

use crate::{Error, Record, Result};

/// Load records from `path`, picking the format from the file extension
/// (`.csv` or `.json`).
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let file = File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let records = match extension.as_str() {
        "csv" => records_from_csv(file)?,
        "json" => records_from_json(file)?,
        other => return Err(Error::UnsupportedFormat(other.to_string())),
    };
    debug!(path = %path.display(), num_records = records.len(), "Loaded records");
    Ok(records)
}

/// Read CSV with a header row containing `text`/`label` (or
/// `description`/`city`) columns. Extra columns are ignored.
pub fn records_from_csv<R: Read>(reader: R) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    reader
        .deserialize()
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Read a JSON array of `{"text": .., "label": ..}` objects.
pub fn records_from_json<R: Read>(reader: R) -> Result<Vec<Record>> {
    Ok(serde_json::from_reader(reader)?)
}
