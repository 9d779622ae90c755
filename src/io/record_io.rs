use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use crate::model::forecast::ForecastDay;
use crate::model::record::SubtaskRecord;

/// Error type for record and forecast files
#[derive(Debug, thiserror::Error)]
pub enum RecordIoError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("could not serialize records: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// Read a whole text file (reports are plain markdown)
pub fn read_text(path: &Path) -> Result<String, RecordIoError> {
    fs::read_to_string(path).map_err(|e| RecordIoError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, RecordIoError> {
    let text = read_text(path)?;
    serde_json::from_str(&text).map_err(|e| RecordIoError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read a JSON array of subtask records
pub fn read_records(path: &Path) -> Result<Vec<SubtaskRecord>, RecordIoError> {
    read_json(path)
}

/// Read a JSON array of forecast days
pub fn read_forecast(path: &Path) -> Result<Vec<ForecastDay>, RecordIoError> {
    read_json(path)
}

/// Pretty-printed JSON with a trailing newline
pub fn to_json_string<T: Serialize + ?Sized>(value: &T) -> Result<String, RecordIoError> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    Ok(text)
}

/// Write records as pretty JSON, atomically
pub fn write_records(path: &Path, records: &[SubtaskRecord]) -> Result<(), RecordIoError> {
    let text = to_json_string(records)?;
    atomic_write(path, text.as_bytes()).map_err(|e| RecordIoError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), records = records.len(), "wrote records");
    Ok(())
}

/// Write `content` to `path` via a temp file in the same directory + rename
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
