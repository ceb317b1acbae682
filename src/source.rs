// 📂 Source Readers - CSV extracts → raw rows
//
// Transaction extracts open with a block of notes before the first data row;
// registry extracts with a single header line. Both are read as headerless,
// ragged CSV: a line that fails to parse is dropped, the rest carry on.

use crate::error::SourceError;
use crate::parser::{BuildingType, RawRow};
use csv::ReaderBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Lines before the first data row in a transaction extract
pub const TRANSACTION_PREAMBLE_LINES: usize = 16;

/// Lines before the first data row in a registry extract
pub const REGISTRY_HEADER_LINES: usize = 1;

/// Rows read from one file
#[derive(Debug, Clone, Default)]
pub struct SourceRead {
    pub path: PathBuf,
    pub rows: Vec<RawRow>,
    /// Lines the CSV reader could not parse
    pub unreadable: usize,
}

/// Read a UTF-8 CSV extract, skipping `skip_lines` leading lines.
pub fn read_rows(path: &Path, skip_lines: usize) -> Result<SourceRead, SourceError> {
    let bytes = fs::read(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let text = String::from_utf8(bytes).map_err(|_| SourceError::Encoding {
        path: path.to_path_buf(),
    })?;

    let read = parse_rows(&text, skip_lines);
    info!(
        path = %path.display(),
        rows = read.rows.len(),
        unreadable = read.unreadable,
        "read source file"
    );

    Ok(SourceRead {
        path: path.to_path_buf(),
        ..read
    })
}

/// Parse CSV text into raw rows after dropping `skip_lines` leading lines.
pub fn parse_rows(text: &str, skip_lines: usize) -> SourceRead {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let body = text.splitn(skip_lines + 1, '\n').nth(skip_lines).unwrap_or("");

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut read = SourceRead::default();
    for (index, result) in reader.records().enumerate() {
        match result {
            Ok(record) => {
                if record.iter().all(|cell| cell.trim().is_empty()) {
                    continue;
                }
                read.rows.push(RawRow::from_fields(record.iter()));
            }
            Err(err) => {
                debug!(line = index + skip_lines + 1, error = %err, "unreadable line");
                read.unreadable += 1;
            }
        }
    }

    read
}

/// A transaction extract and the building type its file name declares
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionSource {
    pub path: PathBuf,
    pub building_type: BuildingType,
}

impl TransactionSource {
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        Ok(TransactionSource {
            path: path.to_path_buf(),
            building_type: BuildingType::detect(file_name)?,
        })
    }

    pub fn read(&self, preamble_lines: usize) -> Result<SourceRead, SourceError> {
        read_rows(&self.path, preamble_lines)
    }
}
