use std::fs::File;
use std::io::Read;

use camino::Utf8Path;
use csv::{ReaderBuilder, StringRecord, Trim};

use crate::config::Columns;
use crate::domain::PhotoRow;
use crate::error::GrabError;

const BOM: char = '\u{feff}';

#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    url: usize,
    id: Option<usize>,
    date: Option<usize>,
    time: Option<usize>,
}

/// Reads `path` and keeps the rows that have a photo URL, in file order.
pub fn load_rows(path: &Utf8Path, columns: &Columns) -> Result<Vec<PhotoRow>, GrabError> {
    let file = File::open(path.as_std_path()).map_err(|err| GrabError::DatasetRead {
        path: path.as_std_path().to_path_buf(),
        message: err.to_string(),
    })?;
    read_rows(file, columns)
}

pub fn read_rows<R: Read>(reader: R, columns: &Columns) -> Result<Vec<PhotoRow>, GrabError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|err| GrabError::DatasetParse(err.to_string()))?
        .clone();
    let index = resolve_columns(&headers, columns)?;

    let mut rows = Vec::new();
    for (position, record) in reader.records().enumerate() {
        let record = record.map_err(|err| GrabError::DatasetParse(err.to_string()))?;
        let Some(url) = cell(&record, Some(index.url)) else {
            tracing::debug!(line = position + 1, "skipping row without photo URL");
            continue;
        };
        rows.push(PhotoRow {
            line: position as u64 + 1,
            url,
            participant: cell_or_empty(&record, index.id),
            date: cell_or_empty(&record, index.date),
            time: cell_or_empty(&record, index.time),
        });
    }
    Ok(rows)
}

/// The URL column must exist; the others are looked up per row so a missing
/// one fails rows individually.
fn resolve_columns(headers: &StringRecord, columns: &Columns) -> Result<ColumnIndex, GrabError> {
    let find = |name: &str| {
        headers
            .iter()
            .position(|header| header.trim_start_matches(BOM) == name)
    };
    let url = find(&columns.url).ok_or_else(|| GrabError::MissingColumn(columns.url.clone()))?;
    let index = ColumnIndex {
        url,
        id: find(&columns.id),
        date: find(&columns.date),
        time: find(&columns.time),
    };
    for (name, position) in [
        (&columns.id, index.id),
        (&columns.date, index.date),
        (&columns.time, index.time),
    ] {
        if position.is_none() {
            tracing::warn!(column = %name, "dataset has no such column; every row will fail");
        }
    }
    Ok(index)
}

fn cell(record: &StringRecord, index: Option<usize>) -> Option<String> {
    record
        .get(index?)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Present-but-empty cells stay `Some("")`; only absent cells become `None`.
fn cell_or_empty(record: &StringRecord, index: Option<usize>) -> Option<String> {
    record.get(index?).map(str::to_string)
}
