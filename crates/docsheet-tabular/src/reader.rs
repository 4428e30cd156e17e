use std::path::Path;

use calamine::{open_workbook, Reader, Xlsx, XlsxError};
use serde_json::Value;

use docsheet_core::{DocsheetError, Record, Result};

use crate::materializer::TableFormat;

/// Read a materialized table back into rows keyed by header.
///
/// Every value comes back as a string and empty cells as `""`: numbers and
/// booleans do not survive the round trip with their original JSON types.
pub fn read_table(path: &Path) -> Result<Vec<Record>> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let (header, body) = match TableFormat::from_name(name)? {
        TableFormat::Xlsx => read_xlsx(path)?,
        TableFormat::Csv => read_csv(path)?,
    };

    Ok(body
        .into_iter()
        .map(|cells| {
            header
                .iter()
                .enumerate()
                .map(|(i, col)| {
                    let cell = cells.get(i).cloned().unwrap_or_default();
                    (col.clone(), Value::String(cell))
                })
                .collect()
        })
        .collect())
}

type Grid = (Vec<String>, Vec<Vec<String>>);

fn read_xlsx(path: &Path) -> Result<Grid> {
    let read_error = |e: XlsxError| {
        DocsheetError::Materialization(format!("cannot read {}: {e}", path.display()))
    };

    let mut workbook: Xlsx<_> = open_workbook(path).map_err(read_error)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DocsheetError::Materialization(format!("{} has no sheets", path.display())))?
        .map_err(read_error)?;

    let mut rows = range.rows();
    let header = match rows.next() {
        Some(cells) => cells.iter().map(|c| c.to_string()).collect(),
        None => return Ok((Vec::new(), Vec::new())),
    };
    let body = rows
        .map(|cells| cells.iter().map(|c| c.to_string()).collect())
        .collect();
    Ok((header, body))
}

fn read_csv(path: &Path) -> Result<Grid> {
    let read_error = |e: csv::Error| {
        DocsheetError::Materialization(format!("cannot read {}: {e}", path.display()))
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(read_error)?;
    let header = reader
        .headers()
        .map_err(read_error)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut body = Vec::new();
    for record in reader.records() {
        body.push(record.map_err(read_error)?.iter().map(str::to_string).collect());
    }
    Ok((header, body))
}
