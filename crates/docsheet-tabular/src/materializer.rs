use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Workbook, XlsxError};
use serde_json::Value;
use tracing::{info, warn};

use docsheet_core::{DocsheetError, Record, Result};

use crate::table::{cell_text, Table};

const XLSX_MAX_ROWS: usize = 1_048_576;
const XLSX_MAX_COLUMNS: usize = 16_384;

/// Output encoding, chosen from the output name's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Xlsx,
    Csv,
}

impl TableFormat {
    pub fn from_name(name: &str) -> Result<Self> {
        match Path::new(name).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => Ok(Self::Xlsx),
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Ok(Self::Csv),
            Some(ext) => Err(DocsheetError::InvalidRequest(format!(
                "unsupported output format '.{ext}', expected .xlsx or .csv"
            ))),
            None => Err(DocsheetError::InvalidRequest(format!(
                "output name '{name}' has no extension"
            ))),
        }
    }
}

/// A bare file name: no directories, no parent references.
pub fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['/', '\\'])
        && !name.contains("..")
        && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
}

/// `"<label>_<8 hex chars>.xlsx"`, unique per call.
pub fn unique_output_name(label: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{label}_{}.xlsx", &id[..8])
}

fn xlsx_error(e: XlsxError) -> DocsheetError {
    DocsheetError::Materialization(format!("xlsx write failed: {e}"))
}

/// Writes extracted records as a single-sheet table into one directory.
/// Files are created exclusively: an existing output name is an error.
#[derive(Debug, Clone)]
pub struct Materializer {
    output_dir: PathBuf,
}

impl Materializer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn materialize(&self, records: &[Record], output_name: &str) -> Result<PathBuf> {
        if !is_safe_file_name(output_name) {
            return Err(DocsheetError::InvalidRequest(format!(
                "invalid output name '{output_name}'"
            )));
        }
        let format = TableFormat::from_name(output_name)?;

        let table = Table::from_records(records);
        if table.is_empty() {
            return Err(DocsheetError::Materialization(
                "no records to materialize".into(),
            ));
        }

        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            DocsheetError::Materialization(format!(
                "cannot create output directory {}: {e}",
                self.output_dir.display()
            ))
        })?;

        let path = self.output_dir.join(output_name);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => DocsheetError::OutputExists(output_name.to_string()),
                _ => DocsheetError::Materialization(format!(
                    "cannot create {}: {e}",
                    path.display()
                )),
            })?;

        let written = match format {
            TableFormat::Xlsx => write_xlsx(&table, file),
            TableFormat::Csv => write_csv(&table, file),
        };
        if let Err(e) = written {
            if let Err(cleanup) = std::fs::remove_file(&path) {
                warn!(path = %path.display(), error = %cleanup, "Failed to remove partial output");
            }
            return Err(e);
        }

        info!(
            path = %path.display(),
            rows = table.rows.len(),
            columns = table.columns.len(),
            "Materialized table"
        );
        Ok(path)
    }
}

fn write_xlsx(table: &Table, file: File) -> Result<()> {
    if table.rows.len() + 1 > XLSX_MAX_ROWS || table.columns.len() > XLSX_MAX_COLUMNS {
        return Err(DocsheetError::Materialization(format!(
            "table of {} rows x {} columns exceeds xlsx limits",
            table.rows.len(),
            table.columns.len()
        )));
    }

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, name) in table.columns.iter().enumerate() {
        sheet.write_string(0, col as u16, name).map_err(xlsx_error)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let row_idx = r as u32 + 1;
        for (c, value) in row.iter().enumerate() {
            let col = c as u16;
            match value {
                Value::Null => {}
                Value::Bool(b) => {
                    sheet.write_boolean(row_idx, col, *b).map_err(xlsx_error)?;
                }
                Value::Number(n) => match n.as_f64() {
                    Some(f) => {
                        sheet.write_number(row_idx, col, f).map_err(xlsx_error)?;
                    }
                    None => {
                        sheet
                            .write_string(row_idx, col, n.to_string())
                            .map_err(xlsx_error)?;
                    }
                },
                other => {
                    sheet
                        .write_string(row_idx, col, cell_text(other))
                        .map_err(xlsx_error)?;
                }
            }
        }
    }

    workbook.save_to_writer(file).map_err(xlsx_error)
}

fn write_csv(table: &Table, file: File) -> Result<()> {
    let csv_error =
        |e: csv::Error| DocsheetError::Materialization(format!("csv write failed: {e}"));

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(&table.columns).map_err(csv_error)?;
    for row in &table.rows {
        writer
            .write_record(row.iter().map(cell_text))
            .map_err(csv_error)?;
    }
    writer
        .flush()
        .map_err(|e| DocsheetError::Materialization(format!("csv flush failed: {e}")))
}
