use std::fs::File;
use std::io::Write;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::LitefetchError;
use crate::shaper::{CellValue, QueryResult};

/// Write query results as RFC 4180 CSV to a file.
pub fn write_csv(result: &QueryResult, path: &Path) -> Result<(), LitefetchError> {
    let file = File::create(path)?;
    write_csv_to_writer(result, file)
}

/// Write query results as RFC 4180 CSV: CRLF line endings, header row
/// first, NULL as an empty field, blobs as base64.
pub fn write_csv_to_writer<W: Write>(result: &QueryResult, writer: W) -> Result<(), LitefetchError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);

    csv_writer
        .write_record(&result.columns)
        .map_err(csv_error)?;

    for row in &result.rows {
        csv_writer
            .write_record(row.iter().map(cell_to_field))
            .map_err(csv_error)?;
    }

    csv_writer.flush()?;
    Ok(())
}

fn cell_to_field(value: &CellValue) -> String {
    match value {
        CellValue::Integer(i) => i.to_string(),
        CellValue::Real(f) => f.to_string(),
        CellValue::Text(s) => s.clone(),
        CellValue::Blob(bytes) => STANDARD.encode(bytes),
        CellValue::Null => String::new(),
    }
}

fn csv_error(e: csv::Error) -> LitefetchError {
    LitefetchError::Format {
        message: format!("failed to write CSV: {e}"),
    }
}
