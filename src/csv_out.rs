use std::io::{self, Write};
use std::path::Path;

use csv::WriterBuilder;

use crate::error::ExtractError;
use crate::model::{OUTPUT_HEADERS, ResultTable};

fn write_records<W: Write>(
    writer: &mut csv::Writer<W>,
    table: &ResultTable,
) -> Result<(), ExtractError> {
    writer.write_record(OUTPUT_HEADERS)?;
    for row in &table.rows {
        writer.write_record(row.to_record())?;
    }
    writer.flush()?;
    Ok(())
}

pub(crate) fn write_csv(path: &Path, table: &ResultTable, delimiter: u8) -> Result<(), ExtractError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    write_records(&mut writer, table)
}

/// Renders rows as CSV with a `customer,crop,bags,quantity_kg` header line.
/// The header is written even when there are no rows.
///
/// # Errors
///
/// Returns an error if the CSV writer fails.
pub fn write_csv_to_string(table: &ResultTable, delimiter: u8) -> Result<String, ExtractError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());
    write_records(&mut writer, table)?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ExtractError::Csv(error.into_error().into()))?;
    utf8_output(bytes)
}

fn utf8_output(bytes: Vec<u8>) -> Result<String, ExtractError> {
    String::from_utf8(bytes).map_err(|error| {
        ExtractError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid utf-8 csv output: {error}"),
        ))
    })
}

/// Renders rows as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn rows_to_json_string(table: &ResultTable) -> Result<String, ExtractError> {
    Ok(serde_json::to_string_pretty(table)?)
}
