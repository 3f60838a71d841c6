use crate::domain::model::AggregateTable;
use crate::utils::error::{EtlError, Result};
use csv::WriterBuilder;
use std::io::Write;

/// Header row of field names, one row per card, no index column.
pub fn write_table<W: Write>(table: &AggregateTable, writer: W, delimiter: u8) -> Result<()> {
    let mut wtr = WriterBuilder::new().delimiter(delimiter).from_writer(writer);

    wtr.write_record(table.headers())?;
    for row in table.rows() {
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn render_table(table: &AggregateTable, delimiter: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_table(table, &mut buffer, delimiter)?;
    Ok(buffer)
}

pub fn render_table_string(table: &AggregateTable, delimiter: u8) -> Result<String> {
    String::from_utf8(render_table(table, delimiter)?).map_err(|e| EtlError::ProcessingError {
        message: format!("Rendered table is not valid UTF-8: {}", e),
    })
}
