//! CSV encoding for telemetry sessions.
//!
//! Fields containing a comma, double quote, CR or LF are quoted, with inner
//! quotes doubled. Records end with `\n`; the reader also accepts `\r\n`.

use std::io::{Read, Write};

use csv::{ErrorKind, QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use legged_errors::TelemetryError;

use crate::store::TelemetryStore;

fn telemetry_error(err: csv::Error) -> TelemetryError {
    let line = err
        .position()
        .and_then(|pos| usize::try_from(pos.line()).ok())
        .unwrap_or(0);
    match err.into_kind() {
        ErrorKind::Io(io) => TelemetryError::Io(io),
        ErrorKind::UnequalLengths { expected_len, len, .. } => TelemetryError::parse(
            line,
            format!("expected {expected_len} fields, found {len}"),
        ),
        ErrorKind::Utf8 { err, .. } => TelemetryError::parse(line, err.to_string()),
        other => TelemetryError::parse(line, format!("{other:?}")),
    }
}

/// Write `store` as CSV: a header row, then one row per recorded row, with
/// empty fields for missing cells.
///
/// # Errors
///
/// Returns [`TelemetryError::Io`] on write failure.
pub fn write_csv<W: Write>(store: &TelemetryStore, out: &mut W) -> Result<(), TelemetryError> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .quote_style(QuoteStyle::Necessary)
        .from_writer(out);

    writer
        .write_record(store.column_names())
        .map_err(telemetry_error)?;

    let columns = store.column_count();
    let mut rendered: Vec<String> = Vec::with_capacity(columns);
    for row in 0..store.row_count() {
        rendered.clear();
        rendered.extend(
            (0..columns).map(|col| store.cell(row, col).map(ToString::to_string).unwrap_or_default()),
        );
        writer.write_record(&rendered).map_err(telemetry_error)?;
    }
    writer.flush()?;
    Ok(())
}

/// A parsed CSV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    /// Header fields
    pub header: Vec<String>,
    /// Data records, each as long as the header
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Position of a header field.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Every field of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or_default())
                .collect(),
        )
    }

    /// Numeric values of one column; empty fields become `None`.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Parse`] for a non-empty field that is not a
    /// number. The reported line assumes one line per record.
    pub fn numeric_column(&self, name: &str) -> Result<Option<Vec<Option<f64>>>, TelemetryError> {
        let Some(fields) = self.column(name) else {
            return Ok(None);
        };
        fields
            .into_iter()
            .enumerate()
            .map(|(i, field)| {
                if field.is_empty() {
                    Ok(None)
                } else {
                    field.parse::<f64>().map(Some).map_err(|e| {
                        TelemetryError::parse(i + 2, format!("column {name}: {e}"))
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

/// Parse CSV written by [`write_csv`] (or any RFC 4180 producer).
///
/// Blank lines are skipped.
///
/// # Errors
///
/// [`TelemetryError::Io`] on read failure, [`TelemetryError::Parse`] for a
/// missing header, invalid UTF-8 or a record whose width differs from the
/// header.
pub fn read_csv<R: Read>(input: R) -> Result<CsvTable, TelemetryError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(input);

    let header: Vec<String> = reader
        .headers()
        .map_err(telemetry_error)?
        .iter()
        .map(str::to_owned)
        .collect();
    if header.is_empty() {
        return Err(TelemetryError::parse(1, "missing header"));
    }

    let rows = reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_owned).collect())
                .map_err(telemetry_error)
        })
        .collect::<Result<Vec<Vec<String>>, _>>()?;

    Ok(CsvTable { header, rows })
}
