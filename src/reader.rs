//! Microdata reading.
//!
//! Reads a fixed-width or comma-separated data file into a polars
//! `DataFrame` using a codebook's schema projection. Gzip input is detected
//! from the file's leading bytes and decompressed as a stream. Fixed-width
//! files are read line by line; delimited files go through polars' CSV reader.

use crate::codebook::Codebook;
use crate::config::{DataFormat, ReaderConfig};
use crate::constants::GZIP_MAGIC;
use crate::error::{DdiError, Result};
use crate::models::{ColumnDtype, ColumnSpec};
use crate::schema::SchemaProjection;
use flate2::read::MultiGzDecoder;
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::Path;
use tracing::debug;

/// Read a data file described by `codebook`
pub fn read_microdata(
    codebook: &Codebook,
    data_path: &Path,
    config: &ReaderConfig,
) -> Result<DataFrame> {
    let selected = select_columns(&codebook.schema, config.columns.as_deref())?;
    let format = config.resolve_format(data_path);
    debug!(
        "Reading {} as {:?} ({} of {} columns)",
        data_path.display(),
        format,
        selected.len(),
        codebook.schema.len()
    );

    let df = match format {
        DataFormat::FixedWidth => read_fixed_width(&codebook.schema, &selected, data_path, config)?,
        DataFormat::Delimited => read_delimited(&codebook.schema, &selected, data_path, config)?,
    };

    debug!("Read {} rows from {}", df.height(), data_path.display());
    Ok(df)
}

/// Open a data file, transparently decompressing gzip input
pub fn open_data_file(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let is_gzip = reader.fill_buf()?.starts_with(&GZIP_MAGIC);

    if is_gzip {
        debug!("Detected gzip compression: {}", path.display());
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

/// Column of the projection chosen for output
#[derive(Debug, Clone, PartialEq, Eq)]
struct SelectedColumn {
    index: usize,
    name: String,
}

/// Resolve requested names to projection positions, in codebook order
fn select_columns(
    schema: &SchemaProjection,
    requested: Option<&[String]>,
) -> Result<Vec<SelectedColumn>> {
    let mut indices: Vec<usize> = match requested {
        None => (0..schema.len()).collect(),
        Some(names) => names
            .iter()
            .map(|name| {
                schema
                    .position(name)
                    .ok_or_else(|| DdiError::unknown_variable(name))
            })
            .collect::<Result<_>>()?,
    };
    indices.sort_unstable();
    indices.dedup();

    let selected: Vec<SelectedColumn> = indices
        .into_iter()
        .map(|index| SelectedColumn {
            index,
            name: schema.column_name(index),
        })
        .collect();

    let mut seen = HashSet::new();
    for column in &selected {
        if !seen.insert(column.name.as_str()) {
            return Err(DdiError::schema(
                column.name.as_str(),
                "variable name appears more than once in the codebook",
            ));
        }
    }
    Ok(selected)
}

/// Values collected for one output column
enum ColumnBuffer {
    Integer(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnBuffer {
    fn new(dtype: ColumnDtype) -> Self {
        match dtype {
            ColumnDtype::Integer => ColumnBuffer::Integer(Vec::new()),
            ColumnDtype::Float => ColumnBuffer::Float(Vec::new()),
            ColumnDtype::Text => ColumnBuffer::Text(Vec::new()),
        }
    }

    fn push_null(&mut self) {
        match self {
            ColumnBuffer::Integer(values) => values.push(None),
            ColumnBuffer::Float(values) => values.push(None),
            ColumnBuffer::Text(values) => values.push(None),
        }
    }

    /// Coerce and append a trimmed, non-empty field; nothing is appended on error
    fn push(&mut self, raw: &str, decimals: u32) -> std::result::Result<(), String> {
        match self {
            ColumnBuffer::Integer(values) => {
                let value = raw
                    .parse::<i64>()
                    .map_err(|_| format!("{raw:?} is not an integer"))?;
                values.push(Some(value));
            }
            ColumnBuffer::Float(values) => {
                let value = parse_float(raw, decimals)
                    .ok_or_else(|| format!("{raw:?} is not a number"))?;
                values.push(Some(value));
            }
            ColumnBuffer::Text(values) => values.push(Some(raw.to_string())),
        }
        Ok(())
    }

    fn into_column(self, name: &str) -> Column {
        let series = match self {
            ColumnBuffer::Integer(values) => Series::new(name.into(), values),
            ColumnBuffer::Float(values) => Series::new(name.into(), values),
            ColumnBuffer::Text(values) => Series::new(name.into(), values),
        };
        Column::from(series)
    }
}

/// Parse a float, applying implied decimals when the field has no decimal point
fn parse_float(raw: &str, decimals: u32) -> Option<f64> {
    if decimals > 0 && !raw.contains('.') {
        let value = raw.parse::<i64>().ok()?;
        return Some(value as f64 / 10f64.powi(decimals as i32));
    }
    raw.parse::<f64>().ok()
}

/// Bytes of `record` covered by `spec`; `None` when the record is too short
fn slice_field(record: &[u8], spec: ColumnSpec) -> Option<&[u8]> {
    if spec.start >= record.len() {
        return None;
    }
    Some(&record[spec.start..spec.end.min(record.len())])
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn read_fixed_width(
    schema: &SchemaProjection,
    selected: &[SelectedColumn],
    path: &Path,
    config: &ReaderConfig,
) -> Result<DataFrame> {
    let mut reader = open_data_file(path)?;
    let mut buffers: Vec<ColumnBuffer> = selected
        .iter()
        .map(|column| ColumnBuffer::new(schema.column_dtypes[column.index]))
        .collect();

    let mut line = Vec::new();
    let mut line_number = 0usize;
    let mut rows = 0usize;

    loop {
        if config.n_max.is_some_and(|n_max| rows >= n_max) {
            break;
        }
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        line_number += 1;

        let record = trim_line_ending(&line);
        if record.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        for (buffer, column) in buffers.iter_mut().zip(selected) {
            let field = slice_field(record, schema.column_specs[column.index])
                .map(String::from_utf8_lossy);
            let value = field.as_deref().map(str::trim).filter(|v| !v.is_empty());

            let Some(value) = value else {
                buffer.push_null();
                continue;
            };

            let decimals = if config.implied_decimals {
                schema.column_decimals[column.index]
            } else {
                0
            };
            if let Err(reason) = buffer.push(value, decimals) {
                if config.ignore_errors {
                    buffer.push_null();
                } else {
                    return Err(DdiError::DataFile {
                        path: path.to_path_buf(),
                        line: line_number,
                        column: column.name.clone(),
                        reason,
                    });
                }
            }
        }
        rows += 1;
    }

    let columns: Vec<Column> = buffers
        .into_iter()
        .zip(selected)
        .map(|(buffer, column)| buffer.into_column(&column.name))
        .collect();
    Ok(DataFrame::new(columns)?)
}

fn read_delimited(
    schema: &SchemaProjection,
    selected: &[SelectedColumn],
    path: &Path,
    config: &ReaderConfig,
) -> Result<DataFrame> {
    let mut bytes = Vec::new();
    open_data_file(path)?.read_to_end(&mut bytes)?;

    // Every column is read as text, then cast to its codebook type
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_n_rows(config.n_max)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;

    for column in selected {
        let dtype = schema.column_dtypes[column.index].to_polars();
        let raw = df
            .column(&column.name)
            .map_err(|_| DdiError::ColumnType {
                path: path.to_path_buf(),
                column: column.name.clone(),
                reason: "column is missing from the header row".to_string(),
            })?;

        let typed = if config.ignore_errors {
            raw.cast(&dtype)?
        } else {
            raw.strict_cast(&dtype).map_err(|e| DdiError::ColumnType {
                path: path.to_path_buf(),
                column: column.name.clone(),
                reason: e.to_string(),
            })?
        };
        df.with_column(typed)?;
    }

    Ok(df.select(selected.iter().map(|column| column.name.as_str()))?)
}
