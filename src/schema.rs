//! Schema projection from variable descriptors.
//!
//! Derives the index-aligned column arrays a reader needs: names, semantic
//! types, fixed-width byte ranges and storage dtypes. Positional fields fail
//! loudly here, since a single bad offset misaligns every column after it.

use crate::constants::format_types;
use crate::error::{DdiError, FormatError, Result};
use crate::models::{ColumnDtype, ColumnSpec, VariableDescriptor};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Parallel column arrays derived from a codebook, aligned by variable position
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaProjection {
    pub columns: Vec<Option<String>>,
    pub column_types: Vec<Option<String>>,
    pub column_specs: Vec<ColumnSpec>,
    pub column_dtypes: Vec<ColumnDtype>,
    /// Implied decimal places per column
    pub column_decimals: Vec<u32>,
}

impl SchemaProjection {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column name for output; unnamed variables get a positional name
    pub fn column_name(&self, index: usize) -> String {
        match self.columns.get(index) {
            Some(Some(name)) => name.clone(),
            _ => format!("column_{}", index + 1),
        }
    }

    /// Position of the named column; the last one when a name repeats
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .rposition(|column| column.as_deref() == Some(name))
    }

    /// Byte length of a full record: the furthest column end
    pub fn record_width(&self) -> usize {
        self.column_specs
            .iter()
            .map(|spec| spec.end)
            .max()
            .unwrap_or(0)
    }

    /// Polars schema with one field per column
    pub fn polars_schema(&self) -> Schema {
        let fields = (0..self.len())
            .map(|i| Field::new(self.column_name(i).into(), self.column_dtypes[i].to_polars()));
        Schema::from_iter(fields)
    }
}

/// Convert a decimal-digit string to an integer.
///
/// Surrounding ASCII whitespace is ignored. Empty input, signs, any other
/// non-digit character and overflow all fail with [`FormatError`].
pub fn to_int(text: &str) -> std::result::Result<usize, FormatError> {
    let trimmed = text.trim_ascii();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FormatError::new(text));
    }
    trimmed.parse::<usize>().map_err(|_| FormatError::new(text))
}

/// Project the ordered variable descriptors into column arrays
pub fn project_schema(variables: &[VariableDescriptor]) -> Result<SchemaProjection> {
    let mut projection = SchemaProjection::default();

    for (index, variable) in variables.iter().enumerate() {
        let spec = column_spec(variable, index)?;
        let decimals = implied_decimals(variable, index)?;

        projection.columns.push(variable.name.clone());
        projection.column_types.push(variable.field_type.clone());
        projection.column_specs.push(spec);
        projection
            .column_dtypes
            .push(classify_dtype(variable.data_type.as_deref(), decimals));
        projection.column_decimals.push(decimals);
    }

    debug!(
        "Projected {} columns, record width {}",
        projection.len(),
        projection.record_width()
    );
    Ok(projection)
}

/// Fixed-width spec for one variable: `(StartPos - 1, EndPos)`
pub fn column_spec(variable: &VariableDescriptor, index: usize) -> Result<ColumnSpec> {
    let name = variable.display_name(index);
    let start = position(&name, "StartPos", variable.location_start_pos.as_deref())?;
    let end = position(&name, "EndPos", variable.location_end_pos.as_deref())?;

    if start == 0 {
        return Err(DdiError::schema(name, "StartPos is 1-indexed and cannot be 0"));
    }
    if end < start {
        return Err(DdiError::schema(
            name,
            format!("EndPos {end} is before StartPos {start}"),
        ));
    }

    let spec = ColumnSpec::new(start - 1, end);
    if let Some(width) = variable.location_width.as_deref() {
        match to_int(width) {
            Ok(width) if width != spec.width() => warn!(
                "Variable {} declares width {} but spans {} bytes",
                name,
                width,
                spec.width()
            ),
            Ok(_) => {}
            Err(_) => warn!("Variable {} has non-numeric width {:?}", name, width),
        }
    }
    Ok(spec)
}

fn position(variable: &str, attribute: &str, value: Option<&str>) -> Result<usize> {
    let value = value
        .ok_or_else(|| DdiError::schema(variable, format!("missing {attribute}")))?;
    to_int(value).map_err(|e| {
        DdiError::schema_format(variable, format!("{attribute} is not numeric"), e)
    })
}

fn implied_decimals(variable: &VariableDescriptor, index: usize) -> Result<u32> {
    let Some(raw) = variable.decimals.as_deref() else {
        return Ok(0);
    };
    let name = variable.display_name(index);
    let decimals = to_int(raw)
        .map_err(|e| DdiError::schema_format(&name, "dcml is not numeric", e))?;
    u32::try_from(decimals)
        .ok()
        .filter(|d| *d <= 18)
        .ok_or_else(|| DdiError::schema(name, format!("dcml {decimals} is out of range")))
}

/// Storage type from the declared format type and implied decimals
pub fn classify_dtype(data_type: Option<&str>, decimals: u32) -> ColumnDtype {
    match data_type {
        Some(format_types::NUMERIC) if decimals > 0 => ColumnDtype::Float,
        Some(format_types::NUMERIC) => ColumnDtype::Integer,
        Some(format_types::CHARACTER) => ColumnDtype::Text,
        // Undeclared or unrecognized formats are read as text
        _ => ColumnDtype::Text,
    }
}
