//! Core data structures for codebook metadata.
//!
//! Defines the file metadata map, variable descriptors, categories and the
//! derived column layout types. Everything here is built once from a parsed
//! codebook and never mutated afterwards.

use polars::prelude::DataType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field name to text mapping sourced from the codebook's title and file-text blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileMetadata {
    entries: BTreeMap<String, Option<String>>,
}

impl FileMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a field
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        self.entries.insert(key.into(), value);
    }

    /// Text of a field; `None` both when the field is absent and when it has no text
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(|v| v.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn codebook_id(&self) -> Option<&str> {
        self.get(crate::constants::CODEBOOK_ID_KEY)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_deref()))
    }
}

/// One value of a categorical variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Raw on-disk value
    pub code: Option<String>,
    pub label: Option<String>,
}

/// Child of a `<var>` element with no dedicated field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadata {
    pub tag: String,
    pub text: Option<String>,
}

/// Everything the codebook says about one variable.
///
/// Positional and decimal attributes are kept as the raw strings found in the
/// XML; converting them is the schema projector's job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDescriptor {
    pub name: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
    pub concept: Option<String>,
    /// `intrvl` attribute, `discrete` or `contin`
    pub field_type: Option<String>,
    pub files: Option<String>,
    /// `dcml` attribute: implied decimal places
    pub decimals: Option<String>,
    pub schema: Option<String>,
    pub data_type: Option<String>,
    pub location_start_pos: Option<String>,
    pub location_end_pos: Option<String>,
    pub location_width: Option<String>,
    pub categories: Vec<Category>,
    pub field_metadata: Vec<FieldMetadata>,
}

impl VariableDescriptor {
    /// Name used in messages; falls back to the variable's position
    pub fn display_name(&self, index: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("#{}", index + 1),
        }
    }

    pub fn has_categories(&self) -> bool {
        !self.categories.is_empty()
    }
}

/// 0-indexed, half-open byte range of a column within a fixed-width record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub start: usize,
    pub end: usize,
}

impl ColumnSpec {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn width(&self) -> usize {
        self.end - self.start
    }

    pub fn as_tuple(&self) -> (usize, usize) {
        (self.start, self.end)
    }
}

impl From<ColumnSpec> for (usize, usize) {
    fn from(spec: ColumnSpec) -> Self {
        spec.as_tuple()
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.start, self.end)
    }
}

/// Storage type hint for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnDtype {
    Integer,
    Float,
    Text,
}

impl ColumnDtype {
    pub fn to_polars(self) -> DataType {
        match self {
            ColumnDtype::Integer => DataType::Int64,
            ColumnDtype::Float => DataType::Float64,
            ColumnDtype::Text => DataType::String,
        }
    }
}

impl fmt::Display for ColumnDtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnDtype::Integer => "integer",
            ColumnDtype::Float => "float",
            ColumnDtype::Text => "text",
        };
        f.write_str(name)
    }
}
