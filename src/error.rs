//! Error handling for codebook extraction and microdata reading.
//!
//! Structural absence in a codebook degrades to partial metadata and never
//! reaches these types. Positional and numeric corruption does, because it
//! would otherwise misalign every downstream column.

use std::path::PathBuf;
use thiserror::Error;

/// A numeric field held text that is not a non-negative decimal integer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("expected a non-negative integer, found {value:?}")]
pub struct FormatError {
    pub value: String,
}

impl FormatError {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum DdiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Codebook not found at path: {path}")]
    CodebookNotFound { path: PathBuf },

    #[error("Failed to parse codebook {origin}: {reason}")]
    Parse {
        origin: String,
        reason: String,
        #[source]
        source: Option<quick_xml::Error>,
    },

    #[error("Invalid layout for variable {variable}: {reason}")]
    Schema {
        variable: String,
        reason: String,
        #[source]
        source: Option<FormatError>,
    },

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("Failed to read data file {path} at line {line}, column {column}: {reason}")]
    DataFile {
        path: PathBuf,
        line: usize,
        column: String,
        reason: String,
    },

    #[error("Column {column} in {path} does not match its codebook type: {reason}")]
    ColumnType {
        path: PathBuf,
        column: String,
        reason: String,
    },

    #[error("Variable not found in codebook: {name}")]
    UnknownVariable { name: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl DdiError {
    pub fn parse(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            origin: origin.into(),
            reason: reason.into(),
            source: None,
        }
    }

    pub fn xml(origin: impl Into<String>, source: quick_xml::Error) -> Self {
        Self::Parse {
            origin: origin.into(),
            reason: source.to_string(),
            source: Some(source),
        }
    }

    pub fn schema(variable: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Schema {
            variable: variable.into(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Wrap a [`FormatError`] raised while reading a positional attribute.
    pub fn schema_format(
        variable: impl Into<String>,
        reason: impl Into<String>,
        source: FormatError,
    ) -> Self {
        Self::Schema {
            variable: variable.into(),
            reason: reason.into(),
            source: Some(source),
        }
    }

    pub fn unknown_variable(name: impl Into<String>) -> Self {
        Self::UnknownVariable { name: name.into() }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DdiError>;
