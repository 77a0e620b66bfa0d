//! IPUMS DDI Library
//!
//! A Rust library for extracting metadata from IPUMS DDI 2.5 codebooks and
//! reading the fixed-width or delimited microdata files they describe.
//!
//! This library provides tools for:
//! - Parsing namespaced DDI XML into a plain element tree
//! - Extracting file-level metadata and per-variable descriptors
//! - Projecting variables into column names, byte ranges and storage types
//! - Reading plain or gzip-compressed data files into polars DataFrames
//! - Attaching category labels and discovering extracts on disk

pub mod codebook;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod file_metadata;
pub mod labels;
pub mod models;
pub mod namespace;
pub mod reader;
pub mod schema;
pub mod variables;
pub mod xml;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use codebook::{Codebook, read_ipums_ddi};
pub use config::{DataFormat, ReaderConfig};
pub use discovery::{Extract, IpumsCollection, discover_extracts};
pub use error::{DdiError, FormatError, Result};
pub use file_metadata::extract_file_metadata;
pub use labels::{apply_value_labels, label_values};
pub use models::{Category, ColumnDtype, ColumnSpec, FieldMetadata, FileMetadata, VariableDescriptor};
pub use namespace::remove_namespace;
pub use reader::read_microdata;
pub use schema::{SchemaProjection, project_schema, to_int};
pub use variables::extract_variables;
