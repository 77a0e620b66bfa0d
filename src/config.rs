//! Configuration for reading microdata files.
//!
//! Provides the reader settings and the data format selection, with builder
//! methods for the options callers usually change.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Layout of a microdata file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataFormat {
    /// Columns at fixed byte ranges, as described by the codebook locations
    FixedWidth,
    /// Comma separated with a header row
    Delimited,
}

impl DataFormat {
    /// Detect the format from the file name; anything not `.csv`/`.csv.gz` is fixed-width
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let name = name.strip_suffix(".gz").unwrap_or(&name);

        if name.ends_with(".csv") {
            DataFormat::Delimited
        } else {
            DataFormat::FixedWidth
        }
    }
}

/// Settings for [`crate::reader::read_microdata`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Maximum number of data rows to read
    pub n_max: Option<usize>,

    /// Data format; detected from the file name when unset
    pub format: Option<DataFormat>,

    /// Variables to keep; all codebook variables when unset
    pub columns: Option<Vec<String>>,

    /// Turn values that cannot be coerced to their column type into nulls
    pub ignore_errors: bool,

    /// Scale fixed-width float columns by their implied decimal places
    pub implied_decimals: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            n_max: None,
            format: None,
            columns: None,
            ignore_errors: false,
            implied_decimals: true,
        }
    }
}

impl ReaderConfig {
    /// Cap the number of rows read
    pub fn with_n_max(mut self, n_max: usize) -> Self {
        self.n_max = Some(n_max);
        self
    }

    /// Force a data format instead of detecting it
    pub fn with_format(mut self, format: DataFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Read only the named variables
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Replace unparseable values with nulls
    pub fn with_ignore_errors(mut self) -> Self {
        self.ignore_errors = true;
        self
    }

    /// Keep raw integers for implied-decimal columns
    pub fn without_implied_decimals(mut self) -> Self {
        self.implied_decimals = false;
        self
    }

    /// Format to use for `path`
    pub fn resolve_format(&self, path: &Path) -> DataFormat {
        self.format.unwrap_or_else(|| DataFormat::from_path(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(DataFormat::from_path(Path::new("usa_00001.dat")), DataFormat::FixedWidth);
        assert_eq!(DataFormat::from_path(Path::new("usa_00001.dat.gz")), DataFormat::FixedWidth);
        assert_eq!(DataFormat::from_path(Path::new("cps_00002.csv")), DataFormat::Delimited);
        assert_eq!(DataFormat::from_path(Path::new("/tmp/CPS_00002.CSV.GZ")), DataFormat::Delimited);
        assert_eq!(DataFormat::from_path(Path::new("")), DataFormat::FixedWidth);
    }

    #[test]
    fn test_defaults() {
        let config = ReaderConfig::default();
        assert_eq!(config.n_max, None);
        assert_eq!(config.format, None);
        assert_eq!(config.columns, None);
        assert!(!config.ignore_errors);
        assert!(config.implied_decimals);
    }

    #[test]
    fn test_builder_methods() {
        let config = ReaderConfig::default()
            .with_n_max(1000)
            .with_format(DataFormat::Delimited)
            .with_columns(["YEAR", "AGE"])
            .with_ignore_errors()
            .without_implied_decimals();

        assert_eq!(config.n_max, Some(1000));
        assert_eq!(config.columns, Some(vec!["YEAR".to_string(), "AGE".to_string()]));
        assert!(config.ignore_errors);
        assert!(!config.implied_decimals);
        assert_eq!(config.resolve_format(Path::new("x.dat")), DataFormat::Delimited);
    }

    #[test]
    fn test_config_serializes() {
        let config = ReaderConfig::default().with_n_max(5);
        let json = serde_json::to_string(&config).unwrap();
        let back: ReaderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
