//! Integration tests for reading microdata with a sample IPUMS USA extract
//!
//! The fixture pair lives in tests/fixtures; compressed, delimited and
//! corrupted variants are written to temporary directories.

use flate2::Compression;
use flate2::write::GzEncoder;
use ipums_ddi::{
    Codebook, DataFormat, DdiError, IpumsCollection, ReaderConfig, apply_value_labels,
    discover_extracts, read_ipums_ddi, read_microdata,
};
use polars::prelude::*;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_fixture() -> Codebook {
    read_ipums_ddi(&fixture("usa_00001.xml")).expect("Failed to load fixture codebook")
}

fn i64_values(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
    df.column(name).unwrap().i64().unwrap().into_iter().collect()
}

fn f64_values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name).unwrap().f64().unwrap().into_iter().collect()
}

fn str_values(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

#[test]
fn test_read_fixed_width_fixture() {
    let codebook = load_fixture();
    let df = read_microdata(&codebook, &fixture("usa_00001.dat"), &ReaderConfig::default()).unwrap();

    assert_eq!(df.shape(), (3, 7));
    let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
    assert_eq!(
        names,
        vec!["YEAR", "SAMPLE", "SERIAL", "HHWT", "STATEFIP", "SEX", "HHINCOME"]
    );

    assert_eq!(i64_values(&df, "YEAR"), vec![Some(2021); 3]);
    assert_eq!(i64_values(&df, "SERIAL"), vec![Some(1), Some(2), Some(3)]);
    assert_eq!(f64_values(&df, "HHWT"), vec![Some(123.45), Some(98.5), Some(200.0)]);
    assert_eq!(i64_values(&df, "STATEFIP"), vec![Some(6), Some(36), Some(1)]);
    assert_eq!(i64_values(&df, "HHINCOME"), vec![Some(54000), Some(120500), Some(0)]);
}

#[test]
fn test_read_gzip_with_selection() {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path().join("usa_00001.dat.gz");

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&fs::read(fixture("usa_00001.dat")).unwrap())
        .unwrap();
    fs::write(&data_path, encoder.finish().unwrap()).unwrap();

    let config = ReaderConfig::default()
        .with_columns(["SEX", "YEAR"])
        .with_n_max(2);
    let df = read_microdata(&load_fixture(), &data_path, &config).unwrap();

    // Codebook order, not request order
    let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
    assert_eq!(names, vec!["YEAR", "SEX"]);
    assert_eq!(i64_values(&df, "SEX"), vec![Some(1), Some(2)]);
}

#[test]
fn test_value_labels() {
    let codebook = load_fixture();
    let mut df =
        read_microdata(&codebook, &fixture("usa_00001.dat"), &ReaderConfig::default()).unwrap();

    apply_value_labels(&mut df, &codebook, &["STATEFIP".to_string(), "SEX".to_string()]).unwrap();

    assert_eq!(df.width(), 9);
    assert_eq!(
        str_values(&df, "STATEFIP_label"),
        vec![
            Some("California".to_string()),
            Some("New York".to_string()),
            Some("Alabama".to_string())
        ]
    );
    assert_eq!(
        str_values(&df, "SEX_label"),
        vec![
            Some("Male".to_string()),
            Some("Female".to_string()),
            Some("Missing/blank".to_string())
        ]
    );
}

#[test]
fn test_read_delimited() {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path().join("usa_00001.csv");
    fs::write(&data_path, "YEAR,SEX,HHWT\n2021,1,123.45\n2021,2,98.50\n").unwrap();

    let config = ReaderConfig::default().with_columns(["YEAR", "SEX", "HHWT"]);
    assert_eq!(config.resolve_format(&data_path), DataFormat::Delimited);

    let df = read_microdata(&load_fixture(), &data_path, &config).unwrap();
    assert_eq!(df.shape(), (2, 3));
    assert_eq!(i64_values(&df, "YEAR"), vec![Some(2021), Some(2021)]);
    assert_eq!(f64_values(&df, "HHWT"), vec![Some(123.45), Some(98.5)]);
}

#[test]
fn test_bad_value_reports_line() {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path().join("usa_00001.dat");
    let mut content = fs::read_to_string(fixture("usa_00001.dat")).unwrap();
    content = content.replacen("2021202101000000020", "20X1202101000000020", 1);
    fs::write(&data_path, content).unwrap();

    let codebook = load_fixture();
    let err = read_microdata(&codebook, &data_path, &ReaderConfig::default()).unwrap_err();
    match err {
        DdiError::DataFile { line, column, .. } => {
            assert_eq!(line, 2);
            assert_eq!(column, "YEAR");
        }
        other => panic!("expected a data file error, got {other:?}"),
    }

    let config = ReaderConfig::default().with_ignore_errors();
    let df = read_microdata(&codebook, &data_path, &config).unwrap();
    assert_eq!(i64_values(&df, "YEAR"), vec![Some(2021), None, Some(2021)]);
}

#[test]
fn test_unknown_column() {
    let config = ReaderConfig::default().with_columns(["AGE"]);
    let result = read_microdata(&load_fixture(), &fixture("usa_00001.dat"), &config);
    assert!(matches!(result, Err(DdiError::UnknownVariable { .. })));
}

#[test]
fn test_discover_fixture_extract() {
    let extracts = discover_extracts(&fixture(""), false).unwrap();

    let extract = extracts
        .iter()
        .find(|e| e.name == "usa_00001")
        .expect("fixture extract should be discovered");
    assert_eq!(extract.collection, Some(IpumsCollection::Usa));
    assert_eq!(extract.data_path, Some(fixture("usa_00001.dat")));
}
