//! Extract discovery.
//!
//! An IPUMS extract is a codebook (`usa_00003.xml`) next to a data file with
//! the same stem (`usa_00003.dat.gz`). This module finds those pairs on disk
//! and infers which IPUMS collection an extract came from.

use crate::constants::{CODEBOOK_EXTENSION, DATA_FILE_SUFFIXES};
use crate::error::{DdiError, Result};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// `<collection>_<extract number>`, e.g. `usa_00003`
static EXTRACT_STEM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<collection>[a-z]+)_(?P<number>\d+)$").expect("Invalid extract stem regex")
});

/// IPUMS data collection an extract belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IpumsCollection {
    Usa,
    Cps,
    International,
    Nhis,
    Atus,
    Meps,
    HigherEd,
}

impl IpumsCollection {
    /// Infer the collection from an extract file stem such as `cps_00012`
    pub fn from_stem(stem: &str) -> Option<Self> {
        let lowered = stem.to_ascii_lowercase();
        let captures = EXTRACT_STEM_REGEX.captures(&lowered)?;
        match &captures["collection"] {
            "usa" => Some(Self::Usa),
            "cps" => Some(Self::Cps),
            "ipumsi" => Some(Self::International),
            "nhis" => Some(Self::Nhis),
            "atus" => Some(Self::Atus),
            "meps" => Some(Self::Meps),
            "highered" => Some(Self::HigherEd),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Usa => "IPUMS USA",
            Self::Cps => "IPUMS CPS",
            Self::International => "IPUMS International",
            Self::Nhis => "IPUMS NHIS",
            Self::Atus => "IPUMS ATUS",
            Self::Meps => "IPUMS MEPS",
            Self::HigherEd => "IPUMS Higher Ed",
        }
    }
}

impl fmt::Display for IpumsCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A codebook found on disk, with its data file when one sits beside it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extract {
    /// File stem shared by the codebook and data file
    pub name: String,
    pub codebook_path: PathBuf,
    pub data_path: Option<PathBuf>,
    pub collection: Option<IpumsCollection>,
}

impl Extract {
    /// Build an extract for a codebook path, looking for its data file
    pub fn from_codebook(codebook_path: &Path) -> Option<Self> {
        let name = codebook_path.file_stem()?.to_str()?.to_string();
        let data_path = find_data_file(codebook_path, &name);
        if data_path.is_none() {
            warn!("No data file found for codebook {}", codebook_path.display());
        }

        Some(Self {
            collection: IpumsCollection::from_stem(&name),
            codebook_path: codebook_path.to_path_buf(),
            data_path,
            name,
        })
    }

    pub fn has_data(&self) -> bool {
        self.data_path.is_some()
    }
}

/// Find codebooks under `dir` and pair each with its data file.
///
/// Only the top level of `dir` is searched unless `recursive` is set.
/// Results are sorted by name, then by codebook path.
pub fn discover_extracts(dir: &Path, recursive: bool) -> Result<Vec<Extract>> {
    if !dir.is_dir() {
        return Err(DdiError::configuration(format!(
            "extract directory {} does not exist",
            dir.display()
        )));
    }

    debug!("Searching for codebooks in: {}", dir.display());

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut extracts = Vec::new();
    for entry in WalkDir::new(dir).max_depth(max_depth) {
        let entry = entry.map_err(|e| DdiError::Io(e.into()))?;
        if !entry.file_type().is_file() || !is_codebook_file(entry.path()) {
            continue;
        }
        if let Some(extract) = Extract::from_codebook(entry.path()) {
            extracts.push(extract);
        }
    }

    extracts.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.codebook_path.cmp(&b.codebook_path))
    });
    debug!("Found {} extracts", extracts.len());
    Ok(extracts)
}

/// Where IPUMS extracts land by default: the user's download directory
pub fn default_extract_dir() -> Option<PathBuf> {
    dirs::download_dir().or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

fn is_codebook_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CODEBOOK_EXTENSION))
}

fn find_data_file(codebook_path: &Path, stem: &str) -> Option<PathBuf> {
    let dir = codebook_path.parent()?;
    DATA_FILE_SUFFIXES
        .iter()
        .map(|suffix| dir.join(format!("{stem}{suffix}")))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_collection_from_stem() {
        assert_eq!(IpumsCollection::from_stem("usa_00003"), Some(IpumsCollection::Usa));
        assert_eq!(IpumsCollection::from_stem("CPS_00012"), Some(IpumsCollection::Cps));
        assert_eq!(
            IpumsCollection::from_stem("ipumsi_00001"),
            Some(IpumsCollection::International)
        );
        assert_eq!(IpumsCollection::from_stem("usa"), None);
        assert_eq!(IpumsCollection::from_stem("usa_00003_extra"), None);
        assert_eq!(IpumsCollection::from_stem("acme_00001"), None);
        assert_eq!(IpumsCollection::from_stem("HighEred_7"), Some(IpumsCollection::HigherEd));
        assert_eq!(IpumsCollection::Usa.to_string(), "IPUMS USA");
    }

    #[test]
    fn test_discover_pairs_preferred_data_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("usa_00002.xml"));
        touch(&root.join("usa_00002.dat"));
        touch(&root.join("usa_00002.dat.gz"));
        touch(&root.join("cps_00001.xml"));
        touch(&root.join("cps_00001.csv"));
        touch(&root.join("notes.txt"));

        let extracts = discover_extracts(root, false).unwrap();
        assert_eq!(extracts.len(), 2);

        assert_eq!(extracts[0].name, "cps_00001");
        assert_eq!(extracts[0].collection, Some(IpumsCollection::Cps));
        assert_eq!(extracts[0].data_path, Some(root.join("cps_00001.csv")));

        assert_eq!(extracts[1].name, "usa_00002");
        assert_eq!(extracts[1].data_path, Some(root.join("usa_00002.dat.gz")));
    }

    #[test]
    fn test_discover_recursion() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("usa_00001.xml"));
        touch(&root.join("nested").join("nhis_00004.xml"));

        let shallow = discover_extracts(root, false).unwrap();
        assert_eq!(shallow.len(), 1);
        assert!(!shallow[0].has_data());

        let deep = discover_extracts(root, true).unwrap();
        let names: Vec<&str> = deep.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["nhis_00004", "usa_00001"]);
    }

    #[test]
    fn test_discover_missing_directory() {
        let result = discover_extracts(Path::new("/nonexistent/extracts"), false);
        assert!(matches!(result, Err(DdiError::Configuration { .. })));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home(Path::new("/data/usa.xml")), PathBuf::from("/data/usa.xml"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/Downloads")), home.join("Downloads"));
        }
    }
}
