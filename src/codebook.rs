//! Codebook loading.
//!
//! Parses a DDI codebook once, runs the file and variable extractors over the
//! tree and projects the column layout. The resulting [`Codebook`] is
//! immutable for the rest of the run.

use crate::constants::{DEFAULT_NAMESPACE, tags};
use crate::error::{DdiError, Result};
use crate::file_metadata::extract_file_metadata;
use crate::models::{FileMetadata, VariableDescriptor};
use crate::namespace::qualify;
use crate::schema::{SchemaProjection, project_schema};
use crate::variables::extract_variables;
use crate::xml::{self, XmlElement};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, warn};

/// Parsed codebook: file metadata, variables in column order, and their layout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Codebook {
    pub file_metadata: FileMetadata,
    pub variables: Vec<VariableDescriptor>,
    pub schema: SchemaProjection,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

/// Read and extract a DDI codebook file
pub fn read_ipums_ddi(path: &Path) -> Result<Codebook> {
    if !path.exists() {
        return Err(DdiError::CodebookNotFound {
            path: path.to_path_buf(),
        });
    }

    let root = xml::parse_file(path)?;
    let codebook = Codebook::from_root(&root, &path.display().to_string())?;
    debug!(
        "Loaded codebook {}: {} variables, {} metadata fields",
        path.display(),
        codebook.variables.len(),
        codebook.file_metadata.len()
    );
    Ok(codebook)
}

impl Codebook {
    /// Extract a codebook from an in-memory document
    pub fn from_xml(xml: &str) -> Result<Self> {
        let root = xml::parse_str(xml)?;
        Self::from_root(&root, "<inline>")
    }

    /// Extract a codebook from a parsed tree; `origin` names the source in errors
    pub fn from_root(root: &XmlElement, origin: &str) -> Result<Self> {
        check_root(root, origin)?;

        if root.find(&[tags::DATA_DSCR]).is_none() {
            warn!("Codebook {} has no data description block", origin);
        }

        let file_metadata = extract_file_metadata(root);
        let variables = extract_variables(root);
        let schema = project_schema(&variables)?;
        Ok(Self::new(file_metadata, variables, schema))
    }

    pub fn new(
        file_metadata: FileMetadata,
        variables: Vec<VariableDescriptor>,
        schema: SchemaProjection,
    ) -> Self {
        let mut index = HashMap::new();
        for (position, variable) in variables.iter().enumerate() {
            let Some(name) = &variable.name else {
                continue;
            };
            if index.insert(name.clone(), position).is_some() {
                warn!("Duplicate variable name {}, keeping the last", name);
            }
        }

        Self {
            file_metadata,
            variables,
            schema,
            index,
        }
    }

    pub fn variable(&self, name: &str) -> Option<&VariableDescriptor> {
        self.index.get(name).map(|&position| &self.variables[position])
    }

    /// Like [`Codebook::variable`], failing with `UnknownVariable`
    pub fn require_variable(&self, name: &str) -> Result<&VariableDescriptor> {
        self.variable(name)
            .ok_or_else(|| DdiError::unknown_variable(name))
    }

    pub fn columns(&self) -> &[Option<String>] {
        &self.schema.columns
    }

    /// `(name, field_type)` per variable, in column order
    pub fn column_metadata(&self) -> Vec<(Option<&str>, Option<&str>)> {
        self.variables
            .iter()
            .map(|v| (v.name.as_deref(), v.field_type.as_deref()))
            .collect()
    }

    /// Code to label map for a variable; the first of any duplicated codes wins
    pub fn value_labels(&self, name: &str) -> Option<BTreeMap<String, Option<String>>> {
        let variable = self.variable(name)?;
        let mut labels = BTreeMap::new();
        for category in &variable.categories {
            let Some(code) = &category.code else {
                continue;
            };
            if labels.contains_key(code) {
                warn!("Variable {} repeats category code {}", name, code);
                continue;
            }
            labels.insert(code.clone(), category.label.clone());
        }
        Some(labels)
    }
}

fn check_root(root: &XmlElement, origin: &str) -> Result<()> {
    if root.tag() == qualify(tags::CODEBOOK) {
        return Ok(());
    }
    let local_name = root.tag().rsplit('}').next();
    let reason = if local_name == Some(tags::CODEBOOK) {
        format!(
            "root <{}> is not in the supported namespace {}",
            root.tag(),
            DEFAULT_NAMESPACE
        )
    } else {
        format!("root element <{}> is not a DDI codeBook", root.tag())
    };
    Err(DdiError::parse(origin, reason))
}
