//! Application constants for the IPUMS DDI reader
//!
//! This module contains the DDI namespace, the element and attribute names the
//! extractors match on, the structural paths they walk, and the file-name
//! conventions used to pair codebooks with their data files.

// =============================================================================
// Namespace
// =============================================================================

/// Namespace URI of the supported DDI codebook version
pub const DDI_NAMESPACE: &str = "ddi:codebook:2_5";

/// Qualified-name prefix produced for elements in the DDI namespace
pub const DEFAULT_NAMESPACE: &str = "{ddi:codebook:2_5}";

// =============================================================================
// Element Names
// =============================================================================

/// Local element names used by the extractors
pub mod tags {
    pub const CODEBOOK: &str = "codeBook";

    // Document and file description blocks
    pub const DOC_DSCR: &str = "docDscr";
    pub const CITATION: &str = "citation";
    pub const TITLE_STMT: &str = "titlStmt";
    pub const FILE_DSCR: &str = "fileDscr";
    pub const FILE_TXT: &str = "fileTxt";

    // Data description block
    pub const DATA_DSCR: &str = "dataDscr";
    pub const VAR: &str = "var";

    // Children of <var>
    pub const TXT: &str = "txt";
    pub const LABL: &str = "labl";
    pub const VAR_FORMAT: &str = "varFormat";
    pub const CATGRY: &str = "catgry";
    pub const LOCATION: &str = "location";
    pub const CONCEPT: &str = "concept";

    // Children of <catgry>
    pub const CAT_VALU: &str = "catValu";
}

// =============================================================================
// Attribute Names
// =============================================================================

/// Attribute names read from codebook elements
pub mod attributes {
    pub const ID: &str = "ID";

    // <var>
    pub const INTERVAL: &str = "intrvl";
    pub const FILES: &str = "files";
    pub const DECIMALS: &str = "dcml";

    // <varFormat>
    pub const SCHEMA: &str = "schema";
    pub const TYPE: &str = "type";

    // <location>
    pub const START_POS: &str = "StartPos";
    pub const END_POS: &str = "EndPos";
    pub const WIDTH: &str = "width";

    // <catgry>
    pub const LABEL: &str = "labl";
}

/// Values of the `varFormat/@type` attribute
pub mod format_types {
    pub const NUMERIC: &str = "numeric";
    pub const CHARACTER: &str = "character";
}

// =============================================================================
// Structural Paths
// =============================================================================

/// Paths below the codebook root, as sequences of local names in the DDI namespace
pub mod paths {
    use super::tags;

    /// Citation title block; its children become file metadata
    pub const TITLE: &[&str] = &[tags::DOC_DSCR, tags::CITATION, tags::TITLE_STMT];

    /// File text block; its children become file metadata (processed second)
    pub const FILE_TEXT: &[&str] = &[tags::FILE_DSCR, tags::FILE_TXT];

    /// Variable descriptions, in column order
    pub const VARIABLES: &[&str] = &[tags::DATA_DSCR, tags::VAR];
}

/// Key seeded into the file metadata from the root `ID` attribute
pub const CODEBOOK_ID_KEY: &str = "codebook_id";

// =============================================================================
// File Conventions
// =============================================================================

/// Codebook file extension
pub const CODEBOOK_EXTENSION: &str = "xml";

/// Data file suffixes in the order they are preferred when pairing with a codebook
pub const DATA_FILE_SUFFIXES: &[&str] = &[".dat.gz", ".dat", ".csv.gz", ".csv"];

/// Leading bytes of a gzip stream
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Suffix appended to a variable name for its label column
pub const LABEL_COLUMN_SUFFIX: &str = "_label";
