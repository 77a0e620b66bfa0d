//! File-level metadata extraction.
//!
//! Flattens the codebook's citation title block and file-text block into a
//! single field-name to text map, seeded with the codebook's `ID`.

use crate::constants::{CODEBOOK_ID_KEY, attributes, paths};
use crate::models::FileMetadata;
use crate::xml::XmlElement;
use tracing::debug;

/// Extract file metadata from the codebook root.
///
/// Children of the title block are inserted first, then children of the
/// file-text block, so the latter win on key collisions. A missing block
/// contributes nothing.
pub fn extract_file_metadata(root: &XmlElement) -> FileMetadata {
    let mut metadata = FileMetadata::new();
    metadata.insert(CODEBOOK_ID_KEY, root.attr(attributes::ID).map(str::to_string));

    for path in [paths::TITLE, paths::FILE_TEXT] {
        let blocks = root.find_all(path);
        if blocks.is_empty() {
            debug!("No metadata block at {}", path.join("/"));
        }
        for element in blocks.into_iter().flat_map(XmlElement::children) {
            metadata.insert(
                element.local_name().into_owned(),
                element.text().map(str::to_string),
            );
        }
    }

    debug!("Extracted {} file metadata fields", metadata.len());
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_str;

    #[test]
    fn test_extracts_title_and_file_text() {
        let root = parse_str(
            r#"<codeBook xmlns="ddi:codebook:2_5" ID="usa_00001">
  <docDscr><citation><titlStmt>
    <titl>IPUMS USA extract</titl>
    <IDNo>usa_00001</IDNo>
  </titlStmt></citation></docDscr>
  <fileDscr ID="F1"><fileTxt>
    <fileName>usa_00001.dat</fileName>
    <fileStrc type="rectangular"/>
  </fileTxt></fileDscr>
</codeBook>"#,
        )
        .unwrap();

        let metadata = extract_file_metadata(&root);
        assert_eq!(metadata.len(), 5);
        assert_eq!(metadata.codebook_id(), Some("usa_00001"));
        assert_eq!(metadata.get("titl"), Some("IPUMS USA extract"));
        assert_eq!(metadata.get("fileName"), Some("usa_00001.dat"));
        assert!(metadata.contains_key("fileStrc"));
        assert_eq!(metadata.get("fileStrc"), None);
    }

    #[test]
    fn test_file_text_overrides_title_on_collision() {
        let root = parse_str(
            r#"<codeBook xmlns="ddi:codebook:2_5">
  <docDscr><citation><titlStmt><titl>from title</titl></titlStmt></citation></docDscr>
  <fileDscr><fileTxt><titl>from file text</titl></fileTxt></fileDscr>
</codeBook>"#,
        )
        .unwrap();

        let metadata = extract_file_metadata(&root);
        assert_eq!(metadata.get("titl"), Some("from file text"));
    }

    #[test]
    fn test_missing_blocks_yield_only_codebook_id() {
        let root = parse_str(r#"<codeBook xmlns="ddi:codebook:2_5"/>"#).unwrap();

        let metadata = extract_file_metadata(&root);
        assert_eq!(metadata.len(), 1);
        assert!(metadata.contains_key(CODEBOOK_ID_KEY));
        assert_eq!(metadata.codebook_id(), None);
    }
}
