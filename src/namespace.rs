//! Namespace normalization for DDI tag names.

use crate::constants::{DDI_NAMESPACE, DEFAULT_NAMESPACE};
use std::borrow::Cow;

/// Strip the DDI namespace prefix from a qualified tag name.
///
/// `{ddi:codebook:2_5}labl` becomes `labl`. Empty input is returned as is,
/// and text without the prefix is borrowed rather than copied.
pub fn remove_namespace(tag: &str) -> Cow<'_, str> {
    if tag.contains(DEFAULT_NAMESPACE) {
        Cow::Owned(tag.replace(DEFAULT_NAMESPACE, ""))
    } else {
        Cow::Borrowed(tag)
    }
}

/// Qualified `{uri}local` name of an element in the DDI namespace.
pub fn qualify(local_name: &str) -> String {
    format!("{{{DDI_NAMESPACE}}}{local_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_namespace() {
        assert_eq!(remove_namespace("{ddi:codebook:2_5}it works"), "it works");
        assert_eq!(remove_namespace("{ddi:codebook:2_5}var"), "var");
    }

    #[test]
    fn test_remove_namespace_passthrough() {
        assert_eq!(remove_namespace(""), "");
        assert!(matches!(remove_namespace("labl"), Cow::Borrowed("labl")));

        let absent: Option<&str> = None;
        assert_eq!(absent.map(remove_namespace), None);
    }

    #[test]
    fn test_other_namespaces_are_kept() {
        assert_eq!(
            remove_namespace("{http://www.w3.org/2001/XMLSchema-instance}type"),
            "{http://www.w3.org/2001/XMLSchema-instance}type"
        );
    }

    #[test]
    fn test_qualify_round_trips() {
        assert_eq!(qualify("codeBook"), "{ddi:codebook:2_5}codeBook");
        assert_eq!(remove_namespace(&qualify("catgry")), "catgry");
    }
}
