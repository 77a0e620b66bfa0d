//! Variable metadata extraction.
//!
//! Turns every `<var>` element of the data description into an immutable
//! [`VariableDescriptor`]. Each child element is classified once by its
//! normalized tag; unrecognized children are kept as residual field metadata
//! rather than discarded.

use crate::constants::{attributes, paths, tags};
use crate::models::{Category, FieldMetadata, VariableDescriptor};
use crate::namespace::remove_namespace;
use crate::xml::XmlElement;
use tracing::{debug, warn};

/// Role of a `<var>` child, in matching priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    Description,
    Label,
    Format,
    Category,
    Location,
    Concept,
    Other,
}

impl ChildKind {
    /// Classify a child by its local (namespace-free) tag name
    pub fn classify(local_name: &str) -> Self {
        match local_name {
            tags::TXT => ChildKind::Description,
            tags::LABL => ChildKind::Label,
            tags::VAR_FORMAT => ChildKind::Format,
            tags::CATGRY => ChildKind::Category,
            tags::LOCATION => ChildKind::Location,
            tags::CONCEPT => ChildKind::Concept,
            _ => ChildKind::Other,
        }
    }
}

/// Extract one descriptor per variable, in document order.
///
/// A variable with missing or malformed content still yields a record.
pub fn extract_variables(root: &XmlElement) -> Vec<VariableDescriptor> {
    let elements = root.find_all(paths::VARIABLES);
    if elements.is_empty() {
        warn!("Codebook has no variable descriptions");
    }

    let variables: Vec<VariableDescriptor> = elements.into_iter().map(parse_variable).collect();

    let unnamed = variables.iter().filter(|v| v.name.is_none()).count();
    if unnamed > 0 {
        warn!("{} variables have no ID attribute", unnamed);
    }
    debug!("Extracted {} variables", variables.len());
    variables
}

/// Build the descriptor for a single `<var>` element
pub fn parse_variable(element: &XmlElement) -> VariableDescriptor {
    let mut builder = VariableBuilder::new(element);
    for child in element.children() {
        builder.add_child(child);
    }
    builder.build()
}

/// Builder for variable descriptors
struct VariableBuilder {
    descriptor: VariableDescriptor,
}

impl VariableBuilder {
    fn new(element: &XmlElement) -> Self {
        let attr = |name: &str| element.attr(name).map(str::to_string);
        Self {
            descriptor: VariableDescriptor {
                name: attr(attributes::ID),
                field_type: attr(attributes::INTERVAL),
                files: attr(attributes::FILES),
                decimals: attr(attributes::DECIMALS),
                ..Default::default()
            },
        }
    }

    fn add_child(&mut self, child: &XmlElement) {
        let tag = child.local_name();
        let text = || child.text().map(|t| remove_namespace(t).into_owned());
        let descriptor = &mut self.descriptor;

        match ChildKind::classify(&tag) {
            ChildKind::Description => descriptor.description = text(),
            ChildKind::Label => descriptor.label = text(),
            ChildKind::Format => {
                descriptor.schema = child.attr(attributes::SCHEMA).map(str::to_string);
                descriptor.data_type = child.attr(attributes::TYPE).map(str::to_string);
            }
            ChildKind::Category => descriptor.categories.push(parse_category(child)),
            ChildKind::Location => {
                descriptor.location_start_pos = child.attr(attributes::START_POS).map(str::to_string);
                descriptor.location_end_pos = child.attr(attributes::END_POS).map(str::to_string);
                descriptor.location_width = child.attr(attributes::WIDTH).map(str::to_string);
            }
            ChildKind::Concept => descriptor.concept = text(),
            ChildKind::Other => descriptor.field_metadata.push(FieldMetadata {
                tag: tag.into_owned(),
                text: text(),
            }),
        }
    }

    fn build(self) -> VariableDescriptor {
        self.descriptor
    }
}

/// Code from the `catValu` child; label from the `labl` child, or a `labl` attribute
fn parse_category(element: &XmlElement) -> Category {
    let code = element.find_text(&[tags::CAT_VALU]).map(str::to_string);
    let label = element
        .find_text(&[tags::LABL])
        .or_else(|| element.attr(attributes::LABEL))
        .map(str::to_string);
    Category { code, label }
}
