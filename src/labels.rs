//! Category label mapping for parsed columns.
//!
//! Replaces raw category codes in a `DataFrame` column with the labels the
//! codebook declares for them. Integer-looking codes are compared by value,
//! so a codebook code of `06` matches a parsed integer `6`.

use crate::codebook::Codebook;
use crate::constants::LABEL_COLUMN_SUFFIX;
use crate::error::{DdiError, Result};
use crate::models::VariableDescriptor;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Canonical form of a code used for matching
fn normalize_code(code: &str) -> String {
    let trimmed = code.trim();
    match trimmed.parse::<i64>() {
        Ok(value) => value.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

/// Normalized code to label; the first of any duplicated codes wins
fn label_lookup(variable: &VariableDescriptor) -> HashMap<String, String> {
    let mut lookup = HashMap::new();
    for category in &variable.categories {
        let (Some(code), Some(label)) = (&category.code, &category.label) else {
            continue;
        };
        lookup
            .entry(normalize_code(code))
            .or_insert_with(|| label.clone());
    }
    lookup
}

/// Labels for the values of `variable`'s column in `df`.
///
/// The result is a string series named `<NAME>_label`; values without a
/// matching category are null.
pub fn label_values(df: &DataFrame, variable: &VariableDescriptor) -> Result<Series> {
    let name = variable
        .name
        .as_deref()
        .ok_or_else(|| DdiError::configuration("cannot label a variable without a name"))?;
    if !variable.has_categories() {
        warn!("Variable {} has no categories; all labels will be null", name);
    }

    let lookup = label_lookup(variable);
    let values = df.column(name)?.cast(&DataType::String)?;
    let labels: StringChunked = values
        .str()?
        .into_iter()
        .map(|value| value.and_then(|code| lookup.get(&normalize_code(code)).map(String::as_str)))
        .collect();

    let label_name = format!("{name}{LABEL_COLUMN_SUFFIX}");
    Ok(labels.into_series().with_name(label_name.into()))
}

/// Append a label column for each named variable
pub fn apply_value_labels(df: &mut DataFrame, codebook: &Codebook, names: &[String]) -> Result<()> {
    for name in names {
        let variable = codebook.require_variable(name)?;
        let labels = label_values(df, variable)?;
        df.with_column(labels)?;
        debug!("Added labels for {}", name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn category(code: &str, label: &str) -> Category {
        Category {
            code: Some(code.to_string()),
            label: Some(label.to_string()),
        }
    }

    fn statefip() -> VariableDescriptor {
        VariableDescriptor {
            name: Some("STATEFIP".to_string()),
            categories: vec![
                category("01", "Alabama"),
                category("06", "California"),
                category("06", "Duplicate"),
                Category {
                    code: None,
                    label: Some("No code".to_string()),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("06"), "6");
        assert_eq!(normalize_code(" 12 "), "12");
        assert_eq!(normalize_code("AB"), "AB");
        assert_eq!(normalize_code("-1"), "-1");
    }

    #[test]
    fn test_label_integer_column() {
        let series = Series::new("STATEFIP".into(), vec![Some(6i64), Some(1), Some(36), None]);
        let df = DataFrame::new(vec![series.into()]).unwrap();
        let labels = label_values(&df, &statefip()).unwrap();

        assert_eq!(labels.name().as_str(), "STATEFIP_label");
        let values: Vec<Option<&str>> = labels.str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("California"), Some("Alabama"), None, None]);
    }

    #[test]
    fn test_label_text_column() {
        let series = Series::new("STATEFIP".into(), vec!["06", "01"]);
        let df = DataFrame::new(vec![series.into()]).unwrap();
        let labels = label_values(&df, &statefip()).unwrap();

        let values: Vec<Option<&str>> = labels.str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("California"), Some("Alabama")]);
    }

    #[test]
    fn test_apply_value_labels() {
        let codebook = Codebook::from_xml(
            r#"<codeBook xmlns="ddi:codebook:2_5"><dataDscr>
  <var ID="SEX"><location StartPos="1" EndPos="1"/>
    <catgry><catValu>1</catValu><labl>Male</labl></catgry>
    <catgry><catValu>2</catValu><labl>Female</labl></catgry>
  </var>
</dataDscr></codeBook>"#,
        )
        .unwrap();
        let series = Series::new("SEX".into(), vec![2i64, 1, 2]);
        let mut df = DataFrame::new(vec![series.into()]).unwrap();

        apply_value_labels(&mut df, &codebook, &["SEX".to_string()]).unwrap();
        assert_eq!(df.width(), 2);
        let values: Vec<Option<&str>> = df
            .column("SEX_label")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(values, vec![Some("Female"), Some("Male"), Some("Female")]);

        assert!(matches!(
            apply_value_labels(&mut df, &codebook, &["AGE".to_string()]),
            Err(DdiError::UnknownVariable { .. })
        ));
    }
}
