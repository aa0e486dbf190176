//! Document assembly: merge pre-structured field values with parsed
//! Markdown under the fill-missing precedence policy.
//!
//! A present, non-empty pre-structured value always wins over the parsed
//! value for the same section; parsed values fill only the gaps. Callers
//! who want parsed content to win must simply not pass a pre-structured
//! value for that section.

use serde_json::Value;

use crate::errors::PrdError;
use crate::extract::parse_document;
use crate::model::{FieldMap, Section};

/// Decode caller-supplied `(name, value)` pairs into typed section values.
///
/// Unknown field names are a hard error here, unlike unknown Markdown
/// headings, which are silently dropped during extraction. `null` values
/// are treated as absent.
pub fn decode_fields(
    fields: serde_json::Map<String, Value>,
) -> Result<FieldMap, PrdError> {
    let mut out = FieldMap::new();
    for (name, value) in fields {
        let section: Section = name
            .parse()
            .map_err(|_| PrdError::unsupported(&name))?;
        if value.is_null() {
            continue;
        }
        out.insert(section, section.decode_value(value)?);
    }
    Ok(out)
}

/// Produce the final field map from optional pre-structured fields and
/// optional raw Markdown.
pub fn assemble(
    prestructured: serde_json::Map<String, Value>,
    markdown: Option<&str>,
) -> Result<FieldMap, PrdError> {
    let structured = decode_fields(prestructured)?;
    let mut out = markdown.map(parse_document).unwrap_or_default();
    for (section, value) in structured {
        if !value.is_empty() {
            out.insert(section, value);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SectionValue;
    use serde_json::json;

    fn fields(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_prestructured_wins_over_parsed() {
        let markdown = "## Stakeholders\n- Engineering lead\n- Designer\n";
        let map = assemble(fields(json!({"stakeholders": ["PM"]})), Some(markdown)).unwrap();
        assert_eq!(
            map.get(&Section::Stakeholders),
            Some(&SectionValue::Items(vec!["PM".to_string()]))
        );
    }

    #[test]
    fn test_parsed_fills_missing_sections() {
        let markdown = "## Assumptions\n- Uses managed Postgres\n";
        let map = assemble(fields(json!({"stakeholders": ["PM"]})), Some(markdown)).unwrap();
        assert_eq!(map.len(), 2);
        assert!(map.contains_key(&Section::Assumptions));
        assert!(map.contains_key(&Section::Stakeholders));
    }

    #[test]
    fn test_empty_prestructured_value_does_not_win() {
        let markdown = "## Stakeholders\n- Designer\n";
        let map = assemble(fields(json!({"stakeholders": []})), Some(markdown)).unwrap();
        assert_eq!(
            map.get(&Section::Stakeholders),
            Some(&SectionValue::Items(vec!["Designer".to_string()]))
        );
    }

    #[test]
    fn test_absent_everywhere_is_omitted() {
        let map = assemble(serde_json::Map::new(), Some("## Metrics\n- DAU\n")).unwrap();
        assert!(!map.contains_key(&Section::Assumptions));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_unknown_field_name_is_hard_error() {
        let err = assemble(fields(json!({"budget": ["$100k"]})), None).unwrap_err();
        match err {
            PrdError::SectionUnsupported { section } => assert_eq!(section, "budget"),
            other => panic!("Expected SectionUnsupported, got {:?}", other),
        }
    }

    #[test]
    fn test_heading_style_field_name_is_accepted() {
        let map = assemble(
            fields(json!({"Risks and Mitigations": [{"risk": "Churn"}]})),
            None,
        )
        .unwrap();
        assert!(map.contains_key(&Section::RisksAndMitigations));
    }

    #[test]
    fn test_malformed_value_is_validation_error() {
        let err = assemble(fields(json!({"introduction": ["not", "text"]})), None).unwrap_err();
        assert!(matches!(err, PrdError::Validation { .. }));
    }

    #[test]
    fn test_null_value_treated_as_absent() {
        let markdown = "## Metrics\n- DAU\n";
        let map = assemble(fields(json!({"metrics": null})), Some(markdown)).unwrap();
        assert_eq!(
            map.get(&Section::Metrics),
            Some(&SectionValue::Items(vec!["DAU".to_string()]))
        );
    }

    #[test]
    fn test_no_inputs_yields_empty_map() {
        let map = assemble(serde_json::Map::new(), None).unwrap();
        assert!(map.is_empty());
    }
}
