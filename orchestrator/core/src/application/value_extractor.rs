// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Value Extractor
//!
//! Pulls a child value out of the JSON snapshot held by a parent input.
//! Either the child declares an explicit `parent-property` path, or the
//! runtime value is taken as the child's id and looked up in the parent's
//! collection (`$.<collection>[?(@.id == '<id>')]`).
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Parent-to-child value extraction for the input resolver

use serde_json::Value;
use thiserror::Error;

use crate::infrastructure::json_path::{render, JsonPath, JsonPathError};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Parent value is not valid JSON: {0}")]
    InvalidJson(String),

    #[error(transparent)]
    InvalidPath(#[from] JsonPathError),

    #[error("No value or parent-property to select from the {collection} of the parent")]
    MissingTarget { collection: String },

    #[error("Expression {expression} matched nothing")]
    NoMatch { expression: String },
}

/// Build the implicit lookup expression for a child id.
pub fn implicit_expression(collection: &str, target: &str) -> String {
    format!(
        "$.{}[?(@.id == '{}')]",
        collection,
        target.replace('\'', "")
    )
}

/// Extract a child from `parent`. The first match wins.
pub fn extract_from_parent(
    parent: &str,
    parent_property: Option<&str>,
    collection: &str,
    target: Option<&str>,
) -> Result<String, ExtractionError> {
    let expression = match parent_property.filter(|p| !p.trim().is_empty()) {
        Some(property) => property.to_string(),
        None => {
            let target = target.ok_or_else(|| ExtractionError::MissingTarget {
                collection: collection.to_string(),
            })?;
            implicit_expression(collection, target)
        }
    };

    let matches = extract_all(parent, &expression)?;
    if matches.len() > 1 {
        tracing::debug!(
            "Expression {} matched {} values; using the first",
            expression,
            matches.len()
        );
    }
    matches
        .into_iter()
        .next()
        .ok_or(ExtractionError::NoMatch { expression })
}

/// First match of `expression` in `json`, if any.
pub fn extract_first(json: &str, expression: &str) -> Result<Option<String>, ExtractionError> {
    Ok(extract_all(json, expression)?.into_iter().next())
}

/// Every match of `expression` in `json`, rendered as text.
pub fn extract_all(json: &str, expression: &str) -> Result<Vec<String>, ExtractionError> {
    let path = JsonPath::parse(expression)?;
    let value: Value =
        serde_json::from_str(json).map_err(|e| ExtractionError::InvalidJson(e.to_string()))?;
    Ok(path.select(&value).into_iter().map(render).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSION: &str = r#"{
        "id": "XNAT_E00001",
        "project-id": "proj1",
        "scans": [
            {"id": "1", "type": "T1"},
            {"id": "2", "type": "T2"}
        ]
    }"#;

    #[test]
    fn test_implicit_lookup_by_id() {
        let scan = extract_from_parent(SESSION, None, "scans", Some("2")).unwrap();
        let scan: Value = serde_json::from_str(&scan).unwrap();
        assert_eq!(scan["type"], "T2");
    }

    #[test]
    fn test_explicit_parent_property_wins() {
        let value =
            extract_from_parent(SESSION, Some("$.scans[0].type"), "scans", Some("2")).unwrap();
        assert_eq!(value, "T1");
    }

    #[test]
    fn test_first_match_wins() {
        let value = extract_from_parent(SESSION, Some("$.scans[*].id"), "scans", None).unwrap();
        assert_eq!(value, "1");
    }

    #[test]
    fn test_no_match() {
        let err = extract_from_parent(SESSION, None, "scans", Some("9")).unwrap_err();
        assert!(matches!(err, ExtractionError::NoMatch { .. }));
    }

    #[test]
    fn test_missing_target() {
        let err = extract_from_parent(SESSION, None, "scans", None).unwrap_err();
        assert!(matches!(err, ExtractionError::MissingTarget { .. }));
    }

    #[test]
    fn test_invalid_parent_json() {
        let err = extract_from_parent("not json", None, "scans", Some("1")).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidJson(_)));
    }

    #[test]
    fn test_extract_first() {
        assert_eq!(
            extract_first(SESSION, "$..project-id").unwrap().as_deref(),
            Some("proj1")
        );
        assert_eq!(extract_first(SESSION, "$..projectId").unwrap(), None);
    }
}
