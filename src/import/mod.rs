//! Import of previously exported analyses.
//!
//! Accepts both the current export envelope (metadata plus `analysis`)
//! and legacy files that are a bare tree. Imported nodes are rebuilt
//! with fresh sequential identifiers so they can never collide with a
//! live session's ids.

use serde_json::Value;

use crate::error::{ImportError, ImportResult};
use crate::model::{AnalysisNode, GroundingData, Indicator, Veracity};

/// A rehydrated analysis tree plus the source document hash recovered
/// from the export metadata, when present.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedAnalysis {
    pub tree: AnalysisNode,
    pub source_file_hash: Option<String>,
}

/// Parse an exported document and rebuild the tree.
///
/// Unknown fields are ignored and malformed optional fields are
/// dropped; only a root without both a title and content is fatal.
pub fn import_analysis(text: &str) -> ImportResult<ImportedAnalysis> {
    let document: Value = serde_json::from_str(text)?;

    let (analysis, source_file_hash) = match document.get("analysis") {
        Some(analysis) => {
            let hash = document
                .get("metadata")
                .and_then(|m| m.get("sourceDocumentHash"))
                .and_then(|h| h.get("value"))
                .and_then(|v| v.as_str())
                .map(str::to_string);
            (analysis, hash)
        }
        None => (&document, None),
    };

    let has_title = analysis
        .get("title")
        .and_then(Value::as_str)
        .is_some_and(|t| !t.is_empty());
    let has_content = analysis
        .get("content")
        .and_then(Value::as_str)
        .is_some_and(|c| !c.is_empty());
    if !analysis.is_object() || !has_title || !has_content {
        return Err(ImportError::InvalidFormat {
            message: "root node must carry a title and content".to_string(),
        });
    }

    let mut counter = 0usize;
    let mut tree = rebuild(analysis, &mut counter);
    tree.source_file_hash = source_file_hash.clone();

    Ok(ImportedAnalysis {
        tree,
        source_file_hash,
    })
}

/// Depth-first rebuild with fresh `node-{n}` ids, preserving child
/// order. Transient flags reset; missing text fields get defaults.
fn rebuild(value: &Value, counter: &mut usize) -> AnalysisNode {
    let id = format!("node-{}", *counter);
    *counter += 1;

    let mut node = AnalysisNode::new(
        id,
        str_field(value, "title").unwrap_or_else(|| "Untitled".to_string()),
        str_field(value, "content").unwrap_or_default(),
    );
    node.notes = str_field(value, "notes").unwrap_or_default();
    node.alternative = str_field(value, "alternative");
    node.source_text = str_field(value, "sourceText");
    node.source_node_id = str_field(value, "sourceNodeId");
    node.veracity = optional_field::<Veracity>(value, "veracity");
    node.tone = optional_field::<Vec<String>>(value, "tone");
    node.indicators = optional_field::<Vec<Indicator>>(value, "indicators");
    node.grounding = optional_field::<GroundingData>(value, "grounding");

    if let Some(children) = value.get("children").and_then(Value::as_array) {
        node.children = children
            .iter()
            .map(|child| rebuild(child, counter))
            .collect();
    }

    node
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn optional_field<T: serde::de::DeserializeOwned>(value: &Value, key: &str) -> Option<T> {
    value
        .get(key)
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree;

    const WRAPPED: &str = r#"{
        "metadata": {
            "sourceDocumentHash": { "algorithm": "SHA-256", "value": "cafe01" },
            "reportHash": { "algorithm": "SHA-256", "value": "feed02" },
            "exportedAt": "2024-06-01T12:00:00.000Z"
        },
        "analysis": {
            "title": "Testimony Summary",
            "content": "root",
            "isSelected": true,
            "children": [
                {
                    "title": "Claim 1",
                    "content": "X said Y",
                    "veracity": "UNCERTAIN",
                    "indicators": ["HEARSAY"],
                    "notes": "check exhibit",
                    "children": []
                },
                { "title": "Claim 2", "content": "Z happened" }
            ]
        }
    }"#;

    #[test]
    fn test_wrapped_import_recovers_tree_and_source_hash() {
        let imported = import_analysis(WRAPPED).unwrap();

        assert_eq!(imported.source_file_hash.as_deref(), Some("cafe01"));
        assert_eq!(imported.tree.source_file_hash.as_deref(), Some("cafe01"));
        assert_eq!(imported.tree.title, "Testimony Summary");
        assert_eq!(imported.tree.children.len(), 2);
        assert_eq!(imported.tree.children[0].veracity, Some(Veracity::Uncertain));
        assert_eq!(
            imported.tree.children[0].indicators,
            Some(vec![Indicator::Hearsay])
        );
        assert_eq!(imported.tree.children[0].notes, "check exhibit");
    }

    #[test]
    fn test_ids_are_fresh_and_sequential() {
        let imported = import_analysis(WRAPPED).unwrap();
        assert_eq!(
            tree::collect_ids(&imported.tree),
            vec!["node-0", "node-1", "node-2"]
        );
    }

    #[test]
    fn test_transient_and_selection_state_reset() {
        let imported = import_analysis(WRAPPED).unwrap();
        // isSelected in the file is ignored; selection starts empty.
        assert!(!imported.tree.is_selected);
        assert!(!imported.tree.is_exploring);
        assert!(!imported.tree.is_fact_checking);
    }

    #[test]
    fn test_legacy_bare_tree_import() {
        let text = r#"{
            "title": "Old Export",
            "content": "legacy",
            "children": [{ "title": "Child", "content": "c" }]
        }"#;
        let imported = import_analysis(text).unwrap();
        assert!(imported.source_file_hash.is_none());
        assert_eq!(imported.tree.title, "Old Export");
        assert_eq!(imported.tree.children[0].id, "node-1");
    }

    #[test]
    fn test_missing_title_default_on_non_root() {
        let text = r#"{
            "title": "Root",
            "content": "r",
            "children": [{ "content": "no title here" }]
        }"#;
        let imported = import_analysis(text).unwrap();
        assert_eq!(imported.tree.children[0].title, "Untitled");
        assert_eq!(imported.tree.children[0].content, "no title here");
    }

    #[test]
    fn test_root_without_title_or_content_is_fatal() {
        for text in [r#"{"content":"c"}"#, r#"{"title":"t"}"#, r#"[1,2,3]"#] {
            let err = import_analysis(text).unwrap_err();
            assert!(matches!(err, ImportError::InvalidFormat { .. }), "{text}");
        }
    }

    #[test]
    fn test_malformed_optional_field_is_dropped() {
        let text = r#"{
            "title": "Root",
            "content": "r",
            "veracity": "NOT_A_VERACITY",
            "tone": "not-an-array"
        }"#;
        let imported = import_analysis(text).unwrap();
        assert!(imported.tree.veracity.is_none());
        assert!(imported.tree.tone.is_none());
    }

    #[test]
    fn test_invalid_json_is_a_parse_error() {
        let err = import_analysis("not json").unwrap_err();
        assert!(matches!(err, ImportError::Parse(_)));
    }
}
