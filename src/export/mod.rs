//! Selection pruning and content-addressed export.
//!
//! Exports operate on the subset of the tree the user selected, widened
//! to include the structural ancestors of every selection so the result
//! is still a rooted tree. Both export formats embed a SHA-256 of the
//! source document and a self-referential SHA-256 of themselves.

mod hash;
mod html;
mod json;

pub use hash::{seal_document, sha256_hex};
pub use html::{export_html, HTML_EXPORT_FILENAME};
pub use json::{
    export_json, verify_report_hash, ExportDocument, ExportMetadata, HashField, ReportVerification,
    VerificationInstructions, JSON_EXPORT_FILENAME, REPORT_HASH_PLACEHOLDER,
};

use std::collections::BTreeSet;

use crate::model::AnalysisNode;

/// Prune the tree to the selected subset plus structural ancestors.
///
/// A node is kept when it is selected or has a kept descendant. Kept
/// nodes are cleaned for export: transient flags and the root's source
/// hash are stripped, and `is_selected` reflects explicit selection
/// rather than ancestor status.
pub fn prune_to_selected(
    node: &AnalysisNode,
    selected: &BTreeSet<String>,
) -> Option<AnalysisNode> {
    let children: Vec<AnalysisNode> = node
        .children
        .iter()
        .filter_map(|child| prune_to_selected(child, selected))
        .collect();

    if selected.contains(&node.id) || !children.is_empty() {
        let mut kept = node.clone();
        kept.children = children;
        kept.is_selected = selected.contains(&node.id);
        kept.is_exploring = false;
        kept.is_fact_checking = false;
        kept.source_file_hash = None;
        Some(kept)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree;

    fn sample_tree() -> AnalysisNode {
        AnalysisNode::new("r", "Testimony Summary", "root")
            .with_child(
                AnalysisNode::new("a", "Key Claims Made", "claims")
                    .with_child(AnalysisNode::new("a1", "Claim 1", "X said Y"))
                    .with_child(AnalysisNode::new("a2", "Claim 2", "Z happened")),
            )
            .with_child(AnalysisNode::new("b", "Underlying Assumptions", ""))
    }

    #[test]
    fn test_ancestors_included_siblings_excluded() {
        let tree = sample_tree();
        let selected: BTreeSet<String> = ["a1".to_string()].into();
        let pruned = prune_to_selected(&tree, &selected).unwrap();

        assert_eq!(tree::collect_ids(&pruned), vec!["r", "a", "a1"]);
        assert!(tree::find(&pruned, "a2").is_none());
        assert!(tree::find(&pruned, "b").is_none());
    }

    #[test]
    fn test_is_selected_reflects_explicit_selection_only() {
        let tree = sample_tree();
        let selected: BTreeSet<String> = ["a1".to_string()].into();
        let pruned = prune_to_selected(&tree, &selected).unwrap();

        assert!(tree::find(&pruned, "a1").unwrap().is_selected);
        assert!(!tree::find(&pruned, "a").unwrap().is_selected);
        assert!(!pruned.is_selected);
    }

    #[test]
    fn test_transient_state_is_stripped() {
        let mut tree = sample_tree();
        tree.source_file_hash = Some("deadbeef".to_string());
        tree::update(&mut tree, "a1", |n| {
            n.is_exploring = true;
            n.is_fact_checking = true;
        });

        let selected: BTreeSet<String> = ["a1".to_string()].into();
        let pruned = prune_to_selected(&tree, &selected).unwrap();

        assert!(pruned.source_file_hash.is_none());
        let a1 = tree::find(&pruned, "a1").unwrap();
        assert!(!a1.is_exploring && !a1.is_fact_checking);
    }

    #[test]
    fn test_empty_selection_yields_none() {
        let tree = sample_tree();
        assert!(prune_to_selected(&tree, &BTreeSet::new()).is_none());
    }
}
