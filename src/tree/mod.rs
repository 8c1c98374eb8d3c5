//! Tree store operations over [`AnalysisNode`].
//!
//! The tree is uniquely owned, so targeted mutation through a mutable
//! borrow touches only the path to the affected node; unrelated subtrees
//! are never reallocated. Children are append-only during assembly and
//! keep arrival order.

use crate::model::AnalysisNode;

/// Find a node by id, depth-first.
pub fn find<'a>(root: &'a AnalysisNode, id: &str) -> Option<&'a AnalysisNode> {
    if root.id == id {
        return Some(root);
    }
    root.children.iter().find_map(|child| find(child, id))
}

/// Find a node by id, depth-first, returning a mutable reference.
pub fn find_mut<'a>(root: &'a mut AnalysisNode, id: &str) -> Option<&'a mut AnalysisNode> {
    if root.id == id {
        return Some(root);
    }
    root.children
        .iter_mut()
        .find_map(|child| find_mut(child, id))
}

/// Append `child` under the node with id `parent_id`.
///
/// Returns false (tree unchanged) when the parent is unknown.
pub fn insert_child(root: &mut AnalysisNode, parent_id: &str, child: AnalysisNode) -> bool {
    match find_mut(root, parent_id) {
        Some(parent) => {
            parent.children.push(child);
            true
        }
        None => false,
    }
}

/// Apply `patch` to the node with the given id.
///
/// Returns false when no node matches; the tree is untouched in that case.
pub fn update<F>(root: &mut AnalysisNode, id: &str, patch: F) -> bool
where
    F: FnOnce(&mut AnalysisNode),
{
    match find_mut(root, id) {
        Some(node) => {
            patch(node);
            true
        }
        None => false,
    }
}

/// Apply `patch` to every node in the tree, depth-first.
pub fn update_all<F>(root: &mut AnalysisNode, patch: F)
where
    F: Fn(&mut AnalysisNode) + Copy,
{
    patch(root);
    for child in &mut root.children {
        update_all(child, patch);
    }
}

/// Collect every node id in depth-first order.
pub fn collect_ids(root: &AnalysisNode) -> Vec<String> {
    let mut ids = Vec::new();
    collect_ids_into(root, &mut ids);
    ids
}

fn collect_ids_into(node: &AnalysisNode, ids: &mut Vec<String>) {
    ids.push(node.id.clone());
    for child in &node.children {
        collect_ids_into(child, ids);
    }
}

/// Total node count, root included.
pub fn count(root: &AnalysisNode) -> usize {
    1 + root.children.iter().map(count).sum::<usize>()
}

/// Find the first direct child whose title contains `phrase`,
/// case-insensitively.
pub fn child_with_title<'a>(node: &'a AnalysisNode, phrase: &str) -> Option<&'a AnalysisNode> {
    let phrase = phrase.to_lowercase();
    node.children
        .iter()
        .find(|c| c.title.to_lowercase().contains(&phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> AnalysisNode {
        AnalysisNode::new("r", "Testimony Summary", "root")
            .with_child(
                AnalysisNode::new("a", "Key Claims Made", "claims")
                    .with_child(AnalysisNode::new("a1", "Claim 1", "X said Y")),
            )
            .with_child(AnalysisNode::new("b", "Potential Inconsistencies", "issues"))
    }

    #[test]
    fn test_find_descends_depth_first() {
        let tree = sample_tree();
        assert_eq!(find(&tree, "a1").unwrap().title, "Claim 1");
        assert!(find(&tree, "missing").is_none());
    }

    #[test]
    fn test_insert_child_appends_in_order() {
        let mut tree = sample_tree();
        assert!(insert_child(
            &mut tree,
            "a",
            AnalysisNode::new("a2", "Claim 2", "Z happened"),
        ));

        let claims = find(&tree, "a").unwrap();
        let ids: Vec<&str> = claims.children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2"]);
    }

    #[test]
    fn test_insert_child_unknown_parent_leaves_tree_unchanged() {
        let mut tree = sample_tree();
        let before = tree.clone();
        assert!(!insert_child(
            &mut tree,
            "nope",
            AnalysisNode::new("x", "Orphan", ""),
        ));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_update_targets_only_matching_node() {
        let mut tree = sample_tree();
        assert!(update(&mut tree, "a1", |n| {
            n.notes = "check transcript page 14".to_string();
        }));

        assert_eq!(find(&tree, "a1").unwrap().notes, "check transcript page 14");
        assert!(find(&tree, "b").unwrap().notes.is_empty());
    }

    #[test]
    fn test_update_unknown_id_returns_false() {
        let mut tree = sample_tree();
        assert!(!update(&mut tree, "zzz", |n| n.notes = "x".to_string()));
    }

    #[test]
    fn test_update_all_visits_every_node() {
        let mut tree = sample_tree();
        update_all(&mut tree, |n| n.is_selected = true);
        assert!(collect_ids(&tree)
            .iter()
            .all(|id| find(&tree, id).unwrap().is_selected));
    }

    #[test]
    fn test_collect_ids_depth_first_order() {
        let tree = sample_tree();
        assert_eq!(collect_ids(&tree), vec!["r", "a", "a1", "b"]);
        assert_eq!(count(&tree), 4);
    }

    #[test]
    fn test_child_with_title_is_case_insensitive_first_match() {
        let tree = sample_tree();
        let found = child_with_title(&tree, "key claims").unwrap();
        assert_eq!(found.id, "a");
        assert!(child_with_title(&tree, "suggested motions").is_none());
    }
}
