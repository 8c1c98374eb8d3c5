//! Search and facet filtering over the analysis tree.
//!
//! Filtering is a pure, non-destructive projection: the result is a
//! pruned copy that keeps every matching node plus the ancestors needed
//! to reach it, so a match is always visible in tree context.

use std::collections::BTreeSet;

use crate::model::{AnalysisNode, Indicator, Veracity};

/// Text query plus veracity/indicator facets. Empty facet sets impose
/// no restriction.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    pub query: String,
    pub veracities: BTreeSet<Veracity>,
    pub indicators: BTreeSet<Indicator>,
}

impl FilterCriteria {
    /// Criteria matching everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the free-text query.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Require one of the given veracity values.
    pub fn with_veracities(mut self, veracities: impl IntoIterator<Item = Veracity>) -> Self {
        self.veracities = veracities.into_iter().collect();
        self
    }

    /// Require at least one of the given indicators.
    pub fn with_indicators(mut self, indicators: impl IntoIterator<Item = Indicator>) -> Self {
        self.indicators = indicators.into_iter().collect();
        self
    }

    /// True when no query or facet is active.
    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.veracities.is_empty() && self.indicators.is_empty()
    }

    fn matches(&self, node: &AnalysisNode) -> bool {
        let query = self.query.to_lowercase();
        let query_match = query.is_empty()
            || node.title.to_lowercase().contains(&query)
            || node.content.to_lowercase().contains(&query)
            || node.notes.to_lowercase().contains(&query);

        let veracity_match = self.veracities.is_empty()
            || node
                .veracity
                .map(|v| self.veracities.contains(&v))
                .unwrap_or(false);

        let indicator_match = self.indicators.is_empty()
            || node
                .indicators
                .as_ref()
                .map(|is| is.iter().any(|i| self.indicators.contains(i)))
                .unwrap_or(false);

        query_match && veracity_match && indicator_match
    }
}

/// Produce the pruned tree matching `criteria`, or None when nothing
/// matches. Ancestors of a match are retained even if they fail the
/// predicate themselves; retained nodes carry their filtered children.
pub fn filter_tree(node: &AnalysisNode, criteria: &FilterCriteria) -> Option<AnalysisNode> {
    let children: Vec<AnalysisNode> = node
        .children
        .iter()
        .filter_map(|child| filter_tree(child, criteria))
        .collect();

    if criteria.matches(node) || !children.is_empty() {
        let mut kept = node.clone();
        kept.children = children;
        Some(kept)
    } else {
        None
    }
}
