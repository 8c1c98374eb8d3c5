//! Summary projection: a pure derivation from the analysis tree into
//! aggregate statistics and extracted profile/motion lists.
//!
//! Category nodes are located by a case-insensitive substring match of a
//! fixed lookup phrase against the root's direct children; a missing
//! category yields a zero count or placeholder text, never an error.

use crate::model::{AnalysisNode, AnalysisSummaryData, KeyIndividual, SuggestedMotion};
use crate::tree;

/// The top-level categories the provider is instructed to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    KeyClaims,
    Inconsistencies,
    Questions,
    DeponentProfile,
    ProsecutionProfile,
    DefenseProfile,
    CourtPerspective,
    KeyIndividuals,
    SuggestedMotions,
}

impl Category {
    /// The phrase matched against child titles to locate this category.
    pub fn lookup_phrase(&self) -> &'static str {
        match self {
            Category::KeyClaims => "key claims",
            Category::Inconsistencies => "inconsistencies",
            Category::Questions => "questions for cross-examination",
            Category::DeponentProfile => "deponent profile",
            Category::ProsecutionProfile => "assumed prosecution profile",
            Category::DefenseProfile => "assumed defense profile",
            Category::CourtPerspective => "court's perspective",
            Category::KeyIndividuals => "key individuals",
            Category::SuggestedMotions => "suggested motions",
        }
    }

    /// Locate this category among the root's direct children.
    /// First match wins; absence is a first-class result.
    pub fn find<'a>(&self, root: &'a AnalysisNode) -> Option<&'a AnalysisNode> {
        tree::child_with_title(root, self.lookup_phrase())
    }
}

/// Project the tree into an [`AnalysisSummaryData`].
///
/// Pure and deterministic: recomputing on an unchanged tree yields an
/// identical result.
pub fn summarize(root: &AnalysisNode) -> AnalysisSummaryData {
    let mut summary = AnalysisSummaryData::default();

    if let Some(node) = Category::KeyClaims.find(root) {
        summary.key_claims = node.children.len() as u32;
    }
    if let Some(node) = Category::Inconsistencies.find(root) {
        summary.inconsistencies = node.children.len() as u32;
    }
    if let Some(node) = Category::Questions.find(root) {
        summary.questions = node.children.len() as u32;
    }

    if let Some(node) = Category::DeponentProfile.find(root) {
        if !node.content.is_empty() {
            summary.deponent_profile = node.content.clone();
        }
    }
    if let Some(node) = Category::ProsecutionProfile.find(root) {
        if !node.content.is_empty() {
            summary.prosecution_profile = node.content.clone();
        }
    }
    if let Some(node) = Category::DefenseProfile.find(root) {
        if !node.content.is_empty() {
            summary.defense_profile = node.content.clone();
        }
    }
    if let Some(node) = Category::CourtPerspective.find(root) {
        if !node.content.is_empty() {
            summary.court_profile = node.content.clone();
        }
    }

    if let Some(node) = Category::KeyIndividuals.find(root) {
        summary.key_individuals = node
            .children
            .iter()
            .map(|child| KeyIndividual {
                name: child.title.clone(),
                role: child.content.clone(),
            })
            .collect();
    }

    if let Some(node) = Category::SuggestedMotions.find(root) {
        summary.suggested_motions = node
            .children
            .iter()
            .enumerate()
            .map(|(index, child)| SuggestedMotion {
                id: format!("motion-{}", index),
                motion_type: child.title.clone(),
                justification: child.content.clone(),
                source_node_id: child.source_node_id.clone(),
            })
            .collect();
    }

    collect_stats(root, &mut summary);
    summary
}

/// Accumulate veracity/tone/indicator counts over the whole tree,
/// not limited to specific categories.
fn collect_stats(node: &AnalysisNode, summary: &mut AnalysisSummaryData) {
    if let Some(veracity) = node.veracity {
        summary.veracity_counts.increment(veracity);
    }
    if let Some(tone) = &node.tone {
        for keyword in tone {
            *summary.tone_counts.entry(keyword.clone()).or_insert(0) += 1;
        }
    }
    if let Some(indicators) = &node.indicators {
        for indicator in indicators {
            *summary
                .indicator_counts
                .entry(indicator.to_string())
                .or_insert(0) += 1;
        }
    }
    for child in &node.children {
        collect_stats(child, summary);
    }
}
