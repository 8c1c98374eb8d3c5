//! Core data model for deposition analysis trees.
//!
//! An analysis is a tree of [`AnalysisNode`]s assembled from the flat
//! [`FlatAnalysisNode`] records streamed by the model provider. Derived
//! read models ([`AnalysisSummaryData`]) are projected from the tree on
//! demand and never stored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Credibility assessment attached to an analysis node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Veracity {
    Verified,
    LikelyTrue,
    Uncertain,
    Contradictory,
    Unsupported,
}

impl Veracity {
    /// All variants, in the fixed order used by summary counts.
    pub const ALL: [Veracity; 5] = [
        Veracity::Verified,
        Veracity::LikelyTrue,
        Veracity::Uncertain,
        Veracity::Contradictory,
        Veracity::Unsupported,
    ];
}

impl std::fmt::Display for Veracity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Veracity::Verified => write!(f, "VERIFIED"),
            Veracity::LikelyTrue => write!(f, "LIKELY_TRUE"),
            Veracity::Uncertain => write!(f, "UNCERTAIN"),
            Veracity::Contradictory => write!(f, "CONTRADICTORY"),
            Veracity::Unsupported => write!(f, "UNSUPPORTED"),
        }
    }
}

impl std::str::FromStr for Veracity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "VERIFIED" => Ok(Veracity::Verified),
            "LIKELY_TRUE" => Ok(Veracity::LikelyTrue),
            "UNCERTAIN" => Ok(Veracity::Uncertain),
            "CONTRADICTORY" => Ok(Veracity::Contradictory),
            "UNSUPPORTED" => Ok(Veracity::Unsupported),
            _ => Err(format!("Unknown veracity: {}", s)),
        }
    }
}

/// Legal-significance tag attached to an analysis node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Indicator {
    Exculpatory,
    Inculpatory,
    Hearsay,
}

impl std::fmt::Display for Indicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Indicator::Exculpatory => write!(f, "EXCULPATORY"),
            Indicator::Inculpatory => write!(f, "INCULPATORY"),
            Indicator::Hearsay => write!(f, "HEARSAY"),
        }
    }
}

impl std::str::FromStr for Indicator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "EXCULPATORY" => Ok(Indicator::Exculpatory),
            "INCULPATORY" => Ok(Indicator::Inculpatory),
            "HEARSAY" => Ok(Indicator::Hearsay),
            _ => Err(format!("Unknown indicator: {}", s)),
        }
    }
}

/// A single source cited by a fact-check result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub uri: String,
    pub title: String,
}

/// Fact-check result attached to a node: a summary plus cited sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingData {
    pub summary: String,
    #[serde(default)]
    pub sources: Vec<GroundingSource>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A node in the analysis tree.
///
/// Nodes own their children exclusively; the tree has a single root and
/// no cycles. The `is_exploring`/`is_fact_checking` flags are transient
/// UI state and are stripped from exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisNode {
    /// Unique identifier within a tree instance.
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub veracity: Option<Veracity>,
    /// Free-text tone keywords (multiplicity allowed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicators: Option<Vec<Indicator>>,
    /// Verbatim excerpt from the source document this node refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
    /// Counter-argument text produced by the explore operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding: Option<GroundingData>,
    /// Back-reference (not ownership) to the node that justifies this one.
    /// Used by suggested-motion nodes to cite their supporting claim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_node_id: Option<String>,
    /// Hex SHA-256 of the originating document. Root node only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file_hash: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    /// Whether the user marked this node for export.
    #[serde(default)]
    pub is_selected: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_exploring: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_fact_checking: bool,
    #[serde(default)]
    pub children: Vec<AnalysisNode>,
}

/// The flat wire record streamed by the provider, one per NDJSON line.
///
/// Tree shape is reconstructed from `parent_id` references; the single
/// root record carries `parent_id: null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatAnalysisNode {
    pub id: String,
    pub parent_id: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub veracity: Option<Veracity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicators: Option<Vec<Indicator>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_node_id: Option<String>,
}

impl AnalysisNode {
    /// Create a new node with empty children, notes and transient flags.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            veracity: None,
            tone: None,
            indicators: None,
            source_text: None,
            alternative: None,
            grounding: None,
            source_node_id: None,
            source_file_hash: None,
            notes: String::new(),
            is_selected: false,
            is_exploring: false,
            is_fact_checking: false,
            children: Vec::new(),
        }
    }

    /// Construct a tree node from a streamed flat record.
    pub fn from_flat(flat: FlatAnalysisNode) -> Self {
        let mut node = Self::new(flat.id, flat.title, flat.content);
        node.veracity = flat.veracity;
        node.tone = flat.tone;
        node.indicators = flat.indicators;
        node.source_text = flat.source_text;
        node.source_node_id = flat.source_node_id;
        node
    }

    /// Set the veracity assessment
    pub fn with_veracity(mut self, veracity: Veracity) -> Self {
        self.veracity = Some(veracity);
        self
    }

    /// Set the tone keywords
    pub fn with_tone(mut self, tone: Vec<String>) -> Self {
        self.tone = Some(tone);
        self
    }

    /// Set the legal-significance indicators
    pub fn with_indicators(mut self, indicators: Vec<Indicator>) -> Self {
        self.indicators = Some(indicators);
        self
    }

    /// Set the verbatim source excerpt
    pub fn with_source_text(mut self, source_text: impl Into<String>) -> Self {
        self.source_text = Some(source_text.into());
        self
    }

    /// Set the back-reference to a justifying node
    pub fn with_source_node_id(mut self, source_node_id: impl Into<String>) -> Self {
        self.source_node_id = Some(source_node_id.into());
        self
    }

    /// Append a child node
    pub fn with_child(mut self, child: AnalysisNode) -> Self {
        self.children.push(child);
        self
    }
}

impl FlatAnalysisNode {
    /// Create a flat record with the given identity and parent.
    pub fn new(
        id: impl Into<String>,
        parent_id: Option<&str>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.map(|p| p.to_string()),
            title: title.into(),
            content: content.into(),
            source_text: None,
            veracity: None,
            tone: None,
            indicators: None,
            source_node_id: None,
        }
    }

    /// Set the veracity assessment
    pub fn with_veracity(mut self, veracity: Veracity) -> Self {
        self.veracity = Some(veracity);
        self
    }

    /// Set the legal-significance indicators
    pub fn with_indicators(mut self, indicators: Vec<Indicator>) -> Self {
        self.indicators = Some(indicators);
        self
    }

    /// Set the tone keywords
    pub fn with_tone(mut self, tone: Vec<String>) -> Self {
        self.tone = Some(tone);
        self
    }
}

/// Counts per veracity value. All five buckets are always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct VeracityCounts {
    pub verified: u32,
    pub likely_true: u32,
    pub uncertain: u32,
    pub contradictory: u32,
    pub unsupported: u32,
}

impl VeracityCounts {
    /// Increment the bucket for the given veracity value.
    pub fn increment(&mut self, veracity: Veracity) {
        match veracity {
            Veracity::Verified => self.verified += 1,
            Veracity::LikelyTrue => self.likely_true += 1,
            Veracity::Uncertain => self.uncertain += 1,
            Veracity::Contradictory => self.contradictory += 1,
            Veracity::Unsupported => self.unsupported += 1,
        }
    }

    /// Read the bucket for the given veracity value.
    pub fn get(&self, veracity: Veracity) -> u32 {
        match veracity {
            Veracity::Verified => self.verified,
            Veracity::LikelyTrue => self.likely_true,
            Veracity::Uncertain => self.uncertain,
            Veracity::Contradictory => self.contradictory,
            Veracity::Unsupported => self.unsupported,
        }
    }
}

/// A person extracted from the key-individuals category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyIndividual {
    pub name: String,
    pub role: String,
}

/// A motion suggestion extracted from the suggested-motions category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedMotion {
    /// Synthetic `motion-{index}` identifier.
    pub id: String,
    /// Motion type, e.g. "Motion to Compel Further Testimony".
    pub motion_type: String,
    pub justification: String,
    /// Id of the analysis node that justifies this motion, if cited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_node_id: Option<String>,
}

/// Derived, non-owning read model of an analysis tree.
///
/// Produced by [`crate::summary::summarize`]; deterministic for a given
/// tree, so it can be recomputed at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummaryData {
    pub key_claims: u32,
    pub inconsistencies: u32,
    pub questions: u32,
    pub veracity_counts: VeracityCounts,
    /// Discovered tone keyword -> occurrence count. Keys appear only if
    /// observed at least once.
    pub tone_counts: BTreeMap<String, u32>,
    pub indicator_counts: BTreeMap<String, u32>,
    pub deponent_profile: String,
    pub prosecution_profile: String,
    pub defense_profile: String,
    pub court_profile: String,
    pub key_individuals: Vec<KeyIndividual>,
    pub suggested_motions: Vec<SuggestedMotion>,
}

impl Default for AnalysisSummaryData {
    fn default() -> Self {
        Self {
            key_claims: 0,
            inconsistencies: 0,
            questions: 0,
            veracity_counts: VeracityCounts::default(),
            tone_counts: BTreeMap::new(),
            indicator_counts: BTreeMap::new(),
            deponent_profile: "No profile generated.".to_string(),
            prosecution_profile: "Not generated.".to_string(),
            defense_profile: "Not generated.".to_string(),
            court_profile: "Not generated.".to_string(),
            key_individuals: Vec::new(),
            suggested_motions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_veracity_wire_format() {
        let json = serde_json::to_string(&Veracity::LikelyTrue).unwrap();
        assert_eq!(json, "\"LIKELY_TRUE\"");

        let parsed: Veracity = serde_json::from_str("\"CONTRADICTORY\"").unwrap();
        assert_eq!(parsed, Veracity::Contradictory);
    }

    #[test]
    fn test_veracity_from_str() {
        assert_eq!("verified".parse::<Veracity>().unwrap(), Veracity::Verified);
        assert!("PLAUSIBLE".parse::<Veracity>().is_err());
    }

    #[test]
    fn test_indicator_wire_format() {
        let json = serde_json::to_string(&Indicator::Hearsay).unwrap();
        assert_eq!(json, "\"HEARSAY\"");
    }

    #[test]
    fn test_flat_node_deserializes_camel_case() {
        let flat: FlatAnalysisNode = serde_json::from_str(
            r#"{"id":"a1","parentId":"a","title":"Claim 1","content":"X said Y","veracity":"UNCERTAIN","sourceText":"quote"}"#,
        )
        .unwrap();
        assert_eq!(flat.id, "a1");
        assert_eq!(flat.parent_id.as_deref(), Some("a"));
        assert_eq!(flat.veracity, Some(Veracity::Uncertain));
        assert_eq!(flat.source_text.as_deref(), Some("quote"));
    }

    #[test]
    fn test_node_serialization_omits_transient_flags_when_false() {
        let node = AnalysisNode::new("r", "Root", "content");
        let json = serde_json::to_string(&node).unwrap();
        assert!(!json.contains("isExploring"));
        assert!(!json.contains("isFactChecking"));
        // isSelected is part of the export contract and always present
        assert!(json.contains("\"isSelected\":false"));
    }

    #[test]
    fn test_node_from_flat_initializes_defaults() {
        let flat = FlatAnalysisNode::new("a1", Some("a"), "Claim", "text")
            .with_veracity(Veracity::Verified)
            .with_indicators(vec![Indicator::Hearsay]);
        let node = AnalysisNode::from_flat(flat);

        assert_eq!(node.id, "a1");
        assert!(node.children.is_empty());
        assert!(node.notes.is_empty());
        assert!(!node.is_selected && !node.is_exploring && !node.is_fact_checking);
        assert_eq!(node.veracity, Some(Veracity::Verified));
        assert_eq!(node.indicators, Some(vec![Indicator::Hearsay]));
    }

    #[test]
    fn test_veracity_counts_increment_and_get() {
        let mut counts = VeracityCounts::default();
        counts.increment(Veracity::Uncertain);
        counts.increment(Veracity::Uncertain);
        counts.increment(Veracity::Verified);

        assert_eq!(counts.get(Veracity::Uncertain), 2);
        assert_eq!(counts.get(Veracity::Verified), 1);
        assert_eq!(counts.get(Veracity::Unsupported), 0);
    }

    #[test]
    fn test_veracity_counts_serializes_all_buckets() {
        let json = serde_json::to_value(VeracityCounts::default()).unwrap();
        for v in Veracity::ALL {
            assert!(json.get(v.to_string()).is_some(), "missing bucket {}", v);
        }
    }
}
