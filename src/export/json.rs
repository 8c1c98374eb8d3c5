//! JSON export format: a metadata wrapper around the pruned analysis
//! tree, carrying the source document hash and a self-referential
//! report hash.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::hash::{seal_document, sha256_hex};
use crate::error::{ImportError, ImportResult};
use crate::model::AnalysisNode;

/// Fixed download filename for the JSON export.
pub const JSON_EXPORT_FILENAME: &str = "analysis-export.json";

/// Placeholder serialized in place of the report hash before sealing.
pub const REPORT_HASH_PLACEHOLDER: &str = "CALCULATING...";

const SOURCE_VERIFICATION: &str = "To verify the integrity of the source document, calculate its SHA-256 hash using a local tool and compare it to the 'sourceDocumentHash' value. On macOS/Linux, use 'shasum -a 256 /path/to/your/file.pdf'. On Windows, use 'CertUtil -hashfile /path/to/your/file.pdf SHA256'.";

const REPORT_VERIFICATION: &str = "To verify the integrity of this report file, calculate its SHA-256 hash and compare it to the 'reportHash' value. The hash must be calculated on the file exactly as it was downloaded.";

/// An algorithm/value pair identifying a digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashField {
    pub algorithm: String,
    pub value: String,
}

impl HashField {
    fn sha256(value: impl Into<String>) -> Self {
        Self {
            algorithm: "SHA-256".to_string(),
            value: value.into(),
        }
    }
}

/// Human-readable verification instructions embedded in every export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationInstructions {
    pub source_document: String,
    pub this_report: String,
}

impl Default for VerificationInstructions {
    fn default() -> Self {
        Self {
            source_document: SOURCE_VERIFICATION.to_string(),
            this_report: REPORT_VERIFICATION.to_string(),
        }
    }
}

/// Export metadata block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub source_document_hash: HashField,
    pub report_hash: HashField,
    /// ISO-8601 export timestamp.
    pub exported_at: String,
    pub verification_instructions: VerificationInstructions,
}

/// The complete exported document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub metadata: ExportMetadata,
    pub analysis: AnalysisNode,
}

/// Serialize the pruned tree into the content-addressed JSON format.
///
/// Deterministic for a given tree and timestamp: the only varying field
/// is `exportedAt`, which the caller supplies.
pub fn export_json(
    tree: &AnalysisNode,
    source_file_hash: Option<&str>,
    exported_at: DateTime<Utc>,
) -> String {
    let document = ExportDocument {
        metadata: ExportMetadata {
            source_document_hash: HashField::sha256(source_file_hash.unwrap_or("N/A")),
            report_hash: HashField::sha256(REPORT_HASH_PLACEHOLDER),
            exported_at: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            verification_instructions: VerificationInstructions::default(),
        },
        analysis: tree.clone(),
    };

    // Serialization of a fixed struct is stable, so sealing the
    // placeholder and re-substituting changes exactly one field.
    let preliminary =
        serde_json::to_string_pretty(&document).expect("export document serializes to JSON");
    let (_, sealed) = seal_document(&preliminary, REPORT_HASH_PLACEHOLDER);
    sealed
}

/// Outcome of re-deriving an export's report hash.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportVerification {
    pub stored: String,
    pub computed: String,
}

impl ReportVerification {
    /// True when the stored and recomputed digests agree.
    pub fn is_valid(&self) -> bool {
        self.stored == self.computed
    }
}

/// Recompute the self-referential report hash of an exported JSON
/// document: blank the stored `reportHash.value` and hash the rest.
pub fn verify_report_hash(text: &str) -> ImportResult<ReportVerification> {
    let document: serde_json::Value = serde_json::from_str(text)?;
    let stored = document
        .get("metadata")
        .and_then(|m| m.get("reportHash"))
        .and_then(|h| h.get("value"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| ImportError::InvalidFormat {
            message: "document has no metadata.reportHash.value".to_string(),
        })?
        .to_string();

    let blanked = text.replacen(&stored, "", 1);
    let computed = sha256_hex(blanked.as_bytes());

    Ok(ReportVerification { stored, computed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Veracity;

    fn exported_at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn sample_tree() -> AnalysisNode {
        let mut root = AnalysisNode::new("r", "Testimony Summary", "root");
        root.is_selected = false;
        root.children.push(
            AnalysisNode::new("a1", "Claim 1", "X said Y").with_veracity(Veracity::Uncertain),
        );
        root
    }

    #[test]
    fn test_export_embeds_source_hash_and_timestamp() {
        let text = export_json(&sample_tree(), Some("cafe01"), exported_at());
        let parsed: ExportDocument = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed.metadata.source_document_hash.value, "cafe01");
        assert_eq!(parsed.metadata.source_document_hash.algorithm, "SHA-256");
        assert_eq!(parsed.metadata.exported_at, "2024-06-01T12:00:00.000Z");
        assert_eq!(parsed.analysis.id, "r");
    }

    #[test]
    fn test_export_without_source_hash_writes_na() {
        let text = export_json(&sample_tree(), None, exported_at());
        let parsed: ExportDocument = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.metadata.source_document_hash.value, "N/A");
    }

    #[test]
    fn test_report_hash_is_self_consistent() {
        let text = export_json(&sample_tree(), Some("cafe01"), exported_at());
        let verification = verify_report_hash(&text).unwrap();
        assert!(
            verification.is_valid(),
            "stored {} != computed {}",
            verification.stored,
            verification.computed
        );
    }

    #[test]
    fn test_tampering_breaks_the_report_hash() {
        let text = export_json(&sample_tree(), Some("cafe01"), exported_at());
        let tampered = text.replace("X said Y", "X said Z");
        let verification = verify_report_hash(&tampered).unwrap();
        assert!(!verification.is_valid());
    }

    #[test]
    fn test_export_is_deterministic_for_fixed_timestamp() {
        let tree = sample_tree();
        let first = export_json(&tree, Some("cafe01"), exported_at());
        let second = export_json(&tree, Some("cafe01"), exported_at());
        assert_eq!(first, second);
    }

    #[test]
    fn test_verify_rejects_document_without_metadata() {
        let err = verify_report_hash(r#"{"title":"t","content":"c"}"#).unwrap_err();
        assert!(matches!(err, ImportError::InvalidFormat { .. }));
    }
}
