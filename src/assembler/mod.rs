//! Incremental tree assembly from the provider's flat record stream.
//!
//! Records arrive parent-before-child but arbitrarily interleaved across
//! subtrees. The assembler batches records to limit snapshot churn: every
//! [`BATCH_SIZE`] records it materializes the tree once and hands the
//! caller a snapshot, then flushes whatever is buffered when the stream
//! ends or fails. Partial results survive a mid-stream failure.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::model::{AnalysisNode, FlatAnalysisNode};
use crate::tree;

/// Number of records accumulated before a snapshot is materialized.
pub const BATCH_SIZE: usize = 5;

/// Result of consuming one record stream to completion.
#[derive(Debug)]
pub struct AssemblyOutcome {
    /// The assembled tree. Present as soon as a root record was seen,
    /// even when the stream later failed.
    pub tree: Option<AnalysisNode>,
    /// Records received from the stream, placed or not.
    pub consumed: usize,
    /// Records dropped because their parent was unknown, or because a
    /// second root arrived.
    pub dropped: usize,
    /// Terminal transport error, if the stream did not end normally.
    pub error: Option<ProviderError>,
}

/// Assembles an [`AnalysisNode`] tree from streamed flat records.
pub struct StreamAssembler {
    batch_size: usize,
    source_file_hash: Option<String>,
}

impl StreamAssembler {
    /// Create an assembler with the default batch size.
    pub fn new() -> Self {
        Self {
            batch_size: BATCH_SIZE,
            source_file_hash: None,
        }
    }

    /// Override the batch size (tests only need this).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Stamp the root node with the source document hash on arrival.
    pub fn with_source_file_hash(mut self, hash: impl Into<String>) -> Self {
        self.source_file_hash = Some(hash.into());
        self
    }

    /// Consume the stream to completion, emitting a snapshot after each
    /// flushed batch. The final snapshot is emitted before returning.
    pub async fn assemble<F>(
        &self,
        mut records: mpsc::Receiver<Result<FlatAnalysisNode, ProviderError>>,
        mut on_snapshot: F,
    ) -> AssemblyOutcome
    where
        F: FnMut(&AnalysisNode),
    {
        let mut tree: Option<AnalysisNode> = None;
        let mut buffer: Vec<FlatAnalysisNode> = Vec::with_capacity(self.batch_size);
        let mut consumed = 0usize;
        let mut dropped = 0usize;
        let mut error = None;

        while let Some(event) = records.recv().await {
            match event {
                Ok(record) => {
                    consumed += 1;
                    buffer.push(record);
                    if buffer.len() >= self.batch_size {
                        self.flush(&mut buffer, &mut tree, &mut dropped);
                        if let Some(root) = &tree {
                            on_snapshot(root);
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Record stream terminated with error");
                    error = Some(e);
                    break;
                }
            }
        }

        // Flush whatever is left, on normal end and on error alike.
        if !buffer.is_empty() {
            self.flush(&mut buffer, &mut tree, &mut dropped);
            if let Some(root) = &tree {
                on_snapshot(root);
            }
        }

        debug!(consumed, dropped, "Stream assembly finished");

        AssemblyOutcome {
            tree,
            consumed,
            dropped,
            error,
        }
    }

    fn flush(
        &self,
        buffer: &mut Vec<FlatAnalysisNode>,
        tree: &mut Option<AnalysisNode>,
        dropped: &mut usize,
    ) {
        for flat in buffer.drain(..) {
            match tree {
                None => {
                    // First record becomes the root; its parentId is a
                    // trusted precondition, not validated here.
                    let mut root = AnalysisNode::from_flat(flat);
                    root.source_file_hash = self.source_file_hash.clone();
                    *tree = Some(root);
                }
                Some(root) => match flat.parent_id.clone() {
                    Some(parent_id) => {
                        let id = flat.id.clone();
                        if !tree::insert_child(root, &parent_id, AnalysisNode::from_flat(flat)) {
                            debug!(node_id = %id, parent_id = %parent_id, "Dropping orphan record");
                            *dropped += 1;
                        }
                    }
                    None => {
                        debug!(node_id = %flat.id, "Dropping second root record");
                        *dropped += 1;
                    }
                },
            }
        }
    }
}

impl Default for StreamAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Veracity;
    use crate::tree;

    async fn run(
        assembler: StreamAssembler,
        records: Vec<Result<FlatAnalysisNode, ProviderError>>,
    ) -> (AssemblyOutcome, usize) {
        let (tx, rx) = mpsc::channel(16);
        for record in records {
            tx.send(record).await.unwrap();
        }
        drop(tx);

        let mut snapshots = 0;
        let outcome = assembler.assemble(rx, |_| snapshots += 1).await;
        (outcome, snapshots)
    }

    fn sample_records() -> Vec<Result<FlatAnalysisNode, ProviderError>> {
        vec![
            Ok(FlatAnalysisNode::new("r", None, "Testimony Summary", "...")),
            Ok(FlatAnalysisNode::new("a", Some("r"), "Key Claims Made", "...")),
            Ok(FlatAnalysisNode::new("a1", Some("a"), "Claim 1", "X said Y")
                .with_veracity(Veracity::Uncertain)),
        ]
    }

    #[tokio::test]
    async fn test_assembles_tree_in_arrival_order() {
        let (outcome, _) = run(StreamAssembler::new(), sample_records()).await;

        let root = outcome.tree.expect("tree should exist");
        assert_eq!(root.id, "r");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].id, "a");
        assert_eq!(root.children[0].children[0].id, "a1");
        assert_eq!(outcome.consumed, 3);
        assert_eq!(outcome.dropped, 0);
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn test_node_count_matches_consumed_minus_dropped() {
        let mut records = sample_records();
        records.push(Ok(FlatAnalysisNode::new(
            "orphan",
            Some("ghost"),
            "Orphan",
            "",
        )));

        let (outcome, _) = run(StreamAssembler::new(), records).await;
        let root = outcome.tree.unwrap();
        assert_eq!(outcome.consumed, 4);
        assert_eq!(outcome.dropped, 1);
        assert_eq!(tree::count(&root), outcome.consumed - outcome.dropped);
    }

    #[tokio::test]
    async fn test_second_root_record_is_dropped() {
        let mut records = sample_records();
        records.push(Ok(FlatAnalysisNode::new("r2", None, "Another Root", "")));

        let (outcome, _) = run(StreamAssembler::new(), records).await;
        assert_eq!(outcome.dropped, 1);
        assert_eq!(outcome.tree.unwrap().id, "r");
    }

    #[tokio::test]
    async fn test_batching_emits_snapshot_per_flush() {
        let mut records = vec![Ok(FlatAnalysisNode::new("r", None, "Root", ""))];
        for i in 0..6 {
            records.push(Ok(FlatAnalysisNode::new(
                format!("c{}", i),
                Some("r"),
                format!("Child {}", i),
                "",
            )));
        }

        // 7 records with batch size 5: one full batch, one final flush.
        let (outcome, snapshots) = run(StreamAssembler::new(), records).await;
        assert_eq!(snapshots, 2);
        assert_eq!(tree::count(&outcome.tree.unwrap()), 7);
    }

    #[tokio::test]
    async fn test_children_preserve_arrival_order() {
        let mut records = vec![Ok(FlatAnalysisNode::new("r", None, "Root", ""))];
        for i in 0..9 {
            records.push(Ok(FlatAnalysisNode::new(
                format!("c{}", i),
                Some("r"),
                format!("Child {}", i),
                "",
            )));
        }

        let (outcome, _) = run(StreamAssembler::new().with_batch_size(3), records).await;
        let root = outcome.tree.unwrap();
        let ids: Vec<&str> = root.children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c0", "c1", "c2", "c3", "c4", "c5", "c6", "c7", "c8"]);
    }

    #[tokio::test]
    async fn test_error_retains_partial_tree() {
        let records = vec![
            Ok(FlatAnalysisNode::new("r", None, "Root", "")),
            Ok(FlatAnalysisNode::new("a", Some("r"), "Claims", "")),
            Err(ProviderError::Stream {
                message: "connection reset".to_string(),
            }),
        ];

        let (outcome, _) = run(StreamAssembler::new(), records).await;
        assert!(outcome.error.is_some());
        let root = outcome.tree.expect("partial tree must be retained");
        assert_eq!(tree::count(&root), 2);
    }

    #[tokio::test]
    async fn test_root_receives_source_file_hash() {
        let (outcome, _) = run(
            StreamAssembler::new().with_source_file_hash("abc123"),
            sample_records(),
        )
        .await;

        let root = outcome.tree.unwrap();
        assert_eq!(root.source_file_hash.as_deref(), Some("abc123"));
        assert!(root.children[0].source_file_hash.is_none());
    }

    #[tokio::test]
    async fn test_empty_stream_yields_no_tree() {
        let (outcome, snapshots) = run(StreamAssembler::new(), vec![]).await;
        assert!(outcome.tree.is_none());
        assert_eq!(outcome.consumed, 0);
        assert_eq!(snapshots, 0);
    }
}
