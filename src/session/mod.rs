//! Session state and orchestration.
//!
//! [`SessionController`] owns the analysis tree and every piece of
//! per-session state around it, coordinates the provider calls, and
//! persists the durable slots through the storage layer. Derived data
//! (the summary, filtered views) is recomputed, never stored.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::assembler::StreamAssembler;
use crate::error::{AppError, AppResult};
use crate::export::{self, sha256_hex};
use crate::filter::{filter_tree, FilterCriteria};
use crate::gemini::GeminiClient;
use crate::import::import_analysis;
use crate::model::{AnalysisNode, AnalysisSummaryData, GroundingData, Indicator, Veracity};
use crate::storage::{keys, Storage};
use crate::summary::summarize;
use crate::tree;

/// The view the user is working in. Persisted so a restored session
/// reopens where it left off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActiveView {
    #[default]
    Dashboard,
    Mindmap,
}

impl std::fmt::Display for ActiveView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActiveView::Dashboard => write!(f, "dashboard"),
            ActiveView::Mindmap => write!(f, "mindmap"),
        }
    }
}

impl std::str::FromStr for ActiveView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dashboard" => Ok(ActiveView::Dashboard),
            "mindmap" => Ok(ActiveView::Mindmap),
            _ => Err(format!("Unknown view: {}", s)),
        }
    }
}

/// All per-session state.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub analysis: Option<AnalysisNode>,
    /// Recomputed from `analysis`; present whenever `analysis` is.
    pub summary: Option<AnalysisSummaryData>,
    pub selected_ids: BTreeSet<String>,
    pub collapsed_ids: BTreeSet<String>,
    pub source_file_hash: Option<String>,
    pub document_text: String,
    pub document_file_name: Option<String>,
    pub active_node_id: Option<String>,
    pub active_view: ActiveView,
    pub search_query: String,
    pub veracity_filter: BTreeSet<Veracity>,
    pub indicator_filter: BTreeSet<Indicator>,
    /// Last user-facing error banner, if any.
    pub last_error: Option<String>,
}

/// Orchestrates analysis, enrichment, filtering, export/import and
/// persistence for one session.
pub struct SessionController<S: Storage> {
    pub state: SessionState,
    client: GeminiClient,
    storage: S,
}

impl<S: Storage> SessionController<S> {
    pub fn new(client: GeminiClient, storage: S) -> Self {
        Self {
            state: SessionState::default(),
            client,
            storage,
        }
    }

    /// Load a source document into the session. The hash is computed
    /// over `source_bytes`, which may be the original binary (e.g. a
    /// PDF) rather than the extracted text.
    pub fn load_document(
        &mut self,
        file_name: impl Into<String>,
        text: impl Into<String>,
        source_bytes: &[u8],
    ) {
        self.state.document_text = text.into();
        self.state.document_file_name = Some(file_name.into());
        self.state.source_file_hash = Some(sha256_hex(source_bytes));
        self.state.last_error = None;
    }

    /// Run the streaming analysis over the loaded document, replacing
    /// any previous tree. A mid-stream failure keeps the partial tree
    /// and records an error banner instead of failing the call.
    pub async fn analyze(&mut self) -> AppResult<()> {
        if self.state.document_text.is_empty() {
            return Err(AppError::Internal {
                message: "no document loaded".to_string(),
            });
        }

        let records = self
            .client
            .analyze_stream(&self.state.document_text)
            .await?;

        let mut assembler = StreamAssembler::new();
        if let Some(hash) = &self.state.source_file_hash {
            assembler = assembler.with_source_file_hash(hash.clone());
        }

        self.state.analysis = None;
        self.state.summary = None;
        self.state.selected_ids.clear();
        self.state.collapsed_ids.clear();
        self.state.active_node_id = None;
        self.state.last_error = None;

        let analysis_slot = &mut self.state.analysis;
        let outcome = assembler
            .assemble(records, |snapshot| {
                *analysis_slot = Some(snapshot.clone());
            })
            .await;

        info!(
            consumed = outcome.consumed,
            dropped = outcome.dropped,
            "Analysis complete"
        );

        match (outcome.tree, outcome.error) {
            (Some(root), error) => {
                if let Some(e) = error {
                    self.state.last_error = Some(format!("Failed to get analysis. {}", e));
                }
                self.state.summary = Some(summarize(&root));
                self.state.analysis = Some(root);
                Ok(())
            }
            (None, Some(e)) => Err(AppError::Provider(e)),
            (None, None) => Err(AppError::Internal {
                message: "analysis stream produced no nodes".to_string(),
            }),
        }
    }

    /// Fetch a counter-argument for one node. A second call on a node
    /// already being explored is a no-op; a provider failure is written
    /// into the node's `alternative` field, matching the way results
    /// are surfaced.
    pub async fn explore(&mut self, node_id: &str) -> AppResult<()> {
        let (title, content) = {
            let node = self.find_node(node_id)?;
            if node.is_exploring {
                return Ok(());
            }
            (node.title.clone(), node.content.clone())
        };

        self.update_node(node_id, |n| n.is_exploring = true);

        let result = self
            .client
            .explore(&title, &content, &self.state.document_text)
            .await;

        let alternative = match result {
            Ok(text) => text,
            Err(e) => {
                warn!(node_id, error = %e, "Explore failed");
                format!("Error fetching counter-argument: {}", e)
            }
        };

        self.update_node(node_id, |n| {
            n.alternative = Some(alternative);
            n.is_exploring = false;
        });
        Ok(())
    }

    /// Fact-check one node with search grounding. Mirrors `explore`:
    /// concurrent calls on the same node are dropped, and a failure
    /// lands in the node's grounding summary.
    pub async fn fact_check(&mut self, node_id: &str) -> AppResult<()> {
        let (title, content) = {
            let node = self.find_node(node_id)?;
            if node.is_fact_checking {
                return Ok(());
            }
            (node.title.clone(), node.content.clone())
        };

        self.update_node(node_id, |n| n.is_fact_checking = true);

        let grounding = match self.client.fact_check(&title, &content).await {
            Ok(data) => data,
            Err(e) => {
                warn!(node_id, error = %e, "Fact check failed");
                GroundingData {
                    summary: format!("Fact check failed: {}", e),
                    sources: Vec::new(),
                }
            }
        };

        self.update_node(node_id, |n| {
            n.grounding = Some(grounding);
            n.is_fact_checking = false;
        });
        Ok(())
    }

    /// Draft a motion document for the `index`-th suggested motion.
    /// Context from the justifying node (counter-argument, fact check)
    /// is folded into the prompt when available.
    pub async fn generate_motion(&mut self, index: usize) -> AppResult<String> {
        let motion = self
            .state
            .summary
            .as_ref()
            .and_then(|s| s.suggested_motions.get(index))
            .cloned()
            .ok_or_else(|| AppError::Internal {
                message: format!("no suggested motion at index {}", index),
            })?;

        let source_node = motion
            .source_node_id
            .as_deref()
            .zip(self.state.analysis.as_ref())
            .and_then(|(id, root)| tree::find(root, id));
        let counter = source_node.and_then(|n| n.alternative.clone());
        let fact_check = source_node.and_then(|n| n.grounding.as_ref().map(|g| g.summary.clone()));

        match self
            .client
            .generate_motion(
                &motion.motion_type,
                &motion.justification,
                counter.as_deref(),
                fact_check.as_deref(),
            )
            .await
        {
            Ok(document) => Ok(document),
            Err(e) => {
                self.state.last_error = Some(format!("Failed to generate motion: {}", e));
                Err(AppError::Provider(e))
            }
        }
    }

    /// Replace the note text on one node.
    pub fn update_note(&mut self, node_id: &str, notes: impl Into<String>) -> AppResult<()> {
        let notes = notes.into();
        if self.update_node(node_id, |n| n.notes = notes) {
            Ok(())
        } else {
            Err(self.unknown_node(node_id))
        }
    }

    /// Mark one node as selected or not. Selection lives in the id set;
    /// the node's own flag follows it so serialized trees agree.
    pub fn select(&mut self, node_id: &str, selected: bool) -> AppResult<()> {
        if !self.update_node(node_id, |n| n.is_selected = selected) {
            return Err(self.unknown_node(node_id));
        }
        if selected {
            self.state.selected_ids.insert(node_id.to_string());
        } else {
            self.state.selected_ids.remove(node_id);
        }
        Ok(())
    }

    /// Select every node in the tree.
    pub fn select_all(&mut self) {
        if let Some(root) = &mut self.state.analysis {
            tree::update_all(root, |n| n.is_selected = true);
            self.state.selected_ids = tree::collect_ids(root).into_iter().collect();
        }
    }

    /// Clear the selection entirely.
    pub fn select_none(&mut self) {
        if let Some(root) = &mut self.state.analysis {
            tree::update_all(root, |n| n.is_selected = false);
        }
        self.state.selected_ids.clear();
    }

    /// Collapse or expand one node in the mind-map view.
    pub fn toggle_collapse(&mut self, node_id: &str) {
        if !self.state.collapsed_ids.remove(node_id) {
            self.state.collapsed_ids.insert(node_id.to_string());
        }
    }

    /// Focus a node, or unfocus it when it is already active.
    pub fn set_active_node(&mut self, node_id: &str) {
        if self.state.active_node_id.as_deref() == Some(node_id) {
            self.state.active_node_id = None;
        } else {
            self.state.active_node_id = Some(node_id.to_string());
        }
    }

    pub fn set_active_view(&mut self, view: ActiveView) {
        self.state.active_view = view;
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.state.search_query = query.into();
    }

    pub fn toggle_veracity_filter(&mut self, veracity: Veracity) {
        if !self.state.veracity_filter.remove(&veracity) {
            self.state.veracity_filter.insert(veracity);
        }
    }

    pub fn toggle_indicator_filter(&mut self, indicator: Indicator) {
        if !self.state.indicator_filter.remove(&indicator) {
            self.state.indicator_filter.insert(indicator);
        }
    }

    pub fn clear_filters(&mut self) {
        self.state.search_query.clear();
        self.state.veracity_filter.clear();
        self.state.indicator_filter.clear();
    }

    /// The tree as filtered by the current query and facets. None when
    /// there is no tree or nothing matches.
    pub fn filtered_view(&self) -> Option<AnalysisNode> {
        let root = self.state.analysis.as_ref()?;
        let criteria = FilterCriteria::new()
            .with_query(self.state.search_query.clone())
            .with_veracities(self.state.veracity_filter.iter().copied())
            .with_indicators(self.state.indicator_filter.iter().copied());
        filter_tree(root, &criteria)
    }

    /// Export the selected subset as the content-addressed JSON
    /// document. None when nothing is selected.
    pub fn export_json(&self, exported_at: DateTime<Utc>) -> Option<String> {
        let pruned = self.pruned_selection()?;
        Some(export::export_json(
            &pruned,
            self.state.source_file_hash.as_deref(),
            exported_at,
        ))
    }

    /// Export the selected subset as the sealed HTML report. None when
    /// nothing is selected.
    pub fn export_html(&self) -> Option<String> {
        let pruned = self.pruned_selection()?;
        Some(export::export_html(
            &pruned,
            self.state.source_file_hash.as_deref(),
        ))
    }

    fn pruned_selection(&self) -> Option<AnalysisNode> {
        let root = self.state.analysis.as_ref()?;
        export::prune_to_selected(root, &self.state.selected_ids)
    }

    /// Import a previously exported document, replacing the session.
    /// On failure the current state is left untouched.
    pub fn import_json(&mut self, text: &str) -> AppResult<()> {
        let imported = import_analysis(text)?;

        self.state.summary = Some(summarize(&imported.tree));
        self.state.analysis = Some(imported.tree);
        self.state.source_file_hash = imported.source_file_hash;
        self.state.document_text = String::new();
        self.state.document_file_name = None;
        self.state.selected_ids.clear();
        self.state.collapsed_ids.clear();
        self.state.active_node_id = None;
        self.state.active_view = ActiveView::Dashboard;
        self.state.last_error = None;
        Ok(())
    }

    /// Discard the in-memory session and its persisted copy.
    pub async fn start_new_session(&mut self) -> AppResult<()> {
        self.state = SessionState::default();
        self.storage.clear().await?;
        Ok(())
    }

    /// Persist the durable slots. An empty session clears the store so
    /// a later restore starts fresh.
    pub async fn save(&self) -> AppResult<()> {
        let Some(analysis) = &self.state.analysis else {
            self.storage.clear().await?;
            return Ok(());
        };

        self.storage
            .set(
                keys::ANALYSIS,
                &serde_json::to_string(analysis).map_err(|e| AppError::Internal {
                    message: format!("failed to serialize analysis: {}", e),
                })?,
            )
            .await?;
        self.set_json_slot(keys::SELECTED_IDS, &self.state.selected_ids)
            .await?;
        self.set_json_slot(keys::COLLAPSED_IDS, &self.state.collapsed_ids)
            .await?;
        self.set_optional_slot(keys::SOURCE_FILE_HASH, self.state.source_file_hash.as_deref())
            .await?;
        self.storage
            .set(keys::DOCUMENT_TEXT, &self.state.document_text)
            .await?;
        self.set_optional_slot(
            keys::DOCUMENT_FILE_NAME,
            self.state.document_file_name.as_deref(),
        )
        .await?;
        self.set_optional_slot(keys::ACTIVE_NODE_ID, self.state.active_node_id.as_deref())
            .await?;
        self.storage
            .set(keys::ACTIVE_VIEW, &self.state.active_view.to_string())
            .await?;

        Ok(())
    }

    /// Restore a previously saved session. Best effort: a missing or
    /// malformed slot falls back to its default rather than failing the
    /// whole restore. The summary is recomputed, not read back.
    pub async fn restore(&mut self) -> AppResult<()> {
        let Some(analysis_json) = self.storage.get(keys::ANALYSIS).await? else {
            return Ok(());
        };

        let analysis: AnalysisNode = match serde_json::from_str(&analysis_json) {
            Ok(tree) => tree,
            Err(e) => {
                warn!(error = %e, "Ignoring malformed persisted analysis");
                return Ok(());
            }
        };

        self.state.summary = Some(summarize(&analysis));
        self.state.analysis = Some(analysis);
        self.state.selected_ids = self.get_json_slot(keys::SELECTED_IDS).await;
        self.state.collapsed_ids = self.get_json_slot(keys::COLLAPSED_IDS).await;
        self.state.source_file_hash = self.storage.get(keys::SOURCE_FILE_HASH).await?;
        self.state.document_text = self
            .storage
            .get(keys::DOCUMENT_TEXT)
            .await?
            .unwrap_or_default();
        self.state.document_file_name = self.storage.get(keys::DOCUMENT_FILE_NAME).await?;
        self.state.active_node_id = self.storage.get(keys::ACTIVE_NODE_ID).await?;
        self.state.active_view = self
            .storage
            .get(keys::ACTIVE_VIEW)
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        // Selection flags on the tree follow the restored id set.
        let selected = self.state.selected_ids.clone();
        if let Some(root) = &mut self.state.analysis {
            tree::update_all(root, |n| n.is_selected = selected.contains(&n.id));
        }

        Ok(())
    }

    async fn set_json_slot<T: serde::Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        let json = serde_json::to_string(value).map_err(|e| AppError::Internal {
            message: format!("failed to serialize {}: {}", key, e),
        })?;
        self.storage.set(key, &json).await?;
        Ok(())
    }

    async fn set_optional_slot(&self, key: &str, value: Option<&str>) -> AppResult<()> {
        match value {
            Some(v) => self.storage.set(key, v).await?,
            None => self.storage.delete(key).await?,
        }
        Ok(())
    }

    async fn get_json_slot<T: serde::de::DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.storage.get(key).await {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!(key, error = %e, "Ignoring malformed persisted slot");
                T::default()
            }),
            Ok(None) => T::default(),
            Err(e) => {
                warn!(key, error = %e, "Failed to read persisted slot");
                T::default()
            }
        }
    }

    fn find_node(&self, node_id: &str) -> AppResult<&AnalysisNode> {
        self.state
            .analysis
            .as_ref()
            .and_then(|root| tree::find(root, node_id))
            .ok_or_else(|| self.unknown_node(node_id))
    }

    fn update_node<F: FnOnce(&mut AnalysisNode)>(&mut self, node_id: &str, mutate: F) -> bool {
        self.state
            .analysis
            .as_mut()
            .map(|root| tree::update(root, node_id, mutate))
            .unwrap_or(false)
    }

    fn unknown_node(&self, node_id: &str) -> AppError {
        AppError::Internal {
            message: format!("node {} not found", node_id),
        }
    }
}
