//! Storage layer for session persistence.
//!
//! Session state is persisted as a small set of JSON-encoded values in
//! a key-value table, one key per state slot, so a partial save never
//! corrupts unrelated slots.

mod sqlite;

pub use sqlite::SqliteStorage;

use async_trait::async_trait;

use crate::error::StorageResult;

/// Well-known keys for the session store slots.
pub mod keys {
    /// The full analysis tree.
    pub const ANALYSIS: &str = "analysis";
    /// Selected node ids.
    pub const SELECTED_IDS: &str = "selectedIds";
    /// Collapsed node ids.
    pub const COLLAPSED_IDS: &str = "collapsedIds";
    /// SHA-256 of the source document.
    pub const SOURCE_FILE_HASH: &str = "sourceFileHash";
    /// Raw testimony text.
    pub const DOCUMENT_TEXT: &str = "documentText";
    /// Original filename of the source document.
    pub const DOCUMENT_FILE_NAME: &str = "documentFileName";
    /// Currently focused node id.
    pub const ACTIVE_NODE_ID: &str = "activeNodeId";
    /// Active view name.
    pub const ACTIVE_VIEW: &str = "activeView";
}

/// Storage trait for the session store.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Get the value stored under `key`, if any.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;
    /// Set (or replace) the value under `key`.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    /// Remove the value under `key`. Removing an absent key is not an
    /// error.
    async fn delete(&self, key: &str) -> StorageResult<()>;
    /// Remove every stored value.
    async fn clear(&self) -> StorageResult<()>;
}
