//! # Depo Analyst
//!
//! A deposition-analysis engine: streams an LLM analysis of testimony
//! into a mind-map tree, derives summary dashboards, filters and
//! enriches individual nodes, and exports selected findings as
//! content-addressed, verifiable documents.
//!
//! ## Features
//!
//! - **Streaming Analysis**: NDJSON node stream assembled into a tree
//!   incrementally, with partial results surviving mid-stream failures
//! - **Summary Projection**: category counts, veracity/tone/indicator
//!   statistics, profiles, key individuals and suggested motions
//! - **Filter & Search**: free-text query plus veracity/indicator facets
//!   over the tree, preserving ancestor context
//! - **Node Enrichment**: counter-arguments, search-grounded fact checks
//!   and drafted motion documents per node
//! - **Verifiable Export**: JSON and HTML exports sealed with a
//!   self-referential SHA-256 report hash
//! - **Session Persistence**: SQLite-backed save/restore of the full
//!   working session
//!
//! ## Architecture
//!
//! ```text
//! CLI → SessionController → Gemini API (HTTP)
//!              ↓
//!        SQLite (session)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use depo_analyst::{Config, SessionController};
//! use depo_analyst::gemini::GeminiClient;
//! use depo_analyst::storage::SqliteStorage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let storage = SqliteStorage::new(&config.database).await?;
//!     let client = GeminiClient::new(&config.gemini, config.request.clone())?;
//!     let mut session = SessionController::new(client, storage);
//!     session.restore().await?;
//!     Ok(())
//! }
//! ```

/// Incremental tree assembly from the streamed flat records.
pub mod assembler;
/// Configuration management.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Selection pruning and content-addressed JSON/HTML export.
pub mod export;
/// Search and facet filtering over the tree.
pub mod filter;
/// Gemini API client and wire types.
pub mod gemini;
/// Import of previously exported analyses.
pub mod import;
/// Core data model: analysis nodes, flat records, summary read model.
pub mod model;
/// Prompt definitions for the analysis pipeline.
pub mod prompts;
/// Session state, orchestration and persistence.
pub mod session;
/// SQLite storage layer for session persistence.
pub mod storage;
/// Summary projection from the tree.
pub mod summary;
/// Tree store operations.
pub mod tree;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use session::{ActiveView, SessionController, SessionState};
