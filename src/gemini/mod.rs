//! Gemini API integration
//!
//! Wraps the generateContent endpoints: a streaming call that yields
//! flat analysis nodes as NDJSON, and unary calls for counter-arguments,
//! search-grounded fact checks, and motion drafting.

mod client;
mod types;

pub use client::GeminiClient;
pub use types::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    GroundingChunk, GroundingMetadata, Part, Tool, WebSource,
};
