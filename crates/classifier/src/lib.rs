//! LLM-backed routing classifier for Switchboard.
//!
//! Maps a free-text query to a [`switchboard_common::RoutingDecision`]
//! by asking an OpenAI-compatible chat model for a structured JSON
//! verdict and validating it before it reaches the orchestrator.

pub mod chat;
pub mod openai;
pub mod router;

pub use chat::ChatModel;
pub use openai::OpenAiChat;
pub use router::LlmClassifier;
