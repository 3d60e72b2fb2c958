//! Agent runtime for WhisperCart.
//!
//! Turns shopper utterances into structured intent and drives price
//! negotiation on top of the deterministic core:
//! - `conversation` - local rule-based intent extraction and remote output parsing
//! - `negotiator` - chat-style negotiation replies
//! - `polish` - optional rewording of heuristic offers
//! - `llm` - remote model clients (Hugging Face, Ollama, OpenAI-compatible)
//! - `runtime` - `AgentRuntime`, the two-stage remote then local orchestrator
//!
//! # Safety Principle
//!
//! Remote models only ever reword or reinterpret. Prices, discounts and
//! tracking are decided by the core, and every remote failure degrades to
//! the local path.

pub mod conversation;
pub mod llm;
pub mod negotiator;
pub mod patterns;
pub mod polish;
pub mod runtime;

pub use conversation::IntentExtractor;
pub use llm::{GenerationParams, LlmClient, RemoteModelError};
pub use negotiator::{ChatMessage, NegotiationReply};
pub use runtime::AgentRuntime;
