//! Kincare LLM - Provider abstraction for persona replies
//!
//! The companion personas talk to an LLM through a single request/response
//! contract:
//!
//! - OpenAI (`OPENAI_API_KEY`)
//! - Any OpenAI-compatible `/chat/completions` server (vLLM, llama.cpp, ...)
//! - Deterministic offline provider when nothing else is configured
//!
//! Persona code always asks for JSON output and treats every field as
//! optional, so a provider that answers badly degrades to fallback text
//! instead of failing the conversation.

pub mod providers;
pub mod router;
pub mod types;

pub use providers::*;
pub use router::*;
pub use types::*;
