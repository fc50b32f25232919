//! Kincare companion agents
//!
//! Two personas share one household:
//!
//! - **Grace** talks with the elderly user: warm, slow, patient
//! - **Alex** works with caregivers: organized, proactive
//!
//! Replies come from a [`ResponseGenerator`]. [`LlmGenerator`] asks a model
//! through `kincare-llm`; [`KeywordGenerator`] works offline from keyword
//! rules. [`AgentService`] stores every exchange and decides when one persona
//! hands a conversation off to the other.

pub mod context;
pub mod error;
pub mod generator;
pub mod insights;
pub mod keyword;
pub mod llm;
pub mod personality;
pub mod service;

pub use context::{ConversationContext, FamilyMember, HistoryItem, MemorySummary};
pub use error::{AgentError, AgentResult};
pub use generator::{GeneratedReply, Handoff, HandoffContext, MemoryQuiz, ResponseGenerator};
pub use insights::{ContactSuggestion, FamilyInsights};
pub use keyword::KeywordGenerator;
pub use llm::LlmGenerator;
pub use personality::{Persona, VoiceSettings, ALEX, GRACE};
pub use service::{should_hand_off, AgentService, CareEvent, CareReminder};
