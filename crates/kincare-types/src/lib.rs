//! Kincare Types - Canonical domain types for the family-care companion
//!
//! This crate contains the foundational types shared by every kincare crate:
//!
//! - Agent vocabulary (`AgentId`, `Priority`, `AgentResponse`)
//! - Stored records (users, conversations, family connections, reminders, ...)
//! - Insert payloads and partial updates, validated before they reach storage
//!
//! All records serialize with camelCase field names, which is the shape the
//! web and picture-frame clients speak.

pub mod agent;
pub mod inputs;
pub mod models;

pub use agent::*;
pub use inputs::*;
pub use models::*;
