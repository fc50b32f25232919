//! Request handlers, one module per resource

pub mod agents;
pub mod care;
pub mod conversations;
pub mod family;
pub mod frames;
pub mod health;
pub mod reminders;
pub mod sleep;
pub mod users;
