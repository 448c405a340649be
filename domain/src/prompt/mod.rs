//! Prompt domain
//!
//! Supervisor-authored texts the engine writes into the conversation.

pub mod feedback;

pub use feedback::{FeedbackTemplate, RETRY_NUDGE};
