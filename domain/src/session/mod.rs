//! Conversation domain.
//!
//! - [`entities::Message`] - one turn of the supervised conversation
//! - [`entities::Role`] - who authored the turn

pub mod entities;

pub use entities::{Message, Role};
