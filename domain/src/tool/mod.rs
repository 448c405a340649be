//! Tool domain module
//!
//! A supervised tool is registered once per run ([`ToolSpecification`] →
//! [`Tool`]) and every invocation the model requests is normalized into a
//! provider-agnostic [`ToolCall`] before any supervisor sees it.
//!
//! ```text
//! ┌───────────────────┐    ┌──────────────┐    ┌─────────────────────┐
//! │ ToolSpecification │───▶│ Tool         │    │ ToolCall            │
//! │ (bootstrap)       │    │ (registered) │    │ (per model response)│
//! └───────────────────┘    └──────────────┘    └─────────────────────┘
//! ```
//!
//! Plain chat replies are supervised through the pseudo tool named
//! [`CHAT_TOOL_NAME`].

pub mod entities;

pub use entities::{CHAT_TOOL_NAME, Tool, ToolCall, ToolSpecification};
