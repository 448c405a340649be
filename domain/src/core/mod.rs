//! Core domain concepts shared across all subdomains.
//!
//! - [`ids`] - registry identifiers (tool, supervisor, chain, run, ...)
//! - [`error::DomainError`] - domain-level errors

pub mod error;
pub mod ids;
