//! Use cases
//!
//! The supervision engine, leaf to root: chain runner, multi-chain
//! resolver, resample engine, façade, session bootstrap.

pub mod bootstrap;
pub mod error;
pub mod resample;
pub mod resolve_chains;
pub mod run_chain;
pub mod supervise_response;
#[cfg(test)]
pub(crate) mod testing;
