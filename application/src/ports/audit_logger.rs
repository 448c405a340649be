//! Port for structured audit logging.
//!
//! Defines the [`AuditLogger`] trait for recording what the engine decided
//! (resolved calls, resample attempts, exhausted retries) to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures a
//! machine-readable trail of supervision outcomes (JSONL).

use serde_json::Value;

/// Event types emitted by the engine.
pub mod event {
    pub const TOOL_CALL_RESOLVED: &str = "tool_call_resolved";
    pub const RESAMPLE_ATTEMPT: &str = "resample_attempt";
    pub const RESAMPLE_EXHAUSTED: &str = "resample_exhausted";
    pub const MONITORING_PASS_FAILED: &str = "monitoring_pass_failed";
}

/// A structured audit event.
pub struct AuditEvent {
    /// Event type identifier (see [`event`]).
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl AuditEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging audit events.
///
/// The `log` method is synchronous and non-fallible; a failing audit sink
/// must never change a supervision outcome.
pub trait AuditLogger: Send + Sync {
    fn log(&self, event: AuditEvent);
}

/// No-op implementation for tests and when audit logging is disabled.
pub struct NoAuditLogger;

impl AuditLogger for NoAuditLogger {
    fn log(&self, _event: AuditEvent) {}
}
