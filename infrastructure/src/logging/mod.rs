//! Audit logging: one JSON object per supervision event.
//!
//! Provides [`JsonlAuditLogger`], which implements the
//! [`AuditLogger`](toolwarden_application::AuditLogger) port.

mod jsonl_audit_logger;

pub use jsonl_audit_logger::JsonlAuditLogger;
