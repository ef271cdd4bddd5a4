//! Port for structured audit logging.
//!
//! Defines the [`AuditLogger`] trait for recording every successful
//! mutation (workspace created, vote cast, revision applied, ...) to a
//! structured log.
//!
//! This is separate from `tracing`-based diagnostic logs: tracing handles
//! human-readable messages, while this port captures a machine-readable
//! trail of who changed what.

use serde_json::Value;

/// A structured audit event.
pub struct AuditEvent {
    /// Event type identifier (e.g., "workspace_created", "revision_applied").
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
/// The `log` method is synchronous and non-fallible: a failing audit sink
/// must not fail the operation that produced the event.
pub trait AuditLogger: Send + Sync {
    fn log(&self, event: AuditEvent);
}

/// No-op implementation for tests and when auditing is disabled.
pub struct NoAuditLogger;

impl AuditLogger for NoAuditLogger {
    fn log(&self, _event: AuditEvent) {}
}
