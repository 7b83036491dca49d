//! Audit trail for ledger mutations
//!
//! Every state change in the vault, registry and rebalancing engine emits an
//! [`AuditEvent`] carrying before/after values. The ledger never reads its
//! own audit records; they are handed to an [`AuditSink`] supplied by the
//! embedding service.
//!
//! # Sinks
//! - [`TracingAuditSink`]: forwards events to `tracing`
//! - [`AuditLog`]: in-memory, hash-chained, bounded append-only log

pub mod event;
pub mod log;

pub use event::{AuditEvent, AuditKind, CapitalMove};
pub use log::{AuditConfig, AuditEntry, AuditLog, AuditStats, ChainVerifyError};

use std::sync::Arc;

/// Receiver of audit events
pub trait AuditSink: Send + Sync {
    /// Record one event. Must not fail back into the ledger.
    fn record(&self, event: AuditEvent);
}

/// Sink that emits each event as a structured `tracing` record
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        let kind = event.kind();
        match serde_json::to_string(&event) {
            Ok(payload) => tracing::info!(target: "audit", %kind, %payload),
            Err(e) => tracing::warn!(target: "audit", %kind, "unserializable audit event: {}", e),
        }
    }
}

/// Default sink for components built without an explicit one
pub fn default_sink() -> Arc<dyn AuditSink> {
    Arc::new(TracingAuditSink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Address;

    #[test]
    fn test_tracing_sink_accepts_events() {
        let sink = default_sink();
        sink.record(AuditEvent::PauseChanged {
            before: false,
            after: true,
        });
        sink.record(AuditEvent::WorkerRemoved {
            worker: Address::from_seed(b"gone"),
            reason: "retired".into(),
            stake_at_removal: 0,
        });
    }
}
