//! Audit trail for configuration changes.
//!
//! Every mutating admin operation records one [`AuditEvent`] through an
//! [`AuditSink`]. The default sink emits events on the `audit` tracing
//! target so they can be routed separately from operational logs.

use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Rollback,
    Reload,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Rollback => "rollback",
            AuditAction::Reload => "reload",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub operator: String,
    pub action: AuditAction,
    /// `server`, `vhost`, `snapshot`, `console`.
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub description: Option<String>,
    pub outcome: AuditOutcome,
}

impl AuditEvent {
    pub fn new(operator: impl Into<String>, action: AuditAction, resource_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            operator: operator.into(),
            action,
            resource_type: resource_type.into(),
            resource_id: None,
            description: None,
            outcome: AuditOutcome::Success,
        }
    }

    pub fn resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the event failed when `result` is an error.
    pub fn outcome_of<T, E: fmt::Display>(mut self, result: &Result<T, E>) -> Self {
        self.outcome = match result {
            Ok(_) => AuditOutcome::Success,
            Err(e) => AuditOutcome::Failure {
                error: e.to_string(),
            },
        };
        self
    }
}

/// Destination for audit events. Recording never fails the operation.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Emits audit events as structured logs on the `audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        match &event.outcome {
            AuditOutcome::Success => tracing::info!(
                target: "audit",
                id = %event.id,
                operator = %event.operator,
                action = %event.action,
                resource_type = %event.resource_type,
                resource_id = event.resource_id.as_deref(),
                description = event.description.as_deref(),
                "success"
            ),
            AuditOutcome::Failure { error } => tracing::warn!(
                target: "audit",
                id = %event.id,
                operator = %event.operator,
                action = %event.action,
                resource_type = %event.resource_type,
                resource_id = event.resource_id.as_deref(),
                description = event.description.as_deref(),
                error = %error,
                "failure"
            ),
        }
    }
}

/// Keeps events in memory for inspection.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_of() {
        let ok: Result<(), String> = Ok(());
        let err: Result<(), String> = Err("disk full".to_string());

        let event = AuditEvent::new("admin", AuditAction::Update, "server").outcome_of(&ok);
        assert_eq!(event.outcome, AuditOutcome::Success);

        let event = AuditEvent::new("admin", AuditAction::Update, "server").outcome_of(&err);
        assert_eq!(
            event.outcome,
            AuditOutcome::Failure {
                error: "disk full".to_string()
            }
        );
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemoryAuditSink::new();
        sink.record(AuditEvent::new("alice", AuditAction::Update, "server"));
        sink.record(
            AuditEvent::new("bob", AuditAction::Rollback, "snapshot").resource_id("3"),
        );

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].operator, "alice");
        assert_eq!(events[1].action, AuditAction::Rollback);
        assert_eq!(events[1].resource_id.as_deref(), Some("3"));
        assert_ne!(events[0].id, events[1].id);
    }

    #[test]
    fn test_event_serializes_outcome_inline() {
        let event = AuditEvent::new("admin", AuditAction::Reload, "console");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["action"], "reload");
        assert_eq!(json["outcome"]["status"], "success");
    }
}
