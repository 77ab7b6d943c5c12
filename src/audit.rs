use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::order::{Order, OrderEvent, OrderId};

// ============================================================================
// Audit Log
// ============================================================================
//
// Fire-and-forget record of what happened to each order. Sinks must never
// fail or block the caller; the order services behave identically with or
// without a working audit log.
//
// ============================================================================

/// An order event together with the order it happened to
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub event_id: Uuid,
    pub order_id: OrderId,
    pub building: u32,
    pub room: u32,
    pub recorded_at: DateTime<Utc>,
    pub event: OrderEvent,
}

impl AuditEntry {
    pub fn new(order: &Order, event: OrderEvent) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            order_id: order.id(),
            building: order.building(),
            room: order.room(),
            recorded_at: Utc::now(),
            event,
        }
    }

    /// One human readable log line
    pub fn render(&self) -> String {
        let timestamp = self.recorded_at.format("%Y-%m-%dT%H:%M:%S%.3f");
        let body = match &self.event {
            OrderEvent::Created => format!(
                "Created order {} (Building {}, Room {})",
                self.order_id, self.building, self.room
            ),
            OrderEvent::PancakeAdded {
                pancake_id,
                pancake_count,
            } => format!(
                "Added pancake {} to order {} (Building {}, Room {}). Current pancakes count: {}",
                pancake_id, self.order_id, self.building, self.room, pancake_count
            ),
            OrderEvent::PancakeRemoved {
                pancake_id,
                pancake_count,
            } => format!(
                "Removed pancake {} from order {}. Current pancakes count: {}",
                pancake_id, self.order_id, pancake_count
            ),
            OrderEvent::IngredientAdded {
                pancake_id, name, ..
            } => format!(
                "Added ingredient '{}' to pancake {} in order {}",
                name, pancake_id, self.order_id
            ),
            OrderEvent::IngredientRemoved {
                pancake_id,
                ingredient_id,
            } => format!(
                "Removed ingredient {} from pancake {} in order {}",
                ingredient_id, pancake_id, self.order_id
            ),
            OrderEvent::StateChanged { from, to } => format!(
                "Order {} state changed from {} to {} (Building {}, Room {})",
                self.order_id, from, to, self.building, self.room
            ),
        };
        format!("[{}] {}", timestamp, body)
    }
}

pub trait AuditLog: Send + Sync {
    fn record(&self, entry: AuditEntry);
}

/// Writes every entry to the `audit` tracing target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditLog;

impl AuditLog for TracingAuditLog {
    fn record(&self, entry: AuditEntry) {
        tracing::info!(
            target: "audit",
            event_id = %entry.event_id,
            order_id = %entry.order_id,
            event_type = entry.event.event_type(),
            "{}",
            entry.render()
        );
    }
}

/// Keeps entries in memory, in the order they were recorded
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn events_for(&self, order_id: OrderId) -> Vec<OrderEvent> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|entry| entry.order_id == order_id)
            .map(|entry| entry.event.clone())
            .collect()
    }

    /// Full log, one line per entry
    pub fn render(&self) -> String {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|entry| entry.render() + "\n")
            .collect()
    }
}

impl AuditLog for InMemoryAuditLog {
    fn record(&self, entry: AuditEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}
