use super::value_objects::{OrderId, OrderState, PancakeId};
use crate::utils::RetriesExhausted;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("Validation failed for field '{field}': {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("Pancake not found: {0}")]
    PancakeNotFound(PancakeId),

    #[error("Invalid state transition from {current} to {requested}")]
    InvalidTransition {
        current: OrderState,
        requested: OrderState,
    },

    #[error("Order {order_id} is {state}; pancakes can only be changed while the order is OPEN")]
    InvalidState { order_id: OrderId, state: OrderState },

    #[error("{operation} gave up after {attempts} attempts under contention")]
    ConcurrencyExhausted {
        operation: &'static str,
        attempts: u32,
    },
}

impl OrderError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        OrderError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            OrderError::Validation { .. } => "validation",
            OrderError::OrderNotFound(_) => "order_not_found",
            OrderError::PancakeNotFound(_) => "pancake_not_found",
            OrderError::InvalidTransition { .. } => "invalid_transition",
            OrderError::InvalidState { .. } => "invalid_state",
            OrderError::ConcurrencyExhausted { .. } => "concurrency_exhausted",
        }
    }
}

impl From<RetriesExhausted> for OrderError {
    fn from(e: RetriesExhausted) -> Self {
        OrderError::ConcurrencyExhausted {
            operation: e.operation,
            attempts: e.attempts,
        }
    }
}
