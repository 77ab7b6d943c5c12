use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::OrderError;

// ============================================================================
// Order Value Objects
// ============================================================================

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Fresh random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

entity_id!(
    /// Identity of an order, assigned once by the registry
    OrderId
);
entity_id!(
    /// Identity of a pancake within its order
    PancakeId
);
entity_id!(
    /// Identity of an ingredient within its pancake
    IngredientId
);

/// Lifecycle state of an order.
///
/// `Open → Completed → Prepared → OutForDelivery`, with `Cancelled` reachable
/// from every non-terminal state. Re-requesting the current state is accepted
/// as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum OrderState {
    Open = 0,
    Completed = 1,
    Prepared = 2,
    OutForDelivery = 3,
    Cancelled = 4,
}

impl OrderState {
    pub const ALL: [OrderState; 5] = [
        OrderState::Open,
        OrderState::Completed,
        OrderState::Prepared,
        OrderState::OutForDelivery,
        OrderState::Cancelled,
    ];

    /// States reachable in one step
    pub fn allowed_next(self) -> &'static [OrderState] {
        match self {
            OrderState::Open => &[OrderState::Completed, OrderState::Cancelled],
            OrderState::Completed => &[OrderState::Prepared, OrderState::Cancelled],
            OrderState::Prepared => &[OrderState::OutForDelivery, OrderState::Cancelled],
            OrderState::OutForDelivery | OrderState::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, requested: OrderState) -> bool {
        self == requested || self.allowed_next().contains(&requested)
    }

    pub fn ensure_transition(self, requested: OrderState) -> Result<(), OrderError> {
        if self.can_transition_to(requested) {
            Ok(())
        } else {
            Err(OrderError::InvalidTransition {
                current: self,
                requested,
            })
        }
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_next().is_empty()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderState::Open => "OPEN",
            OrderState::Completed => "COMPLETED",
            OrderState::Prepared => "PREPARED",
            OrderState::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderState::Cancelled => "CANCELLED",
        }
    }

    pub(crate) fn as_repr(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_repr(value: u8) -> Self {
        match value {
            0 => OrderState::Open,
            1 => OrderState::Completed,
            2 => OrderState::Prepared,
            3 => OrderState::OutForDelivery,
            4 => OrderState::Cancelled,
            _ => unreachable!("invalid order state repr {value}"),
        }
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unknown order state: {0}")]
pub struct UnknownOrderState(pub String);

impl FromStr for OrderState {
    type Err = UnknownOrderState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownOrderState(s.to_string()))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
