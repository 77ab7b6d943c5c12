use serde::{Deserialize, Serialize};

use super::value_objects::{IngredientId, OrderState, PancakeId};

// ============================================================================
// Order Events - facts reported to the audit log
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Created,
    PancakeAdded {
        pancake_id: PancakeId,
        pancake_count: usize,
    },
    PancakeRemoved {
        pancake_id: PancakeId,
        pancake_count: usize,
    },
    IngredientAdded {
        pancake_id: PancakeId,
        ingredient_id: IngredientId,
        name: String,
    },
    IngredientRemoved {
        pancake_id: PancakeId,
        ingredient_id: IngredientId,
    },
    StateChanged {
        from: OrderState,
        to: OrderState,
    },
}

impl OrderEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Created => "OrderCreated",
            OrderEvent::PancakeAdded { .. } => "PancakeAdded",
            OrderEvent::PancakeRemoved { .. } => "PancakeRemoved",
            OrderEvent::IngredientAdded { .. } => "IngredientAdded",
            OrderEvent::IngredientRemoved { .. } => "IngredientRemoved",
            OrderEvent::StateChanged { .. } => "OrderStateChanged",
        }
    }
}
