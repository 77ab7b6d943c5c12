use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::order::{
    Ingredient, IngredientId, Order, OrderId, OrderState, Pancake, PancakeId, StateChange,
};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub building: i64,
    pub room: i64,
}

#[derive(Debug, Deserialize)]
pub struct AddIngredientRequest {
    pub name: String,
}

/// `?state=` filter for the order listing, matched case-insensitively
#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub state: Option<String>,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: OrderId,
    pub building: u32,
    pub room: u32,
    pub state: OrderState,
    pub created_at: DateTime<Utc>,
    pub pancakes: Vec<PancakeResponse>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id(),
            building: order.building(),
            room: order.room(),
            state: order.state(),
            created_at: order.created_at(),
            pancakes: order
                .pancakes()
                .iter()
                .map(|pancake| PancakeResponse::from(pancake.as_ref()))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PancakeResponse {
    pub id: PancakeId,
    pub description: String,
    pub ingredients: Vec<IngredientResponse>,
}

impl From<&Pancake> for PancakeResponse {
    fn from(pancake: &Pancake) -> Self {
        Self {
            id: pancake.id(),
            description: pancake.description(),
            ingredients: pancake
                .ingredients()
                .iter()
                .map(IngredientResponse::from)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IngredientResponse {
    pub id: IngredientId,
    pub name: String,
}

impl From<&Ingredient> for IngredientResponse {
    fn from(ingredient: &Ingredient) -> Self {
        Self {
            id: ingredient.id(),
            name: ingredient.name().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PancakeCreatedResponse {
    pub id: PancakeId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResponse {
    pub order_id: OrderId,
    pub previous_state: OrderState,
    pub state: OrderState,
}

impl TransitionResponse {
    pub fn new(order_id: OrderId, change: StateChange) -> Self {
        Self {
            order_id,
            previous_state: change.from,
            state: change.to,
        }
    }
}
