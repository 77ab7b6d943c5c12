use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::errors::OrderError;
use super::pancake::Pancake;
use super::value_objects::{OrderId, OrderState, PancakeId};
use crate::utils::{retry_cas, CasError, RetryConfig, SnapshotList};

// ============================================================================
// Order Aggregate
// ============================================================================
//
// Identity and delivery address are fixed at construction. `state` and
// `pancakes` are independent atomic fields: each one is linearizable on its
// own, but nothing orders a state change against a pancake write that races
// with it. Pancakes may only be added or removed while the order is OPEN.
//
// ============================================================================

#[derive(Debug)]
pub struct Order {
    id: OrderId,
    building: u32,
    room: u32,
    created_at: DateTime<Utc>,
    state: AtomicU8,
    pancakes: SnapshotList<Arc<Pancake>>,
}

/// Outcome of an accepted transition request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub from: OrderState,
    pub to: OrderState,
}

impl StateChange {
    /// The order was already in the requested state
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

impl Order {
    /// Create an OPEN order with no pancakes
    pub fn new(building: i64, room: i64) -> Result<Self, OrderError> {
        Ok(Self {
            id: OrderId::new(),
            building: positive("building", building)?,
            room: positive("room", room)?,
            created_at: Utc::now(),
            state: AtomicU8::new(OrderState::Open.as_repr()),
            pancakes: SnapshotList::new(),
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn building(&self) -> u32 {
        self.building
    }

    pub fn room(&self) -> u32 {
        self.room
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> OrderState {
        OrderState::from_repr(self.state.load(Ordering::Acquire))
    }

    pub fn ensure_open(&self) -> Result<(), OrderError> {
        match self.state() {
            OrderState::Open => Ok(()),
            state => Err(OrderError::InvalidState {
                order_id: self.id,
                state,
            }),
        }
    }

    /// Move to `requested`, validating against the state observed on each attempt.
    ///
    /// A lost race re-reads the state and validates again, so a concurrent
    /// cancel turns a pending `Completed` request into `InvalidTransition`.
    pub async fn transition(
        &self,
        requested: OrderState,
        retry: &RetryConfig,
    ) -> Result<StateChange, OrderError> {
        retry_cas(retry, "order_transition", |_attempt| {
            let current = self.state();
            current
                .ensure_transition(requested)
                .map_err(CasError::Rejected)?;

            let change = StateChange {
                from: current,
                to: requested,
            };
            if change.is_noop() {
                return Ok(change);
            }

            self.state
                .compare_exchange(
                    current.as_repr(),
                    requested.as_repr(),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .map(|_| change)
                .map_err(|_| CasError::LostRace)
        })
        .await
    }

    /// Snapshot of the pancakes in insertion order
    pub fn pancakes(&self) -> Arc<Vec<Arc<Pancake>>> {
        self.pancakes.load()
    }

    pub fn pancake(&self, pancake_id: PancakeId) -> Option<Arc<Pancake>> {
        self.pancakes.find(|p| p.id() == pancake_id)
    }

    pub fn pancake_count(&self) -> usize {
        self.pancakes.len()
    }

    /// Append a pancake, returning the new pancake count
    pub async fn add_pancake(
        &self,
        pancake: Arc<Pancake>,
        retry: &RetryConfig,
    ) -> Result<usize, OrderError> {
        self.ensure_open()?;
        Ok(self.pancakes.push(pancake, retry, "add_pancake").await?)
    }

    /// Remove a pancake; `Ok(false)` if the order does not hold it
    pub async fn remove_pancake(
        &self,
        pancake_id: PancakeId,
        retry: &RetryConfig,
    ) -> Result<bool, OrderError> {
        self.ensure_open()?;
        Ok(self
            .pancakes
            .remove_where(|p| p.id() == pancake_id, retry, "remove_pancake")
            .await?)
    }
}

fn positive(field: &'static str, value: i64) -> Result<u32, OrderError> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| OrderError::validation(field, format!("must be a positive integer, got {}", value)))
}

// ============================================================================
// Unit Tests
// ============================================================================
