use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::audit::{AuditEntry, AuditLog};
use crate::domain::order::{Order, OrderError, OrderEvent, OrderId, OrderState, StateChange};
use crate::metrics::Metrics;
use crate::utils::RetryConfig;

// ============================================================================
// Order Registry
// ============================================================================
//
// Owns the index of active orders and drives their lifecycle. Lookups and
// non-terminal transitions are lock-free. Terminal transitions
// (OUT_FOR_DELIVERY, CANCELLED) run together with their deregistration under
// one registry-wide guard, and lookups never hand out an order whose state
// is already terminal, so no reader sees a delivered or cancelled order
// through the registry.
//
// ============================================================================

pub struct OrderService {
    orders: DashMap<OrderId, Arc<Order>>,
    terminal_transitions: Mutex<()>,
    retry: RetryConfig,
    audit: Arc<dyn AuditLog>,
    metrics: Arc<Metrics>,
}

impl OrderService {
    pub fn new(retry: RetryConfig, audit: Arc<dyn AuditLog>, metrics: Arc<Metrics>) -> Self {
        Self {
            orders: DashMap::new(),
            terminal_transitions: Mutex::new(()),
            retry,
            audit,
            metrics,
        }
    }

    pub fn create_order(&self, building: i64, room: i64) -> Result<Arc<Order>, OrderError> {
        let order = Order::new(building, room)
            .inspect_err(|e| self.reject("create_order", None, e))?;
        let order = Arc::new(order);

        self.orders.insert(order.id(), Arc::clone(&order));
        self.metrics.record_order_created();
        self.record(&order, OrderEvent::Created);

        tracing::info!(
            order_id = %order.id(),
            building = order.building(),
            room = order.room(),
            "Order created"
        );

        Ok(order)
    }

    /// Active order by id; `None` once it was delivered, cancelled or deleted
    pub fn get_order(&self, order_id: OrderId) -> Option<Arc<Order>> {
        self.orders
            .get(&order_id)
            .map(|entry| Arc::clone(entry.value()))
            .filter(|order| !order.state().is_terminal())
    }

    /// Point-in-time snapshot of every active order, oldest first
    pub fn get_all_orders(&self) -> Vec<Arc<Order>> {
        self.collect_orders(|_| true)
    }

    pub fn get_orders_by_state(&self, state: OrderState) -> Vec<Arc<Order>> {
        self.collect_orders(|order| order.state() == state)
    }

    pub async fn complete_order(&self, order_id: OrderId) -> Result<StateChange, OrderError> {
        self.transition(order_id, OrderState::Completed, "complete_order")
            .await
    }

    pub async fn prepare_order(&self, order_id: OrderId) -> Result<StateChange, OrderError> {
        self.transition(order_id, OrderState::Prepared, "prepare_order")
            .await
    }

    pub async fn start_delivery(&self, order_id: OrderId) -> Result<StateChange, OrderError> {
        self.transition_and_deregister(order_id, OrderState::OutForDelivery, "start_delivery")
            .await
    }

    pub async fn cancel_order(&self, order_id: OrderId) -> Result<StateChange, OrderError> {
        self.transition_and_deregister(order_id, OrderState::Cancelled, "cancel_order")
            .await
    }

    /// Drop an order from the registry regardless of its state
    pub fn delete_order(&self, order_id: OrderId) -> Result<(), OrderError> {
        match self.orders.remove(&order_id) {
            Some(_) => {
                self.metrics.record_order_deregistered();
                tracing::info!(order_id = %order_id, "Order deleted");
                Ok(())
            }
            None => {
                let error = OrderError::OrderNotFound(order_id);
                self.reject("delete_order", Some(order_id), &error);
                Err(error)
            }
        }
    }

    pub(crate) fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    pub(crate) fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub(crate) fn record(&self, order: &Order, event: OrderEvent) {
        self.audit.record(AuditEntry::new(order, event));
    }

    pub(crate) fn reject(&self, operation: &'static str, order_id: Option<OrderId>, error: &OrderError) {
        match order_id {
            Some(order_id) => tracing::warn!(
                operation = operation,
                order_id = %order_id,
                error = %error,
                "Order operation rejected"
            ),
            None => tracing::warn!(operation = operation, error = %error, "Order operation rejected"),
        }
        self.metrics.record_rejection(operation, error);
    }

    /// Resolve an active order or fail with `OrderNotFound`
    pub(crate) fn require_order(
        &self,
        order_id: OrderId,
        operation: &'static str,
    ) -> Result<Arc<Order>, OrderError> {
        self.get_order(order_id).ok_or_else(|| {
            let error = OrderError::OrderNotFound(order_id);
            self.reject(operation, Some(order_id), &error);
            error
        })
    }

    fn collect_orders<P>(&self, predicate: P) -> Vec<Arc<Order>>
    where
        P: Fn(&Order) -> bool,
    {
        let mut orders: Vec<Arc<Order>> = self
            .orders
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .filter(|order| !order.state().is_terminal() && predicate(order))
            .collect();
        orders.sort_by_key(|order| order.created_at());
        orders
    }

    async fn transition(
        &self,
        order_id: OrderId,
        requested: OrderState,
        operation: &'static str,
    ) -> Result<StateChange, OrderError> {
        let order = self.require_order(order_id, operation)?;
        let change = order
            .transition(requested, &self.retry)
            .await
            .inspect_err(|e| self.reject(operation, Some(order_id), e))?;

        self.report_change(&order, change);
        Ok(change)
    }

    async fn transition_and_deregister(
        &self,
        order_id: OrderId,
        requested: OrderState,
        operation: &'static str,
    ) -> Result<StateChange, OrderError> {
        let _guard = self.terminal_transitions.lock().await;

        let order = self.require_order(order_id, operation)?;
        let change = order
            .transition(requested, &self.retry)
            .await
            .inspect_err(|e| self.reject(operation, Some(order_id), e))?;

        if self.orders.remove(&order_id).is_some() {
            self.metrics.record_order_deregistered();
        }
        self.report_change(&order, change);

        tracing::info!(order_id = %order_id, state = %requested, "Order left the active registry");
        Ok(change)
    }

    fn report_change(&self, order: &Order, change: StateChange) {
        if change.is_noop() {
            tracing::debug!(order_id = %order.id(), state = %change.to, "Order already in requested state");
            return;
        }

        self.metrics.record_transition(change.from, change.to);
        self.record(
            order,
            OrderEvent::StateChanged {
                from: change.from,
                to: change.to,
            },
        );
        tracing::info!(
            order_id = %order.id(),
            from = %change.from,
            to = %change.to,
            "Order state changed"
        );
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
