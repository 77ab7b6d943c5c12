use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::domain::order::{OrderError, OrderState};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Order creation and the number of active orders
// - State transitions by (from, to)
// - Pancake and ingredient operations
// - Rejected operations by reason, with optimistic-retry exhaustion
//   tracked separately
// - Rate limited HTTP requests
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // Order Metrics
    pub orders_created: IntCounter,
    pub active_orders: IntGauge,
    pub state_transitions: IntCounterVec,

    // Pancake Metrics
    pub pancake_operations: IntCounterVec,

    // Failure Metrics
    pub operation_rejections: IntCounterVec,
    pub concurrency_exhausted: IntCounterVec,

    // HTTP Metrics
    pub rate_limited_requests: IntCounter,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Order Metrics
        let orders_created = IntCounter::new("orders_created_total", "Total orders created")?;
        registry.register(Box::new(orders_created.clone()))?;

        let active_orders = IntGauge::new(
            "active_orders",
            "Orders currently reachable through the registry",
        )?;
        registry.register(Box::new(active_orders.clone()))?;

        let state_transitions = IntCounterVec::new(
            Opts::new("order_state_transitions_total", "Effective order state transitions"),
            &["from", "to"],
        )?;
        registry.register(Box::new(state_transitions.clone()))?;

        // Pancake Metrics
        let pancake_operations = IntCounterVec::new(
            Opts::new("pancake_operations_total", "Applied pancake and ingredient changes"),
            &["operation"],
        )?;
        registry.register(Box::new(pancake_operations.clone()))?;

        // Failure Metrics
        let operation_rejections = IntCounterVec::new(
            Opts::new("operation_rejections_total", "Operations that returned an error"),
            &["operation", "reason"],
        )?;
        registry.register(Box::new(operation_rejections.clone()))?;

        let concurrency_exhausted = IntCounterVec::new(
            Opts::new(
                "concurrency_exhausted_total",
                "Operations that ran out of optimistic retry attempts",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(concurrency_exhausted.clone()))?;

        // HTTP Metrics
        let rate_limited_requests = IntCounter::new(
            "rate_limited_requests_total",
            "HTTP requests rejected by the rate limiter",
        )?;
        registry.register(Box::new(rate_limited_requests.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            active_orders,
            state_transitions,
            pancake_operations,
            operation_rejections,
            concurrency_exhausted,
            rate_limited_requests,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render every metric in the Prometheus text exposition format
    pub fn encode(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    pub fn record_order_created(&self) {
        self.orders_created.inc();
        self.active_orders.inc();
    }

    pub fn record_order_deregistered(&self) {
        self.active_orders.dec();
    }

    pub fn record_transition(&self, from: OrderState, to: OrderState) {
        self.state_transitions
            .with_label_values(&[from.as_str(), to.as_str()])
            .inc();
    }

    pub fn record_pancake_operation(&self, operation: &str) {
        self.pancake_operations.with_label_values(&[operation]).inc();
    }

    pub fn record_rejection(&self, operation: &str, error: &OrderError) {
        self.operation_rejections
            .with_label_values(&[operation, error.kind()])
            .inc();
        if let OrderError::ConcurrencyExhausted { .. } = error {
            self.concurrency_exhausted.with_label_values(&[operation]).inc();
        }
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited_requests.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert!(metrics.registry.gather().len() > 0);
    }

    #[test]
    fn test_order_gauge_tracks_registrations() {
        let metrics = Metrics::new().unwrap();
        metrics.record_order_created();
        metrics.record_order_created();
        metrics.record_order_deregistered();

        assert_eq!(metrics.orders_created.get(), 2);
        assert_eq!(metrics.active_orders.get(), 1);
    }

    #[test]
    fn test_record_transition() {
        let metrics = Metrics::new().unwrap();
        metrics.record_transition(OrderState::Open, OrderState::Completed);

        let gathered = metrics.registry.gather();
        let transitions = gathered
            .iter()
            .find(|m| m.name() == "order_state_transitions_total")
            .unwrap();
        assert_eq!(transitions.metric[0].counter.value, Some(1.0));
    }

    #[test]
    fn test_exhaustion_is_counted_separately() {
        let metrics = Metrics::new().unwrap();
        metrics.record_rejection(
            "add_ingredient",
            &OrderError::ConcurrencyExhausted {
                operation: "add_ingredient",
                attempts: 3,
            },
        );
        metrics.record_rejection("add_ingredient", &OrderError::validation("name", "empty"));

        assert_eq!(
            metrics
                .concurrency_exhausted
                .with_label_values(&["add_ingredient"])
                .get(),
            1
        );
        assert_eq!(
            metrics
                .operation_rejections
                .with_label_values(&["add_ingredient", "validation"])
                .get(),
            1
        );
    }

    #[test]
    fn test_encode_exposes_metric_names() {
        let metrics = Metrics::new().unwrap();
        metrics.record_order_created();

        let text = metrics.encode().unwrap();
        assert!(text.contains("orders_created_total 1"));
        assert!(text.contains("active_orders 1"));
    }
}
