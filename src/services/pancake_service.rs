use std::sync::Arc;

use crate::domain::order::{
    Ingredient, IngredientId, Order, OrderError, OrderEvent, OrderId, Pancake, PancakeId,
};

use super::order_service::OrderService;

/// Pancake and ingredient operations on orders held by an [`OrderService`].
///
/// Mutations resolve the order through the registry and require it to be
/// OPEN. Reads only require the order to be active, so a COMPLETED or
/// PREPARED order can still be inspected.
pub struct PancakeService {
    orders: Arc<OrderService>,
}

impl PancakeService {
    pub fn new(orders: Arc<OrderService>) -> Self {
        Self { orders }
    }

    pub async fn create_pancake(&self, order_id: OrderId) -> Result<PancakeId, OrderError> {
        const OPERATION: &str = "create_pancake";

        let order = self.open_order(order_id, OPERATION)?;
        let pancake = Arc::new(Pancake::new());
        let pancake_id = pancake.id();

        let pancake_count = order
            .add_pancake(pancake, self.orders.retry_config())
            .await
            .inspect_err(|e| self.orders.reject(OPERATION, Some(order_id), e))?;

        self.orders.metrics().record_pancake_operation(OPERATION);
        self.orders.record(
            &order,
            OrderEvent::PancakeAdded {
                pancake_id,
                pancake_count,
            },
        );
        tracing::info!(
            order_id = %order_id,
            pancake_id = %pancake_id,
            pancake_count = pancake_count,
            "Pancake added"
        );

        Ok(pancake_id)
    }

    pub fn get_pancake(
        &self,
        order_id: OrderId,
        pancake_id: PancakeId,
    ) -> Result<Option<Arc<Pancake>>, OrderError> {
        let order = self.orders.require_order(order_id, "get_pancake")?;
        Ok(order.pancake(pancake_id))
    }

    pub fn get_pancakes_by_order(&self, order_id: OrderId) -> Result<Vec<Arc<Pancake>>, OrderError> {
        let order = self.orders.require_order(order_id, "get_pancakes_by_order")?;
        Ok(order.pancakes().as_ref().clone())
    }

    /// Remove a pancake; removing one the order does not hold succeeds
    pub async fn remove_pancake(
        &self,
        order_id: OrderId,
        pancake_id: PancakeId,
    ) -> Result<(), OrderError> {
        const OPERATION: &str = "remove_pancake";

        let order = self.open_order(order_id, OPERATION)?;
        let removed = order
            .remove_pancake(pancake_id, self.orders.retry_config())
            .await
            .inspect_err(|e| self.orders.reject(OPERATION, Some(order_id), e))?;

        if !removed {
            tracing::debug!(order_id = %order_id, pancake_id = %pancake_id, "Pancake already absent");
            return Ok(());
        }

        let pancake_count = order.pancake_count();
        self.orders.metrics().record_pancake_operation(OPERATION);
        self.orders.record(
            &order,
            OrderEvent::PancakeRemoved {
                pancake_id,
                pancake_count,
            },
        );
        tracing::info!(
            order_id = %order_id,
            pancake_id = %pancake_id,
            pancake_count = pancake_count,
            "Pancake removed"
        );

        Ok(())
    }

    pub async fn add_ingredient_to_pancake(
        &self,
        order_id: OrderId,
        pancake_id: PancakeId,
        name: &str,
    ) -> Result<Ingredient, OrderError> {
        const OPERATION: &str = "add_ingredient";

        let ingredient =
            Ingredient::new(name).inspect_err(|e| self.orders.reject(OPERATION, Some(order_id), e))?;
        let (order, pancake) = self.open_pancake(order_id, pancake_id, OPERATION)?;

        let ingredient_count = pancake
            .add_ingredient(ingredient.clone(), self.orders.retry_config())
            .await
            .inspect_err(|e| self.orders.reject(OPERATION, Some(order_id), e))?;

        self.orders.metrics().record_pancake_operation(OPERATION);
        self.orders.record(
            &order,
            OrderEvent::IngredientAdded {
                pancake_id,
                ingredient_id: ingredient.id(),
                name: ingredient.name().to_string(),
            },
        );
        tracing::info!(
            order_id = %order_id,
            pancake_id = %pancake_id,
            ingredient = ingredient.name(),
            ingredient_count = ingredient_count,
            "Ingredient added"
        );

        Ok(ingredient)
    }

    /// Remove an ingredient; removing one the pancake does not hold succeeds
    pub async fn remove_ingredient_from_pancake(
        &self,
        order_id: OrderId,
        pancake_id: PancakeId,
        ingredient_id: IngredientId,
    ) -> Result<(), OrderError> {
        const OPERATION: &str = "remove_ingredient";

        let (order, pancake) = self.open_pancake(order_id, pancake_id, OPERATION)?;
        let removed = pancake
            .remove_ingredient(ingredient_id, self.orders.retry_config())
            .await
            .inspect_err(|e| self.orders.reject(OPERATION, Some(order_id), e))?;

        if !removed {
            tracing::debug!(
                order_id = %order_id,
                pancake_id = %pancake_id,
                ingredient_id = %ingredient_id,
                "Ingredient already absent"
            );
            return Ok(());
        }

        self.orders.metrics().record_pancake_operation(OPERATION);
        self.orders.record(
            &order,
            OrderEvent::IngredientRemoved {
                pancake_id,
                ingredient_id,
            },
        );
        tracing::info!(
            order_id = %order_id,
            pancake_id = %pancake_id,
            ingredient_id = %ingredient_id,
            "Ingredient removed"
        );

        Ok(())
    }

    fn open_order(&self, order_id: OrderId, operation: &'static str) -> Result<Arc<Order>, OrderError> {
        let order = self.orders.require_order(order_id, operation)?;
        order
            .ensure_open()
            .inspect_err(|e| self.orders.reject(operation, Some(order_id), e))?;
        Ok(order)
    }

    fn open_pancake(
        &self,
        order_id: OrderId,
        pancake_id: PancakeId,
        operation: &'static str,
    ) -> Result<(Arc<Order>, Arc<Pancake>), OrderError> {
        let order = self.open_order(order_id, operation)?;
        let pancake = order.pancake(pancake_id).ok_or_else(|| {
            let error = OrderError::PancakeNotFound(pancake_id);
            self.orders.reject(operation, Some(order_id), &error);
            error
        })?;
        Ok((order, pancake))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::InMemoryAuditLog;
    use crate::domain::order::OrderState;
    use crate::metrics::Metrics;
    use crate::utils::RetryConfig;

    struct Fixture {
        orders: Arc<OrderService>,
        pancakes: Arc<PancakeService>,
        audit: Arc<InMemoryAuditLog>,
    }

    fn fixture() -> Fixture {
        let audit = Arc::new(InMemoryAuditLog::new());
        let metrics = Arc::new(Metrics::new().unwrap());
        let orders = Arc::new(OrderService::new(RetryConfig::default(), audit.clone(), metrics));
        let pancakes = Arc::new(PancakeService::new(Arc::clone(&orders)));
        Fixture {
            orders,
            pancakes,
            audit,
        }
    }

    #[tokio::test]
    async fn test_delivery_scenario() {
        let f = fixture();
        let order_id = f.orders.create_order(10, 20).unwrap().id();

        let pancake_id = f.pancakes.create_pancake(order_id).await.unwrap();
        let chocolate = f
            .pancakes
            .add_ingredient_to_pancake(order_id, pancake_id, "Dark Chocolate")
            .await
            .unwrap();

        f.orders.complete_order(order_id).await.unwrap();
        f.orders.prepare_order(order_id).await.unwrap();

        let visible = f.pancakes.get_pancakes_by_order(order_id).unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id(), pancake_id);
        assert_eq!(*visible[0].ingredients(), vec![chocolate]);

        f.orders.start_delivery(order_id).await.unwrap();

        assert!(f.orders.get_order(order_id).is_none());
        assert_eq!(
            f.pancakes.get_pancakes_by_order(order_id).unwrap_err(),
            OrderError::OrderNotFound(order_id)
        );
    }

    #[tokio::test]
    async fn test_cancel_scenario() {
        let f = fixture();
        let order_id = f.orders.create_order(1, 2).unwrap().id();
        let pancake_id = f.pancakes.create_pancake(order_id).await.unwrap();

        f.orders.cancel_order(order_id).await.unwrap();

        assert!(f.orders.get_order(order_id).is_none());
        let result = f
            .pancakes
            .add_ingredient_to_pancake(order_id, pancake_id, "Berries")
            .await;
        assert_eq!(result, Err(OrderError::OrderNotFound(order_id)));
    }

    #[tokio::test]
    async fn test_mutations_require_open_order() {
        let f = fixture();
        let order_id = f.orders.create_order(1, 1).unwrap().id();
        let pancake_id = f.pancakes.create_pancake(order_id).await.unwrap();
        f.orders.complete_order(order_id).await.unwrap();

        let invalid = |result: Result<(), OrderError>| {
            matches!(
                result,
                Err(OrderError::InvalidState {
                    state: OrderState::Completed,
                    ..
                })
            )
        };

        assert!(invalid(f.pancakes.create_pancake(order_id).await.map(|_| ())));
        assert!(invalid(f.pancakes.remove_pancake(order_id, pancake_id).await));
        assert!(invalid(
            f.pancakes
                .add_ingredient_to_pancake(order_id, pancake_id, "Berries")
                .await
                .map(|_| ())
        ));
        assert!(invalid(
            f.pancakes
                .remove_ingredient_from_pancake(order_id, pancake_id, IngredientId::new())
                .await
        ));

        // Reads still work while the order is active
        assert!(f.pancakes.get_pancake(order_id, pancake_id).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_ingredient_validation_and_missing_pancake() {
        let f = fixture();
        let order_id = f.orders.create_order(1, 1).unwrap().id();
        let pancake_id = f.pancakes.create_pancake(order_id).await.unwrap();

        let too_long = "x".repeat(51);
        for name in ["", "   ", too_long.as_str()] {
            let result = f
                .pancakes
                .add_ingredient_to_pancake(order_id, pancake_id, name)
                .await;
            assert!(matches!(result, Err(OrderError::Validation { field: "name", .. })));
        }

        let missing = PancakeId::new();
        assert_eq!(
            f.pancakes
                .add_ingredient_to_pancake(order_id, missing, "Berries")
                .await,
            Err(OrderError::PancakeNotFound(missing))
        );
        assert_eq!(
            f.pancakes
                .remove_ingredient_from_pancake(order_id, missing, IngredientId::new())
                .await,
            Err(OrderError::PancakeNotFound(missing))
        );
        assert!(f.pancakes.get_pancake(order_id, missing).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_removals_round_trip_and_absent_is_noop() {
        let f = fixture();
        let order_id = f.orders.create_order(1, 1).unwrap().id();
        let keep = f.pancakes.create_pancake(order_id).await.unwrap();
        let drop = f.pancakes.create_pancake(order_id).await.unwrap();

        let milk = f
            .pancakes
            .add_ingredient_to_pancake(order_id, keep, "Milk Chocolate")
            .await
            .unwrap();
        let nuts = f
            .pancakes
            .add_ingredient_to_pancake(order_id, keep, "Hazelnuts")
            .await
            .unwrap();

        f.pancakes
            .remove_ingredient_from_pancake(order_id, keep, nuts.id())
            .await
            .unwrap();
        f.pancakes
            .remove_ingredient_from_pancake(order_id, keep, nuts.id())
            .await
            .unwrap();
        f.pancakes.remove_pancake(order_id, drop).await.unwrap();
        f.pancakes.remove_pancake(order_id, drop).await.unwrap();

        let remaining = f.pancakes.get_pancakes_by_order(order_id).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id(), keep);
        assert_eq!(*remaining[0].ingredients(), vec![milk]);

        let removals = f
            .audit
            .events_for(order_id)
            .into_iter()
            .filter(|e| {
                matches!(
                    e,
                    OrderEvent::PancakeRemoved { .. } | OrderEvent::IngredientRemoved { .. }
                )
            })
            .count();
        assert_eq!(removals, 2);
    }

    #[tokio::test]
    async fn test_audit_trail_follows_operations() {
        let f = fixture();
        let order_id = f.orders.create_order(3, 4).unwrap().id();
        let pancake_id = f.pancakes.create_pancake(order_id).await.unwrap();
        let ingredient = f
            .pancakes
            .add_ingredient_to_pancake(order_id, pancake_id, " Berries ")
            .await
            .unwrap();

        assert_eq!(
            f.audit.events_for(order_id),
            vec![
                OrderEvent::Created,
                OrderEvent::PancakeAdded {
                    pancake_id,
                    pancake_count: 1,
                },
                OrderEvent::IngredientAdded {
                    pancake_id,
                    ingredient_id: ingredient.id(),
                    name: "Berries".to_string(),
                },
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_ingredient_appends_are_never_lost() {
        const WRITERS: usize = 32;

        let f = fixture();
        let order_id = f.orders.create_order(7, 7).unwrap().id();
        let pancake_id = f.pancakes.create_pancake(order_id).await.unwrap();

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..WRITERS {
            let pancakes = Arc::clone(&f.pancakes);
            tasks.spawn(async move {
                pancakes
                    .add_ingredient_to_pancake(order_id, pancake_id, &format!("Topping {i}"))
                    .await
            });
        }

        let mut added = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined.unwrap() {
                Ok(ingredient) => added.push(ingredient.id()),
                Err(OrderError::ConcurrencyExhausted { attempts, .. }) => assert_eq!(attempts, 3),
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        let pancake = f.pancakes.get_pancake(order_id, pancake_id).unwrap().unwrap();
        let present = pancake.ingredients();
        assert_eq!(present.len(), added.len());
        for id in added {
            assert_eq!(present.iter().filter(|i| i.id() == id).count(), 1);
        }
    }
}
