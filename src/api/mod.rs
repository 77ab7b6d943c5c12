//! HTTP adapter over the order services.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod orders;
pub mod pancakes;
pub mod rate_limit;
pub mod routes;

use std::sync::Arc;

use crate::metrics::Metrics;
use crate::services::{OrderService, PancakeService};

pub use error::ApiError;
pub use rate_limit::RateLimiter;
pub use routes::configure;

/// Shared state handed to every handler through `web::Data`
pub struct AppState {
    pub orders: Arc<OrderService>,
    pub pancakes: Arc<PancakeService>,
    pub metrics: Arc<Metrics>,
    pub limiter: Arc<RateLimiter>,
}
