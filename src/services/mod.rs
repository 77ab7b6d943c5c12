pub mod order_service;
pub mod pancake_service;

pub use order_service::OrderService;
pub use pancake_service::PancakeService;
