pub mod api;
pub mod audit;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod services;
pub mod utils;
