use actix_web::{middleware::from_fn, web};

use super::{error::ApiError, handlers, middleware, orders, pancakes};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    // Health and metrics
    .route("/health", web::get().to(handlers::health))
    .route("/metrics", web::get().to(handlers::metrics))
    .service(
        web::scope("/api")
            .wrap(from_fn(middleware::rate_limit))
            // Orders
            .route("/orders", web::post().to(orders::create_order))
            .route("/orders", web::get().to(orders::list_orders))
            .route("/orders/{order_id}", web::get().to(orders::get_order))
            .route("/orders/{order_id}", web::delete().to(orders::delete_order))
            .route("/orders/{order_id}/complete", web::post().to(orders::complete_order))
            .route("/orders/{order_id}/prepare", web::post().to(orders::prepare_order))
            .route("/orders/{order_id}/deliver", web::post().to(orders::start_delivery))
            .route("/orders/{order_id}/cancel", web::post().to(orders::cancel_order))
            // Pancakes
            .route("/orders/{order_id}/pancakes", web::post().to(pancakes::create_pancake))
            .route("/orders/{order_id}/pancakes", web::get().to(pancakes::list_pancakes))
            .route(
                "/orders/{order_id}/pancakes/{pancake_id}",
                web::get().to(pancakes::get_pancake),
            )
            .route(
                "/orders/{order_id}/pancakes/{pancake_id}",
                web::delete().to(pancakes::remove_pancake),
            )
            // Ingredients
            .route(
                "/orders/{order_id}/pancakes/{pancake_id}/ingredients",
                web::post().to(pancakes::add_ingredient),
            )
            .route(
                "/orders/{order_id}/pancakes/{pancake_id}/ingredients/{ingredient_id}",
                web::delete().to(pancakes::remove_ingredient),
            ),
    );
}
