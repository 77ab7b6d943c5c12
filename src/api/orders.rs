//! Order API handlers.

use actix_web::{web, HttpResponse};

use super::dto::{CreateOrderRequest, OrderListQuery, OrderResponse, TransitionResponse};
use super::error::ApiError;
use super::AppState;
use crate::domain::order::{OrderError, OrderId, OrderState, UnknownOrderState};

pub async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, ApiError> {
    let order = state.orders.create_order(body.building, body.room)?;
    Ok(HttpResponse::Created().json(OrderResponse::from(order.as_ref())))
}

pub async fn list_orders(
    state: web::Data<AppState>,
    query: web::Query<OrderListQuery>,
) -> Result<HttpResponse, ApiError> {
    let orders = match query.state.as_deref() {
        Some(raw) => {
            let wanted: OrderState = raw
                .parse()
                .map_err(|e: UnknownOrderState| ApiError::BadRequest(e.to_string()))?;
            state.orders.get_orders_by_state(wanted)
        }
        None => state.orders.get_all_orders(),
    };

    let body: Vec<OrderResponse> = orders
        .iter()
        .map(|order| OrderResponse::from(order.as_ref()))
        .collect();
    Ok(HttpResponse::Ok().json(body))
}

pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<OrderId>,
) -> Result<HttpResponse, ApiError> {
    let order_id = path.into_inner();
    let order = state
        .orders
        .get_order(order_id)
        .ok_or(OrderError::OrderNotFound(order_id))?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order.as_ref())))
}

pub async fn delete_order(
    state: web::Data<AppState>,
    path: web::Path<OrderId>,
) -> Result<HttpResponse, ApiError> {
    state.orders.delete_order(path.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn complete_order(
    state: web::Data<AppState>,
    path: web::Path<OrderId>,
) -> Result<HttpResponse, ApiError> {
    let order_id = path.into_inner();
    let change = state.orders.complete_order(order_id).await?;
    Ok(HttpResponse::Ok().json(TransitionResponse::new(order_id, change)))
}

pub async fn prepare_order(
    state: web::Data<AppState>,
    path: web::Path<OrderId>,
) -> Result<HttpResponse, ApiError> {
    let order_id = path.into_inner();
    let change = state.orders.prepare_order(order_id).await?;
    Ok(HttpResponse::Ok().json(TransitionResponse::new(order_id, change)))
}

pub async fn start_delivery(
    state: web::Data<AppState>,
    path: web::Path<OrderId>,
) -> Result<HttpResponse, ApiError> {
    let order_id = path.into_inner();
    let change = state.orders.start_delivery(order_id).await?;
    Ok(HttpResponse::Ok().json(TransitionResponse::new(order_id, change)))
}

pub async fn cancel_order(
    state: web::Data<AppState>,
    path: web::Path<OrderId>,
) -> Result<HttpResponse, ApiError> {
    let order_id = path.into_inner();
    let change = state.orders.cancel_order(order_id).await?;
    Ok(HttpResponse::Ok().json(TransitionResponse::new(order_id, change)))
}
