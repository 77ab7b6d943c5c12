//! Pancake and ingredient API handlers.

use actix_web::{web, HttpResponse};

use super::dto::{AddIngredientRequest, IngredientResponse, PancakeCreatedResponse, PancakeResponse};
use super::error::ApiError;
use super::AppState;
use crate::domain::order::{IngredientId, OrderError, OrderId, PancakeId};

pub async fn create_pancake(
    state: web::Data<AppState>,
    path: web::Path<OrderId>,
) -> Result<HttpResponse, ApiError> {
    let id = state.pancakes.create_pancake(path.into_inner()).await?;
    Ok(HttpResponse::Created().json(PancakeCreatedResponse { id }))
}

pub async fn list_pancakes(
    state: web::Data<AppState>,
    path: web::Path<OrderId>,
) -> Result<HttpResponse, ApiError> {
    let pancakes = state.pancakes.get_pancakes_by_order(path.into_inner())?;
    let body: Vec<PancakeResponse> = pancakes
        .iter()
        .map(|pancake| PancakeResponse::from(pancake.as_ref()))
        .collect();
    Ok(HttpResponse::Ok().json(body))
}

pub async fn get_pancake(
    state: web::Data<AppState>,
    path: web::Path<(OrderId, PancakeId)>,
) -> Result<HttpResponse, ApiError> {
    let (order_id, pancake_id) = path.into_inner();
    let pancake = state
        .pancakes
        .get_pancake(order_id, pancake_id)?
        .ok_or(OrderError::PancakeNotFound(pancake_id))?;
    Ok(HttpResponse::Ok().json(PancakeResponse::from(pancake.as_ref())))
}

pub async fn remove_pancake(
    state: web::Data<AppState>,
    path: web::Path<(OrderId, PancakeId)>,
) -> Result<HttpResponse, ApiError> {
    let (order_id, pancake_id) = path.into_inner();
    state.pancakes.remove_pancake(order_id, pancake_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn add_ingredient(
    state: web::Data<AppState>,
    path: web::Path<(OrderId, PancakeId)>,
    body: web::Json<AddIngredientRequest>,
) -> Result<HttpResponse, ApiError> {
    let (order_id, pancake_id) = path.into_inner();
    let ingredient = state
        .pancakes
        .add_ingredient_to_pancake(order_id, pancake_id, &body.name)
        .await?;
    Ok(HttpResponse::Created().json(IngredientResponse::from(&ingredient)))
}

pub async fn remove_ingredient(
    state: web::Data<AppState>,
    path: web::Path<(OrderId, PancakeId, IngredientId)>,
) -> Result<HttpResponse, ApiError> {
    let (order_id, pancake_id, ingredient_id) = path.into_inner();
    state
        .pancakes
        .remove_ingredient_from_pancake(order_id, pancake_id, ingredient_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
