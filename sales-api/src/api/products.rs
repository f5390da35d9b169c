use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::api::extract::JsonBody;
use crate::domain::models::product::{NewProduct, Product, UpdateProduct};
use crate::domain::services::auth_service::Claims;
use crate::error::AppError;
use crate::server::AppState;

pub async fn list_products(
    State(state): State<Arc<AppState>>,
    _claims: Claims,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = state.products.list().await?;
    Ok(Json(products))
}

pub async fn create_product(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    JsonBody(input): JsonBody<NewProduct>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let product = state.products.create(&claims, input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product(
    State(state): State<Arc<AppState>>,
    _claims: Claims,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    let product = state.products.retrieve(&id).await?;
    Ok(Json(product))
}

pub async fn update_product(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Path(id): Path<String>,
    JsonBody(update): JsonBody<UpdateProduct>,
) -> Result<StatusCode, AppError> {
    state.products.update(&claims, &id, update, Utc::now()).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.products.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
