use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::api::extract::JsonBody;
use crate::domain::models::sale::{NewSale, Sale};
use crate::domain::services::auth_service::Claims;
use crate::error::AppError;
use crate::server::AppState;

pub async fn add_sale(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
    JsonBody(input): JsonBody<NewSale>,
) -> Result<(StatusCode, Json<Sale>), AppError> {
    let sale = state.products.add_sale(input, &product_id, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

pub async fn list_sales(
    State(state): State<Arc<AppState>>,
    _claims: Claims,
    Path(product_id): Path<String>,
) -> Result<Json<Vec<Sale>>, AppError> {
    let sales = state.products.list_sales(&product_id).await?;
    Ok(Json(sales))
}
