//! Route table. Handlers decode the request, call a domain service and
//! encode the result; nothing else.

pub mod extract;
pub mod health;
pub mod products;
pub mod sales;
pub mod users;

use std::sync::Arc;

use axum::{
    handler::Handler,
    middleware::from_fn_with_state,
    routing::get,
    Router,
};

use crate::domain::models::user::Role;
use crate::error::AppError;
use crate::middleware::auth::{authenticate, require_role};
use crate::server::AppState;

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let admin_only = || from_fn_with_state(Role::Admin, require_role);

    // 需要令牌的路由
    let protected = Router::new()
        .route(
            "/v1/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/v1/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product.layer(admin_only())),
        )
        .route(
            "/v1/products/{id}/sales",
            get(sales::list_sales).post(sales::add_sale.layer(admin_only())),
        )
        .route_layer(from_fn_with_state(state, authenticate));

    Router::new()
        .route("/v1/health", get(health::health_check))
        .route("/v1/users/token", get(users::token))
        .merge(protected)
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
}

async fn not_found() -> AppError {
    AppError::NotFound("route not found".to_string())
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
