//! Persistence gateway. Every query the service issues goes through
//! [`Store`]; no business rules live here.

pub mod memory;
pub mod postgres;
pub mod schema;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::config::{DatabaseBackend, DatabaseConfig};
use crate::domain::models::product::Product;
use crate::domain::models::sale::Sale;
use crate::domain::models::user::User;
use crate::error::AppError;

#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Forces a round trip to the backing store.
    async fn status_check(&self) -> Result<(), AppError>;

    /// All products with `sold`/`revenue` summed from their sales.
    async fn list_products(&self) -> Result<Vec<Product>, AppError>;

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, AppError>;

    async fn insert_product(&self, product: &Product) -> Result<(), AppError>;

    /// Writes name, cost, quantity and `date_updated`.
    async fn update_product(&self, product: &Product) -> Result<(), AppError>;

    /// Returns the number of rows removed, which may be zero.
    async fn delete_product(&self, id: Uuid) -> Result<u64, AppError>;

    async fn insert_sale(&self, sale: &Sale) -> Result<(), AppError>;

    async fn list_sales(&self, product_id: Uuid) -> Result<Vec<Sale>, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn insert_user(&self, user: &User) -> Result<(), AppError>;
}

pub fn connect(config: &DatabaseConfig) -> Result<Arc<dyn Store>, AppError> {
    match config.backend {
        DatabaseBackend::Postgres => Ok(Arc::new(postgres::PgStore::connect(config)?)),
        DatabaseBackend::Memory => {
            tracing::warn!("Using in-memory store, data will not survive a restart");
            Ok(Arc::new(memory::MemoryStore::new()))
        }
    }
}
