use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::models::product::Product;
use crate::domain::models::sale::Sale;
use crate::domain::models::user::User;
use crate::error::AppError;
use crate::infrastructure::database::Store;

#[derive(Debug, Default)]
struct Tables {
    products: Vec<Product>,
    sales: Vec<Sale>,
    users: Vec<User>,
}

/// Process-local store keeping rows in insertion order. Used by tests and by
/// `db.backend = "memory"`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tables {
    /// Sums the product's sales. Overflow is reported, never wrapped.
    fn with_aggregates(&self, product: &Product) -> Result<Product, AppError> {
        let mut sold: i64 = 0;
        let mut revenue: i64 = 0;
        for sale in self.sales.iter().filter(|sale| sale.product_id == product.id) {
            sold = sold.checked_add(sale.quantity).ok_or_else(|| overflow(product))?;
            revenue = revenue.checked_add(sale.paid).ok_or_else(|| overflow(product))?;
        }

        Ok(Product {
            sold,
            revenue,
            ..product.clone()
        })
    }
}

fn overflow(product: &Product) -> AppError {
    AppError::Internal(format!("sales aggregate overflow for product {}", product.id))
}

#[async_trait]
impl Store for MemoryStore {
    async fn status_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let tables = self.tables.read().await;
        tables
            .products
            .iter()
            .map(|product| tables.with_aggregates(product))
            .collect()
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let tables = self.tables.read().await;
        tables
            .products
            .iter()
            .find(|product| product.id == id)
            .map(|product| tables.with_aggregates(product))
            .transpose()
    }

    async fn insert_product(&self, product: &Product) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables.products.iter().any(|existing| existing.id == product.id) {
            return Err(AppError::Internal(format!("duplicate product id {}", product.id)));
        }
        tables.products.push(Product {
            sold: 0,
            revenue: 0,
            ..product.clone()
        });
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if let Some(stored) = tables.products.iter_mut().find(|stored| stored.id == product.id) {
            stored.name = product.name.clone();
            stored.cost = product.cost;
            stored.quantity = product.quantity;
            stored.date_updated = product.date_updated;
        }
        Ok(())
    }

    async fn delete_product(&self, id: Uuid) -> Result<u64, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.products.len();
        tables.products.retain(|product| product.id != id);
        let removed = before - tables.products.len();
        if removed > 0 {
            tables.sales.retain(|sale| sale.product_id != id);
        }
        Ok(removed as u64)
    }

    async fn insert_sale(&self, sale: &Sale) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if !tables.products.iter().any(|product| product.id == sale.product_id) {
            return Err(AppError::Internal(format!(
                "sale references unknown product {}",
                sale.product_id
            )));
        }
        tables.sales.push(sale.clone());
        Ok(())
    }

    async fn list_sales(&self, product_id: Uuid) -> Result<Vec<Sale>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .sales
            .iter()
            .filter(|sale| sale.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|user| user.email == email).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|existing| existing.email == user.email) {
            return Err(AppError::Internal(format!("duplicate user email {}", user.email)));
        }
        tables.users.push(user.clone());
        Ok(())
    }
}
