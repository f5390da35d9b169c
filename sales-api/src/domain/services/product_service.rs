use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::domain::models::product::{NewProduct, Product, UpdateProduct};
use crate::domain::models::sale::{NewSale, Sale};
use crate::domain::policy;
use crate::domain::services::auth_service::Claims;
use crate::error::AppError;
use crate::infrastructure::database::Store;

pub struct ProductService {
    store: Arc<dyn Store>,
}

impl ProductService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Product>, AppError> {
        self.store.list_products().await
    }

    pub async fn retrieve(&self, id: &str) -> Result<Product, AppError> {
        let id = parse_id(id)?;

        self.store
            .find_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound("product not found".to_string()))
    }

    pub async fn create(
        &self,
        claims: &Claims,
        input: NewProduct,
        now: DateTime<Utc>,
    ) -> Result<Product, AppError> {
        input.validate()?;

        let product = Product::new(&claims.sub, input, now);
        self.store.insert_product(&product).await?;

        tracing::info!(product_id = %product.id, owner = %product.user_id, "product created");
        Ok(product)
    }

    /// Loads the product, checks the caller may modify it, then writes back
    /// the merged fields. Read and write are separate statements.
    pub async fn update(
        &self,
        claims: &Claims,
        id: &str,
        update: UpdateProduct,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut product = self.retrieve(id).await?;
        policy::can_modify_product(claims, &product)?;
        update.validate()?;

        product.apply(update, now);
        self.store.update_product(&product).await?;

        tracing::info!(product_id = %product.id, "product updated");
        Ok(())
    }

    /// Succeeds whether or not a product with this id existed.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let id = parse_id(id)?;

        let affected = self.store.delete_product(id).await?;
        tracing::info!(product_id = %id, affected, "product deleted");

        Ok(())
    }

    /// Records a sale. The product must exist; sales are never stored against
    /// an unknown product id.
    pub async fn add_sale(
        &self,
        input: NewSale,
        product_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Sale, AppError> {
        let product = self.retrieve(product_id).await?;
        input.validate()?;

        let sale = Sale::new(product.id, input, now);
        self.store.insert_sale(&sale).await?;

        tracing::info!(sale_id = %sale.id, product_id = %product.id, "sale recorded");
        Ok(sale)
    }

    pub async fn list_sales(&self, product_id: &str) -> Result<Vec<Sale>, AppError> {
        let product_id = parse_id(product_id)?;
        self.store.list_sales(product_id).await
    }
}

fn parse_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::InvalidIdentifier)
}
