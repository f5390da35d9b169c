use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::domain::models::product::Product;
use crate::domain::models::sale::Sale;
use crate::domain::models::user::User;
use crate::error::AppError;
use crate::infrastructure::database::Store;

const PRODUCT_COLUMNS: &str = r#"
    SELECT
        p.product_id, p.name, p.cost, p.quantity, p.user_id,
        COALESCE(SUM(s.quantity), 0)::BIGINT AS sold,
        COALESCE(SUM(s.paid), 0)::BIGINT AS revenue,
        p.date_created, p.date_updated
    FROM products AS p
    LEFT JOIN sales AS s ON p.product_id = s.product_id
"#;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Builds the pool without dialing; the first query opens a connection,
    /// so the service can start while the database is still coming up.
    pub fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        tracing::info!(host = %config.host, database = %config.name, "Initializing PostgreSQL connection pool");

        let ssl_mode = if config.disable_tls {
            PgSslMode::Disable
        } else {
            PgSslMode::Require
        };

        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name)
            .ssl_mode(ssl_mode)
            .options([("timezone", "UTC")]);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy_with(options);

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn status_check(&self) -> Result<(), AppError> {
        // Ping can report a stale connection as healthy; a query cannot.
        sqlx::query_scalar::<_, bool>("SELECT true")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let query = format!("{PRODUCT_COLUMNS} GROUP BY p.product_id");
        let products = sqlx::query_as::<_, Product>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let query = format!("{PRODUCT_COLUMNS} WHERE p.product_id = $1 GROUP BY p.product_id");
        let product = sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn insert_product(&self, product: &Product) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO products (product_id, name, cost, quantity, user_id, date_created, date_updated)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(product.cost)
        .bind(product.quantity)
        .bind(&product.user_id)
        .bind(product.date_created)
        .bind(product.date_updated)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE products
            SET name = $2, cost = $3, quantity = $4, date_updated = $5
            WHERE product_id = $1
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(product.cost)
        .bind(product.quantity)
        .bind(product.date_updated)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_product(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(r#"DELETE FROM products WHERE product_id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_sale(&self, sale: &Sale) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sales (sale_id, product_id, quantity, paid, date_created)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(sale.id)
        .bind(sale.product_id)
        .bind(sale.quantity)
        .bind(sale.paid)
        .bind(sale.date_created)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_sales(&self, product_id: Uuid) -> Result<Vec<Sale>, AppError> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT sale_id, product_id, quantity, paid, date_created
            FROM sales
            WHERE product_id = $1
            ORDER BY date_created
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sales)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, name, email, roles, password_hash, date_created, date_updated
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, name, email, roles, password_hash, date_created, date_updated)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.roles)
        .bind(&user.password_hash)
        .bind(user.date_created)
        .bind(user.date_updated)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
