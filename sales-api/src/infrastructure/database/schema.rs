use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::models::product::NewProduct;
use crate::domain::models::sale::NewSale;
use crate::domain::models::user::{NewUser, Role};
use crate::domain::services::auth_service::Claims;
use crate::domain::services::product_service::ProductService;
use crate::domain::services::user_service::UserService;
use crate::error::AppError;
use crate::infrastructure::database::Store;

pub async fn migrate(pool: &PgPool) -> Result<(), AppError> {
    // 运行迁移
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Credentials created by [`seed`].
pub const SEED_ADMIN_EMAIL: &str = "admin@example.com";
pub const SEED_ADMIN_PASSWORD: &str = "admin-password";
pub const SEED_USER_EMAIL: &str = "user@example.com";
pub const SEED_USER_PASSWORD: &str = "user-password";

/// Inserts an admin, a regular user, and a couple of products with sales.
pub async fn seed(store: Arc<dyn Store>, now: DateTime<Utc>) -> Result<(), AppError> {
    let users = UserService::new(store.clone());

    let admin = users
        .create(
            NewUser {
                name: "Admin".to_string(),
                email: SEED_ADMIN_EMAIL.to_string(),
                roles: vec![Role::Admin, Role::User],
                password: SEED_ADMIN_PASSWORD.to_string(),
            },
            now,
        )
        .await?;

    users
        .create(
            NewUser {
                name: "Clerk".to_string(),
                email: SEED_USER_EMAIL.to_string(),
                roles: vec![Role::User],
                password: SEED_USER_PASSWORD.to_string(),
            },
            now,
        )
        .await?;

    let owner = Claims::new(admin.id.to_string(), admin.roles.clone(), now, chrono::Duration::zero());
    let products = ProductService::new(store);

    let records = products
        .create(
            &owner,
            NewProduct {
                name: "Vinyl Records".to_string(),
                cost: 2500,
                quantity: 40,
            },
            now,
        )
        .await?;
    let lamps = products
        .create(
            &owner,
            NewProduct {
                name: "Desk Lamp".to_string(),
                cost: 4000,
                quantity: 12,
            },
            now,
        )
        .await?;

    let records_id = records.id.to_string();
    products
        .add_sale(NewSale { quantity: 2, paid: 5000 }, &records_id, now)
        .await?;
    products
        .add_sale(NewSale { quantity: 5, paid: 12000 }, &records_id, now)
        .await?;
    products
        .add_sale(NewSale { quantity: 1, paid: 4000 }, &lamps.id.to_string(), now)
        .await?;

    tracing::info!("Seed data inserted");
    Ok(())
}
