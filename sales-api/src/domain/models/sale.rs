use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A recorded sale of some quantity of one product. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Sale {
    #[sqlx(rename = "sale_id")]
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub paid: i64,
    pub date_created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewSale {
    #[validate(range(min = 1, max = 1_000_000, message = "quantity must be between 1 and 1000000"))]
    pub quantity: i64,
    #[validate(range(min = 0, max = 1_000_000_000_000_i64, message = "paid must be between 0 and 1000000000000"))]
    pub paid: i64,
}

impl Sale {
    pub fn new(product_id: Uuid, input: NewSale, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            quantity: input.quantity,
            paid: input.paid,
            date_created: now,
        }
    }
}
