use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// An item for sale. `sold` and `revenue` are summed from the product's sales
/// whenever it is read; they are never written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Product {
    #[sqlx(rename = "product_id")]
    pub id: Uuid,
    pub name: String,
    pub cost: i64,
    pub quantity: i64,
    pub user_id: String,
    pub sold: i64,
    pub revenue: i64,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewProduct {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(range(min = 0, max = 1_000_000_000_000_i64, message = "cost must be between 0 and 1000000000000"))]
    pub cost: i64,
    #[validate(range(min = 0, max = 1_000_000, message = "quantity must be between 0 and 1000000"))]
    pub quantity: i64,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProduct {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[validate(range(min = 0, max = 1_000_000_000_000_i64, message = "cost must be between 0 and 1000000000000"))]
    pub cost: Option<i64>,
    #[validate(range(min = 0, max = 1_000_000, message = "quantity must be between 0 and 1000000"))]
    pub quantity: Option<i64>,
}

impl Product {
    pub fn new(owner: &str, input: NewProduct, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            cost: input.cost,
            quantity: input.quantity,
            user_id: owner.to_string(),
            sold: 0,
            revenue: 0,
            date_created: now,
            date_updated: now,
        }
    }

    pub fn apply(&mut self, update: UpdateProduct, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(cost) = update.cost {
            self.cost = cost;
        }
        if let Some(quantity) = update.quantity {
            self.quantity = quantity;
        }
        self.date_updated = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn chair(now: DateTime<Utc>) -> Product {
        Product::new(
            "user-1",
            NewProduct {
                name: "Chair".into(),
                cost: 1000,
                quantity: 5,
            },
            now,
        )
    }

    #[test]
    fn new_product_starts_without_sales() {
        let now = Utc::now();
        let product = chair(now);

        assert_eq!(product.user_id, "user-1");
        assert_eq!(product.sold, 0);
        assert_eq!(product.revenue, 0);
        assert_eq!(product.date_created, now);
        assert_eq!(product.date_updated, now);
    }

    #[test]
    fn apply_only_touches_present_fields() {
        let created = Utc::now();
        let later = created + Duration::minutes(5);
        let mut product = chair(created);

        product.apply(
            UpdateProduct {
                cost: Some(1200),
                ..Default::default()
            },
            later,
        );

        assert_eq!(product.name, "Chair");
        assert_eq!(product.cost, 1200);
        assert_eq!(product.quantity, 5);
        assert_eq!(product.date_created, created);
        assert_eq!(product.date_updated, later);
    }

    #[test]
    fn update_validation_skips_absent_fields() {
        assert!(UpdateProduct::default().validate().is_ok());

        let update = UpdateProduct {
            name: Some(String::new()),
            quantity: Some(-1),
            ..Default::default()
        };
        let errors = update.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 2);
    }
}
