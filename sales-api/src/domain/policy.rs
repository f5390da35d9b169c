//! Authorization rules. There are two: a role rule and an ownership rule.
//! Callers load the target resource first, so a missing resource surfaces as
//! not-found before either rule runs.

use crate::domain::models::product::Product;
use crate::domain::models::user::Role;
use crate::domain::services::auth_service::Claims;
use crate::error::AppError;

/// Role rule: the caller must hold `role`.
pub fn require_role(claims: &Claims, role: Role) -> Result<(), AppError> {
    if claims.has_role(role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "you are not authorized for that action: role {role} required"
        )))
    }
}

/// Ownership rule: admins may modify any product, everyone else only their own.
pub fn can_modify_product(claims: &Claims, product: &Product) -> Result<(), AppError> {
    if claims.has_role(Role::Admin) || product.user_id == claims.sub {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "attempted action is not allowed".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::product::NewProduct;
    use chrono::{Duration, Utc};

    fn claims(sub: &str, roles: &[Role]) -> Claims {
        Claims::new(
            sub,
            roles.iter().map(|role| role.to_string()).collect(),
            Utc::now(),
            Duration::hours(1),
        )
    }

    fn product_owned_by(owner: &str) -> Product {
        Product::new(
            owner,
            NewProduct {
                name: "Lamp".into(),
                cost: 10,
                quantity: 1,
            },
            Utc::now(),
        )
    }

    #[test]
    fn role_rule() {
        assert!(require_role(&claims("a", &[Role::Admin]), Role::Admin).is_ok());
        assert!(matches!(
            require_role(&claims("a", &[Role::User]), Role::Admin),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            require_role(&claims("a", &[]), Role::User),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn owner_may_modify() {
        let product = product_owned_by("alice");
        assert!(can_modify_product(&claims("alice", &[Role::User]), &product).is_ok());
    }

    #[test]
    fn admin_may_modify_anything() {
        let product = product_owned_by("alice");
        assert!(can_modify_product(&claims("bob", &[Role::Admin]), &product).is_ok());
    }

    #[test]
    fn stranger_may_not_modify() {
        let product = product_owned_by("alice");
        assert!(matches!(
            can_modify_product(&claims("bob", &[Role::User]), &product),
            Err(AppError::Forbidden(_))
        ));
    }
}
