use std::sync::Arc;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};

use crate::domain::models::user::{NewUser, User};
use crate::domain::services::auth_service::Claims;
use crate::error::AppError;
use crate::infrastructure::database::Store;

pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Checks an email/password pair and returns the claims a token should
    /// carry. A missing user and a wrong password fail the same way.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Claims, AppError> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or(AppError::AuthenticationFailure)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::AuthenticationFailure);
        }

        Ok(Claims::new(user.id.to_string(), user.roles, now, ttl))
    }

    pub async fn create(&self, input: NewUser, now: DateTime<Utc>) -> Result<User, AppError> {
        if self.store.find_user_by_email(&input.email).await?.is_some() {
            return Err(AppError::validation(format!("email {} already exists", input.email)));
        }

        let password_hash = hash_password(&input.password)?;
        let user = User::new(&input, password_hash, now);
        self.store.insert_user(&user).await?;

        Ok(user)
    }
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    // 使用 Argon2 哈希密码
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::PasswordHash(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::PasswordHash(format!("Failed to parse password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::user::Role;
    use crate::infrastructure::database::memory::MemoryStore;

    fn service() -> UserService {
        UserService::new(Arc::new(MemoryStore::new()))
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Admin".into(),
            email: email.into(),
            roles: vec![Role::Admin, Role::User],
            password: "correct horse".into(),
        }
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("secret").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[tokio::test]
    async fn authenticate_returns_claims_with_roles() {
        let service = service();
        let now = Utc::now();
        let user = service.create(new_user("admin@example.com"), now).await.unwrap();

        let claims = service
            .authenticate("admin@example.com", "correct horse", now, Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert!(claims.has_role(Role::Admin));
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_the_same() {
        let service = service();
        let now = Utc::now();
        service.create(new_user("admin@example.com"), now).await.unwrap();

        let missing = service
            .authenticate("nobody@example.com", "correct horse", now, Duration::hours(1))
            .await
            .unwrap_err();
        let wrong = service
            .authenticate("admin@example.com", "wrong", now, Duration::hours(1))
            .await
            .unwrap_err();

        assert!(matches!(missing, AppError::AuthenticationFailure));
        assert!(matches!(wrong, AppError::AuthenticationFailure));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let service = service();
        let now = Utc::now();
        service.create(new_user("admin@example.com"), now).await.unwrap();

        let err = service.create(new_user("admin@example.com"), now).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
