use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::domain::models::user::Role;
use crate::error::AppError;

/// Identity carried by a signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,        // Subject (user ID)
    pub roles: Vec<String>, // Role names, e.g. "ADMIN"
    pub iat: i64,           // Issued at (unix seconds)
    pub exp: i64,           // Expiration time (unix seconds)
}

impl Claims {
    pub fn new(subject: impl Into<String>, roles: Vec<String>, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: subject.into(),
            roles,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|held| held == role.as_str())
    }
}

/// Resolves the public key that verifies tokens signed under `kid`.
pub trait KeyLookup: Send + Sync {
    fn public_key(&self, kid: &str) -> Option<&DecodingKey>;
}

/// Lookup over a fixed set of keys, typically the single configured key pair.
#[derive(Clone, Default)]
pub struct StaticKeyLookup {
    keys: HashMap<String, DecodingKey>,
}

impl StaticKeyLookup {
    pub fn new(kid: impl Into<String>, key: DecodingKey) -> Self {
        let mut keys = HashMap::new();
        keys.insert(kid.into(), key);
        Self { keys }
    }

    pub fn with_key(mut self, kid: impl Into<String>, key: DecodingKey) -> Self {
        self.keys.insert(kid.into(), key);
        self
    }
}

impl KeyLookup for StaticKeyLookup {
    fn public_key(&self, kid: &str) -> Option<&DecodingKey> {
        self.keys.get(kid)
    }
}

/// Issues and verifies RSA-signed tokens.
#[derive(Clone)]
pub struct Authenticator {
    signing_key: EncodingKey,
    key_id: String,
    algorithm: Algorithm,
    keys: Arc<dyn KeyLookup>,
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    pub fn new(
        signing_key: EncodingKey,
        key_id: impl Into<String>,
        algorithm: Algorithm,
        keys: Arc<dyn KeyLookup>,
    ) -> Result<Self, AppError> {
        if !is_rsa(algorithm) {
            return Err(AppError::Internal(format!(
                "unsupported token algorithm {algorithm:?}, expected an RSA algorithm"
            )));
        }

        let key_id = key_id.into();
        if key_id.is_empty() {
            return Err(AppError::Internal("token key id must not be empty".to_string()));
        }

        Ok(Self {
            signing_key,
            key_id,
            algorithm,
            keys,
        })
    }

    /// Builds an authenticator from PEM-encoded key material.
    pub fn from_pem(
        private_pem: &[u8],
        public_pem: &[u8],
        key_id: &str,
        algorithm: &str,
    ) -> Result<Self, AppError> {
        let algorithm = Algorithm::from_str(algorithm)?;
        let signing_key = EncodingKey::from_rsa_pem(private_pem)?;
        let public_key = DecodingKey::from_rsa_pem(public_pem)?;
        let keys = Arc::new(StaticKeyLookup::new(key_id, public_key));

        Self::new(signing_key, key_id, algorithm, keys)
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, AppError> {
        tracing::info!(
            private_key = %config.private_key_file.display(),
            key_id = %config.key_id,
            algorithm = %config.algorithm,
            "Loading token signing keys"
        );

        let private_pem = fs::read(&config.private_key_file)?;
        let public_pem = fs::read(&config.public_key_file)?;

        Self::from_pem(&private_pem, &public_pem, &config.key_id, &config.algorithm)
    }

    pub fn issue_token(&self, claims: &Claims) -> Result<String, AppError> {
        let mut header = Header::new(self.algorithm);
        header.kid = Some(self.key_id.clone());

        let token = encode(&header, claims, &self.signing_key)?;
        Ok(token)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        let header = decode_header(token)
            .map_err(|e| AppError::Unauthenticated(format!("Invalid token: {}", e)))?;

        let kid = header
            .kid
            .ok_or_else(|| AppError::Unauthenticated("Invalid token: missing key id".to_string()))?;

        let key = self
            .keys
            .public_key(&kid)
            .ok_or_else(|| AppError::Unauthenticated(format!("Invalid token: unknown key id {kid:?}")))?;

        let validation = Validation::new(self.algorithm);
        let token_data = decode::<Claims>(token, key, &validation)
            .map_err(|e| AppError::Unauthenticated(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

fn is_rsa(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVATE_PEM: &[u8] = include_bytes!("../../../tests/fixtures/private.pem");
    const PUBLIC_PEM: &[u8] = include_bytes!("../../../tests/fixtures/public.pem");

    fn authenticator(kid: &str) -> Authenticator {
        Authenticator::from_pem(PRIVATE_PEM, PUBLIC_PEM, kid, "RS256").unwrap()
    }

    fn claims(now: DateTime<Utc>) -> Claims {
        Claims::new("user-1", vec![Role::User.to_string()], now, Duration::hours(1))
    }

    #[test]
    fn issued_token_verifies_back_to_claims() {
        let auth = authenticator("1");
        let claims = claims(Utc::now());

        let token = auth.issue_token(&claims).unwrap();
        let header = decode_header(&token).unwrap();

        assert_eq!(header.kid.as_deref(), Some("1"));
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(auth.verify_token(&token).unwrap(), claims);
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = authenticator("1");
        let issued = Utc::now() - Duration::hours(3);
        let token = auth.issue_token(&claims(issued)).unwrap();

        assert!(matches!(auth.verify_token(&token), Err(AppError::Unauthenticated(_))));
    }

    #[test]
    fn unknown_key_id_is_rejected() {
        let token = authenticator("old-key").issue_token(&claims(Utc::now())).unwrap();

        assert!(matches!(
            authenticator("1").verify_token(&token),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let auth = authenticator("1");
        let token = auth.issue_token(&claims(Utc::now())).unwrap();

        let forged = Claims::new("user-1", vec![Role::Admin.to_string()], Utc::now(), Duration::hours(1));
        let forged_payload = auth.issue_token(&forged).unwrap();

        // Graft the admin payload onto the first token's signature.
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged_payload.split('.').collect();
        parts[1] = forged_parts[1];
        let tampered = parts.join(".");

        assert!(matches!(auth.verify_token(&tampered), Err(AppError::Unauthenticated(_))));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            authenticator("1").verify_token("not-a-token"),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn non_rsa_algorithm_is_refused() {
        let err = Authenticator::from_pem(PRIVATE_PEM, PUBLIC_PEM, "1", "HS256").unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn role_membership() {
        let claims = claims(Utc::now());

        assert!(claims.has_role(Role::User));
        assert!(!claims.has_role(Role::Admin));
    }
}
