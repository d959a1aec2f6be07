use crate::models::IdentityUser;
use crate::utils::AppError;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

pub const EMAIL_EXISTS: &str = "The email address is already in use by another account.";
pub const INVALID_EMAIL: &str = "The email address is improperly formatted.";
pub const WEAK_PASSWORD: &str = "The password must be a string with at least 6 characters.";
pub const USER_NOT_FOUND: &str = "There is no user record corresponding to the provided identifier.";

pub const MIN_PASSWORD_LEN: usize = 6;

/// External system of record for accounts and token issuance.
#[async_trait]
pub trait IdentityService: Send + Sync + 'static {
    async fn create_user(&self, email: &str, password: &str) -> Result<IdentityUser, AppError>;
    async fn get_user_by_email(&self, email: &str) -> Result<IdentityUser, AppError>;
    async fn create_custom_token(&self, uid: &str) -> Result<String, AppError>;
}

// Custom token claims for the in-memory provider
#[derive(Debug, Serialize, Deserialize)]
pub struct DevTokenClaims {
    pub sub: String,
    pub uid: String,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
}

/// In-process identity provider with the same rejection rules as the hosted one.
pub struct MemoryIdentity {
    users: RwLock<HashMap<String, IdentityUser>>,
    token_secret: String,
}

impl MemoryIdentity {
    pub fn new(token_secret: impl Into<String>) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            token_secret: token_secret.into(),
        }
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

#[async_trait]
impl IdentityService for MemoryIdentity {
    async fn create_user(&self, email: &str, password: &str) -> Result<IdentityUser, AppError> {
        if !looks_like_email(email) {
            return Err(AppError::Identity(INVALID_EMAIL.to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Identity(WEAK_PASSWORD.to_string()));
        }

        let key = email.to_lowercase();
        let mut users = self.users.write().await;
        if users.contains_key(&key) {
            return Err(AppError::Identity(EMAIL_EXISTS.to_string()));
        }

        let user = IdentityUser {
            uid: uuid::Uuid::new_v4().simple().to_string(),
            email: key.clone(),
            email_verified: false,
            disabled: false,
        };
        users.insert(key, user.clone());
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<IdentityUser, AppError> {
        self.users
            .read()
            .await
            .get(&email.to_lowercase())
            .cloned()
            .ok_or_else(|| AppError::Identity(USER_NOT_FOUND.to_string()))
    }

    async fn create_custom_token(&self, uid: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = DevTokenClaims {
            sub: uid.to_string(),
            uid: uid.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + Duration::hours(1)).timestamp() as usize,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.token_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let identity = MemoryIdentity::new("secret");
        identity.create_user("ana@example.com", "hunter22").await.unwrap();

        let err = identity.create_user("Ana@Example.com", "hunter22").await.unwrap_err();
        assert_eq!(err, AppError::Identity(EMAIL_EXISTS.to_string()));
    }

    #[tokio::test]
    async fn test_weak_password_and_bad_email_rejected() {
        let identity = MemoryIdentity::new("secret");
        assert_eq!(
            identity.create_user("ana@example.com", "123").await.unwrap_err(),
            AppError::Identity(WEAK_PASSWORD.to_string())
        );
        assert_eq!(
            identity.create_user("not-an-email", "hunter22").await.unwrap_err(),
            AppError::Identity(INVALID_EMAIL.to_string())
        );
    }

    #[tokio::test]
    async fn test_lookup_by_email() {
        let identity = MemoryIdentity::new("secret");
        let created = identity.create_user("ana@example.com", "hunter22").await.unwrap();

        assert_eq!(identity.get_user_by_email("ana@example.com").await.unwrap(), created);
        assert!(identity.get_user_by_email("bob@example.com").await.is_err());
    }

    #[tokio::test]
    async fn test_custom_token_carries_uid() {
        let identity = MemoryIdentity::new("secret");
        let token = identity.create_custom_token("uid-1").await.unwrap();

        let claims = decode::<DevTokenClaims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::default(),
        )
        .unwrap()
        .claims;
        assert_eq!(claims.uid, "uid-1");
    }
}
