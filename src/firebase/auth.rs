use super::{google_error_message, GoogleCredentials};
use crate::models::IdentityUser;
use crate::services::identity::{IdentityService, EMAIL_EXISTS, INVALID_EMAIL, USER_NOT_FOUND, WEAK_PASSWORD};
use crate::utils::AppError;
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::encode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

const IDENTITY_TOOLKIT_BASE: &str = "https://identitytoolkit.googleapis.com/v1";
const CUSTOM_TOKEN_AUDIENCE: &str =
    "https://identitytoolkit.googleapis.com/google.identity.identitytoolkit.v1.IdentityToolkit";
const CUSTOM_TOKEN_TTL_SECS: usize = 3600;

// Custom token claims understood by the Firebase client SDKs
#[derive(Debug, Serialize, Deserialize)]
pub struct CustomTokenClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: usize,
    pub exp: usize,
    pub uid: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    disabled: bool,
}

impl From<AccountInfo> for IdentityUser {
    fn from(info: AccountInfo) -> Self {
        IdentityUser {
            uid: info.local_id,
            email: info.email,
            email_verified: info.email_verified,
            disabled: info.disabled,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

/// Maps Identity Toolkit error codes (`EMAIL_EXISTS`, `WEAK_PASSWORD : ...`) to readable text.
pub fn describe_identity_error(code: &str) -> String {
    let head = code.split(':').next().unwrap_or(code).trim();
    match head {
        "EMAIL_EXISTS" | "DUPLICATE_EMAIL" => EMAIL_EXISTS.to_string(),
        "INVALID_EMAIL" => INVALID_EMAIL.to_string(),
        "WEAK_PASSWORD" | "INVALID_PASSWORD" => WEAK_PASSWORD.to_string(),
        "USER_NOT_FOUND" | "EMAIL_NOT_FOUND" => USER_NOT_FOUND.to_string(),
        _ => code.to_string(),
    }
}

/// Firebase Authentication through the Identity Toolkit admin REST API.
pub struct FirebaseAuth {
    credentials: Arc<GoogleCredentials>,
}

impl FirebaseAuth {
    pub fn new(credentials: Arc<GoogleCredentials>) -> Self {
        Self { credentials }
    }

    fn url(&self, action: &str) -> String {
        format!(
            "{}/projects/{}/{}",
            IDENTITY_TOOLKIT_BASE,
            self.credentials.project_id(),
            action
        )
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        action: &str,
        body: serde_json::Value,
    ) -> Result<T, AppError> {
        let token = self.credentials.access_token().await?;
        let response = self
            .credentials
            .http()
            .post(self.url(action))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Identity(format!("Identity request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Identity(describe_identity_error(&google_error_message(status, &text))));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Identity(format!("Failed to parse identity response: {}", e)))
    }

    pub fn custom_token_claims(&self, uid: &str) -> CustomTokenClaims {
        let iat = Utc::now().timestamp() as usize;
        let account = self.credentials.account();
        CustomTokenClaims {
            iss: account.client_email.clone(),
            sub: account.client_email.clone(),
            aud: CUSTOM_TOKEN_AUDIENCE.to_string(),
            iat,
            exp: iat + CUSTOM_TOKEN_TTL_SECS,
            uid: uid.to_string(),
        }
    }
}

#[async_trait]
impl IdentityService for FirebaseAuth {
    async fn create_user(&self, email: &str, password: &str) -> Result<IdentityUser, AppError> {
        log::debug!("👤 Creating identity account for {}", email);
        let created: AccountInfo = self
            .call("accounts", json!({ "email": email, "password": password }))
            .await?;

        // The signUp response omits verification flags; new accounts start unverified and enabled
        Ok(IdentityUser {
            uid: created.local_id,
            email: if created.email.is_empty() { email.to_string() } else { created.email },
            email_verified: false,
            disabled: false,
        })
    }

    async fn get_user_by_email(&self, email: &str) -> Result<IdentityUser, AppError> {
        let lookup: LookupResponse = self
            .call("accounts:lookup", json!({ "email": [email] }))
            .await?;

        lookup
            .users
            .into_iter()
            .next()
            .map(IdentityUser::from)
            .ok_or_else(|| AppError::Identity(USER_NOT_FOUND.to_string()))
    }

    async fn create_custom_token(&self, uid: &str) -> Result<String, AppError> {
        let account = self.credentials.account();
        Ok(encode(
            &account.signing_header(),
            &self.custom_token_claims(uid),
            &account.encoding_key()?,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firebase::ServiceAccount;

    #[test]
    fn test_describe_identity_error() {
        assert_eq!(describe_identity_error("EMAIL_EXISTS"), EMAIL_EXISTS);
        assert_eq!(
            describe_identity_error("WEAK_PASSWORD : Password should be at least 6 characters"),
            WEAK_PASSWORD
        );
        assert_eq!(describe_identity_error("USER_NOT_FOUND"), USER_NOT_FOUND);
        assert_eq!(describe_identity_error("QUOTA_EXCEEDED"), "QUOTA_EXCEEDED");
    }

    #[test]
    fn test_custom_token_claims() {
        let account = ServiceAccount::from_json(
            r#"{"project_id":"chat-demo","private_key":"unused","client_email":"relay@chat-demo.iam.gserviceaccount.com"}"#,
        )
        .unwrap();
        let auth = FirebaseAuth::new(Arc::new(GoogleCredentials::new(account, reqwest::Client::new())));

        let claims = auth.custom_token_claims("uid-7");
        assert_eq!(claims.uid, "uid-7");
        assert_eq!(claims.iss, claims.sub);
        assert_eq!(claims.aud, CUSTOM_TOKEN_AUDIENCE);
        assert_eq!(claims.exp - claims.iat, CUSTOM_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_lookup_response_maps_to_identity_user() {
        let lookup: LookupResponse = serde_json::from_str(
            r#"{"users":[{"localId":"uid-1","email":"ana@example.com","emailVerified":true}]}"#,
        )
        .unwrap();
        let user: IdentityUser = lookup.users.into_iter().next().unwrap().into();
        assert_eq!(user.uid, "uid-1");
        assert!(user.email_verified);
        assert!(!user.disabled);
    }
}
