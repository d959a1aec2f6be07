use serde::{Deserialize, Serialize};

/// Presence flag stored on each user document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Online,
    Offline,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Online => "online",
            UserStatus::Offline => "offline",
        }
    }
}

/// User document kept in the `users` collection, keyed by the identity-provider UID.
///
/// `password` duplicates the identity provider's credential as a local bcrypt hash;
/// login compares against this copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub email: String,
    pub password: String,
    pub status: UserStatus,
    pub notifications: u64,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcm_token: Option<String>,
}

impl UserRecord {
    pub fn new(email: String, password_hash: String, created_at: String) -> Self {
        Self {
            email,
            password: password_hash,
            status: UserStatus::Offline,
            notifications: 0,
            created_at,
            fcm_token: None,
        }
    }
}

/// Account as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityUser {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub disabled: bool,
}
