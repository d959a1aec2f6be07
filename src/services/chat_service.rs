use crate::models::{IdentityUser, MessageRecord, UserRecord, UserStatus, MESSAGES_COLLECTION, USERS_COLLECTION};
use crate::services::document_store::{FieldFilter, Fields, Query};
use crate::services::push::PushNotification;
use crate::state::AppState;
use crate::utils::AppError;
use bcrypt::BcryptError;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NOTIFICATION_TITLE: &str = "New Message";

// Request/Response structures
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CredentialsRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LogoutRequest {
    pub uid: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub sender_uid: Option<String>,
    pub receiver_uid: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ConversationQuery {
    pub user1_uid: Option<String>,
    pub user2_uid: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub user_record: IdentityUser,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessagesResponse {
    /// Stored message documents, fields as written
    #[schema(value_type = Vec<Object>)]
    pub messages: Vec<Value>,
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, AppError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("{} is required", field))),
    }
}

fn to_fields<T: Serialize>(value: &T) -> Result<Fields, AppError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(AppError::Internal("Record did not serialize to an object".to_string())),
        Err(e) => Err(AppError::Internal(format!("Failed to serialize record: {}", e))),
    }
}

/// Current time as ISO-8601 UTC with millisecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(AppError::from)
}

async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let hash = hash.to_string();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?;

    match verified {
        Ok(matches) => Ok(matches),
        // A stored value that is not a bcrypt hash never matches
        Err(
            BcryptError::InvalidHash(_)
            | BcryptError::InvalidPrefix(_)
            | BcryptError::InvalidCost(_)
            | BcryptError::InvalidBase64(_),
        ) => Ok(false),
        Err(e) => Err(AppError::Internal(format!("Password verification error: {}", e))),
    }
}

// User registration
pub async fn register(state: &AppState, request: &CredentialsRequest) -> Result<RegisterResponse, AppError> {
    let email = required(&request.email, "email")?;
    let password = required(&request.password, "password")?;

    let user = state.identity.create_user(email, password).await?;

    let hashed_password = hash_password(password, state.password_cost).await?;
    let record = UserRecord::new(user.email.clone(), hashed_password, now_timestamp());

    // No rollback: a failure here leaves the identity account without a user document
    state
        .store
        .set(USERS_COLLECTION, &user.uid, to_fields(&record)?)
        .await?;

    Ok(RegisterResponse {
        message: "User registered successfully!".to_string(),
        user_record: user,
    })
}

// User login
pub async fn login(state: &AppState, request: &CredentialsRequest) -> Result<LoginResponse, AppError> {
    let email = required(&request.email, "email")?;
    let password = required(&request.password, "password")?;

    let user = state.identity.get_user_by_email(email).await?;

    let user_doc = state
        .store
        .get(USERS_COLLECTION, &user.uid)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let stored_hash = user_doc
        .fields
        .get("password")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Validation("Stored password hash is missing".to_string()))?;

    if !verify_password(password, stored_hash).await? {
        return Err(AppError::Auth("Invalid login details".to_string()));
    }

    let token = state.identity.create_custom_token(&user.uid).await?;

    Ok(LoginResponse {
        message: "Login successful!".to_string(),
        token,
    })
}

/// Marks the user offline. The caller's ownership of `uid` is not checked.
pub async fn logout(state: &AppState, request: &LogoutRequest) -> Result<MessageResponse, AppError> {
    let uid = required(&request.uid, "uid")?;

    let mut fields = Fields::new();
    fields.insert("status".to_string(), Value::from(UserStatus::Offline.as_str()));
    state.store.update(USERS_COLLECTION, uid, fields).await?;

    Ok(MessageResponse {
        message: "User logged out and status updated to offline".to_string(),
    })
}

pub async fn send_message(state: &AppState, request: &SendMessageRequest) -> Result<MessageResponse, AppError> {
    let sender_uid = required(&request.sender_uid, "senderUid")?;
    let receiver_uid = required(&request.receiver_uid, "receiverUid")?;
    let text = required(&request.message, "message")?;

    let record = MessageRecord {
        sender_uid: sender_uid.to_string(),
        receiver_uid: receiver_uid.to_string(),
        message: text.to_string(),
        timestamp: now_timestamp(),
    };
    state.store.add(MESSAGES_COLLECTION, to_fields(&record)?).await?;

    let receiver = match state.store.get(USERS_COLLECTION, receiver_uid).await? {
        Some(doc) => doc,
        None => {
            log::debug!("Receiver {} has no user document, skipping notification", receiver_uid);
            return Ok(MessageResponse { message: "Message sent successfully!".to_string() });
        }
    };

    let push_token = receiver
        .fields
        .get("fcmToken")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty());

    if let Some(token) = push_token {
        let notification = PushNotification {
            title: NOTIFICATION_TITLE.to_string(),
            body: text.to_string(),
        };
        if let Err(e) = state.push.send(&notification, token).await {
            log::warn!("⚠️ Push notification to {} failed: {}", receiver_uid, e);
        }
    }

    state
        .store
        .increment(USERS_COLLECTION, receiver_uid, "notifications", 1)
        .await?;

    Ok(MessageResponse {
        message: "Message sent successfully!".to_string(),
    })
}

/// Messages whose sender and receiver are both drawn from `{user1, user2}`, oldest first.
///
/// Same-user pairs (user1 -> user1) match too. Documents are returned as stored.
pub async fn get_messages(state: &AppState, query: &ConversationQuery) -> Result<MessagesResponse, AppError> {
    let (user1, user2) = match (query.user1_uid.as_deref(), query.user2_uid.as_deref()) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => (a, b),
        _ => return Err(AppError::MissingParameters("Missing required parameters".to_string())),
    };

    let mut participants = vec![Value::from(user1)];
    if user2 != user1 {
        participants.push(Value::from(user2));
    }

    let conversation = Query::collection(MESSAGES_COLLECTION)
        .filter(FieldFilter::field_in("senderUid", participants.clone()))
        .filter(FieldFilter::field_in("receiverUid", participants))
        .order_by("timestamp");

    let messages = state
        .store
        .query(&conversation)
        .await?
        .into_iter()
        .map(|doc| Value::Object(doc.fields))
        .collect();

    Ok(MessagesResponse { messages })
}

/// Every user document with its id, password hash included.
pub async fn list_users(state: &AppState) -> Result<Vec<Value>, AppError> {
    let users = state.store.list(USERS_COLLECTION).await.map_err(|e| {
        log::error!("❌ Error fetching users: {}", e);
        AppError::Internal("Error fetching users".to_string())
    })?;

    if users.is_empty() {
        return Err(AppError::NotFound("No users found".to_string()));
    }

    Ok(users.into_iter().map(|doc| doc.into_json_with_id()).collect())
}
