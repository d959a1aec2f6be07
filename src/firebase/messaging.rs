use super::{google_error_message, GoogleCredentials};
use crate::services::push::{PushDispatch, PushNotification};
use crate::utils::AppError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

const FCM_API_BASE: &str = "https://fcm.googleapis.com/v1";

/// Firebase Cloud Messaging HTTP v1.
pub struct FirebaseMessaging {
    credentials: Arc<GoogleCredentials>,
}

impl FirebaseMessaging {
    pub fn new(credentials: Arc<GoogleCredentials>) -> Self {
        Self { credentials }
    }
}

pub fn message_body(notification: &PushNotification, token: &str) -> Value {
    json!({
        "message": {
            "token": token,
            "notification": notification,
        }
    })
}

#[async_trait]
impl PushDispatch for FirebaseMessaging {
    async fn send(&self, notification: &PushNotification, token: &str) -> Result<(), AppError> {
        let url = format!("{}/projects/{}/messages:send", FCM_API_BASE, self.credentials.project_id());
        let access_token = self.credentials.access_token().await?;

        let response = self
            .credentials
            .http()
            .post(&url)
            .bearer_auth(access_token)
            .json(&message_body(notification, token))
            .send()
            .await
            .map_err(|e| AppError::Push(format!("FCM request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Push(google_error_message(status, &body)));
        }

        log::debug!("📨 Push delivered to FCM: {}", notification.title);
        Ok(())
    }
}
