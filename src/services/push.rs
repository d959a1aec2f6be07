use crate::utils::AppError;
use async_trait::async_trait;
use serde::Serialize;
#[cfg(test)]
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
}

/// Delivers notifications to devices identified by opaque tokens.
#[async_trait]
pub trait PushDispatch: Send + Sync + 'static {
    async fn send(&self, notification: &PushNotification, token: &str) -> Result<(), AppError>;
}

/// Logs every dispatch instead of delivering it. Test builds also record them.
#[derive(Default)]
pub struct MemoryPush {
    #[cfg(test)]
    sent: Mutex<Vec<(String, PushNotification)>>,
}

impl MemoryPush {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn sent(&self) -> Vec<(String, PushNotification)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl PushDispatch for MemoryPush {
    async fn send(&self, notification: &PushNotification, token: &str) -> Result<(), AppError> {
        log::info!("🔔 Push to {}: {} - {}", token, notification.title, notification.body);
        #[cfg(test)]
        self.sent.lock().await.push((token.to_string(), notification.clone()));
        Ok(())
    }
}
