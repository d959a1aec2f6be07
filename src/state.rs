use crate::config::{Backend, Config};
use crate::firebase::{FirebaseAuth, FirebaseMessaging, Firestore, GoogleCredentials, ServiceAccount};
use crate::models::USERS_COLLECTION;
use crate::services::{DocumentStore, IdentityService, MemoryIdentity, MemoryPush, MemoryStore, PushDispatch};
use crate::utils::AppError;
use std::sync::Arc;

/// External collaborators shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityService>,
    pub store: Arc<dyn DocumentStore>,
    pub push: Arc<dyn PushDispatch>,
    /// bcrypt cost used when hashing the local password copy
    pub password_cost: u32,
}

impl AppState {
    pub fn new(
        identity: Arc<dyn IdentityService>,
        store: Arc<dyn DocumentStore>,
        push: Arc<dyn PushDispatch>,
        password_cost: u32,
    ) -> Self {
        Self { identity, store, push, password_cost }
    }

    pub fn in_memory(token_secret: &str, password_cost: u32) -> Self {
        Self::new(
            Arc::new(MemoryIdentity::new(token_secret)),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryPush::new()),
            password_cost,
        )
    }
}

impl AppState {
    /// Wires the collaborators selected by `config.backend`.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        match config.backend {
            Backend::Memory => {
                log::warn!("⚠️  Using in-memory backends; data is lost on restart");
                Ok(Self::in_memory(&config.dev_token_secret, config.password_cost))
            }
            Backend::Firebase => {
                let account = ServiceAccount::from_file(&config.credentials_path)?;
                log::info!("🔥 Firebase project: {}", account.project_id);

                let http = reqwest::Client::builder().build()?;
                let credentials = Arc::new(GoogleCredentials::new(account, http));

                Ok(Self::new(
                    Arc::new(FirebaseAuth::new(credentials.clone())),
                    Arc::new(Firestore::new(credentials.clone())),
                    Arc::new(FirebaseMessaging::new(credentials)),
                    config.password_cost,
                ))
            }
        }
    }

    /// Reads a probe document; only reachability matters, not whether it exists.
    pub async fn probe_store(&self) -> Result<(), AppError> {
        self.store.get(USERS_COLLECTION, "connection_check").await.map(|_| ())
    }

    pub async fn check_store_connection(&self) {
        match self.probe_store().await {
            Ok(()) => log::info!("✅ Document store is connected"),
            Err(e) => log::error!("❌ Error connecting to document store: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_from_config() {
        let config = Config::from_lookup(|key| match key {
            "CHAT_BACKEND" => Some("memory".to_string()),
            "PASSWORD_HASH_COST" => Some("4".to_string()),
            _ => None,
        })
        .unwrap();

        let state = AppState::from_config(&config).unwrap();
        assert_eq!(state.password_cost, 4);
        state.check_store_connection().await;
    }

    #[test]
    fn test_firebase_backend_requires_credentials() {
        let config = Config::from_lookup(|key| match key {
            "GOOGLE_APPLICATION_CREDENTIALS" => Some("/nonexistent/key.json".to_string()),
            _ => None,
        })
        .unwrap();

        assert!(AppState::from_config(&config).is_err());
    }
}
