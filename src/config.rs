use std::env;

/// Which set of external collaborators the router is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Firebase,
    Memory,
}

impl Backend {
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_lowercase().as_str() {
            "firebase" => Ok(Backend::Firebase),
            "memory" => Ok(Backend::Memory),
            other => Err(format!("Invalid CHAT_BACKEND: {}. Supported: firebase, memory", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backend: Backend,
    pub credentials_path: String,
    /// Realtime-database URL; configured but not used by any endpoint
    pub database_url: Option<String>,
    pub password_cost: u32,
    pub dev_token_secret: String,
    /// Empty means any origin
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = get("PORT", "4000");
        let port = port
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT '{}': {}", port, e))?;

        let cost = get("PASSWORD_HASH_COST", "10");
        let password_cost = cost
            .parse::<u32>()
            .map_err(|e| format!("Invalid PASSWORD_HASH_COST '{}': {}", cost, e))?;
        if !(4..=31).contains(&password_cost) {
            return Err(format!("PASSWORD_HASH_COST must be between 4 and 31, got {}", password_cost));
        }

        let allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host: get("HOST", "0.0.0.0"),
            port,
            backend: Backend::parse(&get("CHAT_BACKEND", "firebase"))?,
            credentials_path: get("GOOGLE_APPLICATION_CREDENTIALS", "serviceAccountKey.json"),
            database_url: lookup("FIREBASE_DATABASE_URL").filter(|url| !url.is_empty()),
            password_cost,
            dev_token_secret: get("DEV_TOKEN_SECRET", "dev-secret-change-me"),
            allowed_origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.backend, Backend::Firebase);
        assert_eq!(config.password_cost, 10);
        assert_eq!(config.credentials_path, "serviceAccountKey.json");
        assert!(config.database_url.is_none());
        assert!(config.allowed_origins.is_empty());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("CHAT_BACKEND", "Memory"),
            ("PORT", "8080"),
            ("CORS_ALLOWED_ORIGINS", "http://localhost:3000, http://127.0.0.1:3000,"),
            ("FIREBASE_DATABASE_URL", "https://chat-demo-default-rtdb.firebaseio.com/"),
        ])
        .unwrap();
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.port, 8080);
        assert_eq!(config.allowed_origins, vec!["http://localhost:3000", "http://127.0.0.1:3000"]);
        assert!(config.database_url.is_some());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(config_from(&[("PORT", "http")]).is_err());
        assert!(config_from(&[("CHAT_BACKEND", "mongo")]).is_err());
        assert!(config_from(&[("PASSWORD_HASH_COST", "3")]).is_err());
    }
}
