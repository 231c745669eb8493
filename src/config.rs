use std::env;
use std::fmt::Display;
use std::str::FromStr;

use tracing::info;

/// Runtime configuration, read once at startup and carried in shared state.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_path: String,
    pub jwt_secret: String,
    pub frontend_url: String,
    pub rag_base_url: String,
    pub rag_health_timeout_secs: u64,
    pub rag_chat_timeout_secs: u64,
    pub rate_limit_per_sec: u64,
}

impl AppConfig {
    pub fn load() -> Self {
        Self {
            port: try_load("PORT", "5000"),
            database_path: try_load("DATABASE_PATH", "saarthi.db"),
            jwt_secret: env::var("JWT_SECRET")
                .expect("JWT_SECRET must be set in environment for production!"),
            frontend_url: try_load("FRONTEND_URL", "http://localhost:3000"),
            rag_base_url: try_load("RAG_SERVICE_URL", "http://localhost:5001"),
            rag_health_timeout_secs: try_load("RAG_HEALTH_TIMEOUT_SECS", "5"),
            rag_chat_timeout_secs: try_load("RAG_CHAT_TIMEOUT_SECS", "15"),
            rate_limit_per_sec: try_load("RATE_LIMIT_PER_SEC", "5"),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .unwrap_or_else(|e| panic!("Invalid {key} value {raw:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_load_falls_back_to_default() {
        let port: u16 = try_load("SAARTHI_TEST_UNSET_PORT", "5000");
        assert_eq!(port, 5000);
    }
}
