use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub exchange_rate_url: String,
    pub exchange_rate_timeout_secs: u64,
    /// Base URL of the realtime document store. `None` keeps documents in process.
    pub docstore_url: Option<String>,
    pub docstore_auth: Option<String>,
}

pub const DEFAULT_EXCHANGE_RATE_URL: &str = "https://dolarapi.com/v1/dolares/oficial";

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(4000);
        let exchange_rate_url = env::var("EXCHANGE_RATE_URL")
            .unwrap_or_else(|_| DEFAULT_EXCHANGE_RATE_URL.to_string());
        let exchange_rate_timeout_secs = env::var("EXCHANGE_RATE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(5);
        let docstore_url = env::var("DOCSTORE_URL").ok().filter(|s| !s.trim().is_empty());
        let docstore_auth = env::var("DOCSTORE_AUTH").ok().filter(|s| !s.trim().is_empty());
        Ok(Self {
            port,
            database_url,
            host,
            exchange_rate_url,
            exchange_rate_timeout_secs,
            docstore_url,
            docstore_auth,
        })
    }
}
