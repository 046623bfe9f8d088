use std::time::Duration;

use serde::Deserialize;

const ENV_PREFIX: &str = "BLOGS";

/// Service configuration read from `BLOGS_*` environment variables.
///
/// `database_url`, `jwt_secret` and `port` have no defaults; startup fails
/// when any of them is missing.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_secs: i64,
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_secs: i64,
    #[serde(default = "default_storage_timeout")]
    pub storage_timeout_ms: u64,
    #[serde(default = "default_pool_size")]
    pub db_pool_size: u32,
}

fn default_access_ttl() -> i64 { 3600 }
fn default_refresh_ttl() -> i64 { 60 * 24 * 3600 }
fn default_storage_timeout() -> u64 { 5000 }
fn default_pool_size() -> u32 { 10 }

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_env(None)
    }

    /// Reads from `source` instead of the process environment when given.
    pub fn from_env(source: Option<config::Map<String, String>>) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(source),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        if config.jwt_secret.trim().is_empty() {
            anyhow::bail!("{ENV_PREFIX}_JWT_SECRET must not be empty");
        }
        if config.access_token_ttl_secs <= 0 || config.refresh_token_ttl_secs <= 0 {
            anyhow::bail!("token lifetimes must be positive");
        }
        Ok(config)
    }

    pub fn access_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.access_token_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.refresh_token_ttl_secs)
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }

    pub fn uses_memory_storage(&self) -> bool {
        self.database_url.starts_with("memory:")
    }
}
