use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub web: WebConfig,
    pub db: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    pub address: String,
    pub debug_address: String,
    pub request_timeout_secs: u64,
    pub shutdown_timeout_secs: u64,
}

impl WebConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Postgres,
    Memory,
}

#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub disable_tls: bool,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

// 启动时会打印配置，密码不能出现在日志里
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("disable_tls", &self.disable_tls)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub private_key_file: PathBuf,
    pub public_key_file: PathBuf,
    pub key_id: String,
    pub algorithm: String,
    pub token_ttl_secs: i64,
}

impl AuthConfig {
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.token_ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Loads defaults, then `<dir>/default.*` if present, then `SALES__*`
    /// environment variables. The directory falls back to `CONFIG_PATH`, then
    /// `config`.
    pub fn load(dir: Option<&Path>) -> Result<Self, AppError> {
        let config_path = match dir {
            Some(dir) => dir.to_path_buf(),
            None => PathBuf::from(env::var("CONFIG_PATH").unwrap_or_else(|_| "config".to_string())),
        };

        let builder = Self::defaults_builder()?
            .add_source(config::File::from(config_path.join("default")).required(false))
            .add_source(
                config::Environment::with_prefix("SALES")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Config = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Built-in defaults only, with no file or environment overrides.
    pub fn defaults() -> Result<Self, AppError> {
        let config: Config = Self::defaults_builder()?.build()?.try_deserialize()?;
        Ok(config)
    }

    fn defaults_builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, AppError> {
        let builder = config::Config::builder()
            .set_default("web.address", "0.0.0.0:8000")?
            .set_default("web.debug_address", "127.0.0.1:6060")?
            .set_default("web.request_timeout_secs", 5)?
            .set_default("web.shutdown_timeout_secs", 5)?
            .set_default("db.backend", "postgres")?
            .set_default("db.user", "postgres")?
            .set_default("db.password", "postgres")?
            .set_default("db.host", "localhost")?
            .set_default("db.port", 5432)?
            .set_default("db.name", "postgres")?
            .set_default("db.disable_tls", false)?
            .set_default("db.max_connections", 10)?
            .set_default("db.acquire_timeout_secs", 3)?
            .set_default("auth.private_key_file", "private.pem")?
            .set_default("auth.public_key_file", "public.pem")?
            .set_default("auth.key_id", "1")?
            .set_default("auth.algorithm", "RS256")?
            .set_default("auth.token_ttl_secs", 3600)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?;

        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_deserialize() {
        let config = Config::defaults().unwrap();

        assert_eq!(config.web.address, "0.0.0.0:8000");
        assert_eq!(config.web.shutdown_timeout(), Duration::from_secs(5));
        assert_eq!(config.db.backend, DatabaseBackend::Postgres);
        assert_eq!(config.auth.algorithm, "RS256");
        assert_eq!(config.auth.token_ttl(), chrono::Duration::hours(1));
    }

    #[test]
    fn debug_output_hides_database_password() {
        let config = Config::defaults().unwrap();
        let printed = format!("{:?}", config.db);

        assert!(printed.contains("[REDACTED]"));
        assert!(!printed.contains("password: \"postgres\""));
    }

    #[test]
    fn shipped_file_overrides_defaults() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("config");
        let config = Config::load(Some(&dir)).unwrap();

        assert_eq!(config.web.shutdown_timeout(), Duration::from_secs(20));
        assert!(config.db.disable_tls);
        assert_eq!(config.auth.private_key_file, PathBuf::from("keys/private.pem"));
    }
}
