use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Credentials for the admin account created on first start.
#[derive(Clone, Debug)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub db_max_connections: u32,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub cors_origins: Vec<String>,
    pub log_dir: PathBuf,
    pub log_level: tracing::Level,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Config {
    /// Defaults for everything optional. `from_env` starts from here.
    pub fn new(server_addr: &str, database_url: &str, jwt_secret: &str) -> Self {
        Self {
            server_addr: server_addr.to_string(),
            database_url: database_url.to_string(),
            jwt_secret: jwt_secret.to_string(),
            access_token_ttl: 3600, // 1 hour
            db_max_connections: 10,
            rate_login_per_min: 60,
            rate_protected_per_min: 1000,
            api_prefix: "/api".to_string(),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 5 * 1024 * 1024,
            cors_origins: parse_origins("http://localhost:3000,http://localhost:5173"),
            log_dir: PathBuf::from("logs"),
            log_level: tracing::Level::INFO,
            bootstrap_admin: None,
        }
    }

    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let mut config = Self::new(
            &required("SERVER_ADDR")?,
            &required("DATABASE_URL")?,
            &required("JWT_SECRET")?,
        );

        config.access_token_ttl = parsed("ACCESS_TOKEN_TTL", config.access_token_ttl)?;
        config.db_max_connections = parsed("DB_MAX_CONNECTIONS", config.db_max_connections)?;
        config.rate_login_per_min = parsed("RATE_LOGIN_PER_MIN", config.rate_login_per_min)?;
        config.rate_protected_per_min =
            parsed("RATE_PROTECTED_PER_MIN", config.rate_protected_per_min)?;
        config.max_upload_bytes = parsed("MAX_UPLOAD_BYTES", config.max_upload_bytes)?;
        config.log_level = parsed("LOG_LEVEL", config.log_level)?;

        if let Ok(prefix) = env::var("API_PREFIX") {
            config.api_prefix = prefix;
        }
        if let Ok(dir) = env::var("UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = env::var("LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }
        if let Ok(origins) = env::var("CORS_ORIGINS") {
            config.cors_origins = parse_origins(&origins);
        }

        config.bootstrap_admin = match (
            env::var("BOOTSTRAP_ADMIN_USERNAME"),
            env::var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Ok(username), Ok(password)) => Some(BootstrapAdmin {
                full_name: env::var("BOOTSTRAP_ADMIN_FULL_NAME")
                    .unwrap_or_else(|_| "Administrator".to_string()),
                username,
                password,
            }),
            _ => None,
        };

        Ok(config)
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("{key} has an invalid value '{raw}': {e}"))
}

/// Comma separated list, blanks dropped.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_env() {
        let config = Config::new("127.0.0.1:3001", "mysql://localhost/att", "secret");
        assert_eq!(config.access_token_ttl, 3600);
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.db_max_connections, 10);
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        assert_eq!(
            parse_origins(" http://a.test , ,http://b.test"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn bad_numbers_are_reported_with_the_key() {
        let err = parse_value::<usize>("ACCESS_TOKEN_TTL", "soon").unwrap_err();
        assert!(err.to_string().contains("ACCESS_TOKEN_TTL"));
        assert_eq!(parse_value::<u32>("RATE_LOGIN_PER_MIN", " 30 ").unwrap(), 30);
        assert_eq!(
            parse_value::<tracing::Level>("LOG_LEVEL", "debug").unwrap(),
            tracing::Level::DEBUG
        );
    }
}
