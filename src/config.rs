// Lifeboard/backend-api/src/config.rs
use std::env;
use std::fmt;

const DEFAULT_FRONTEND_URL_PROD: &str = "https://lifeboard.app";
const DEFAULT_FRONTEND_URL_DEV: &str = "http://localhost:3000";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url_prod: String,
    pub frontend_url_dev: String,
    pub db_pool_size: u32,
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => {
                write!(f, "{} must be set in environment variables or .env file", key)
            }
            ConfigError::Invalid { key, value } => {
                write!(f, "{} has an invalid value: '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(AppConfig {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            frontend_url_prod: lookup("FRONTEND_URL_PROD")
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL_PROD.to_string()),
            frontend_url_dev: lookup("FRONTEND_URL_DEV")
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL_DEV.to_string()),
            db_pool_size: parse_or(&lookup, "DB_POOL_SIZE", 10)?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/lb")]))
                .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_pool_size, 10);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.frontend_url_dev, DEFAULT_FRONTEND_URL_DEV);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let result = AppConfig::from_lookup(lookup_from(&[("PORT", "9000")]));
        assert_eq!(result, Err(ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn malformed_port_is_reported_not_panicked() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/lb"),
            ("PORT", "eighty"),
        ]));
        assert_eq!(
            result,
            Err(ConfigError::Invalid {
                key: "PORT",
                value: "eighty".to_string()
            })
        );
    }
}
