use std::env;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://taskboard.db";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8081";
const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub listen_addr: String,
    pub jwt_secret: SecretString,
    pub session_ttl: chrono::Duration,
    /// Marks the session cookie `Secure`; enable behind TLS.
    pub secure_cookies: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable `{0}` is not set")]
    MissingVar(&'static str),
    #[error("environment variable `{var}` has an invalid value `{value}`")]
    InvalidVar { var: &'static str, value: String },
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url =
            var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let jwt_secret = var("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .map(SecretString::from)
            .ok_or(ConfigError::MissingVar("JWT_SECRET"))?;

        let listen_addr = var("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());

        let session_ttl_hours = match var("SESSION_TTL_HOURS") {
            Some(value) => value
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours > 0)
                .ok_or(ConfigError::InvalidVar {
                    var: "SESSION_TTL_HOURS",
                    value,
                })?,
            None => DEFAULT_SESSION_TTL_HOURS,
        };

        let secure_cookies = match var("SECURE_COOKIES").as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(ConfigError::InvalidVar {
                    var: "SECURE_COOKIES",
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            database_url,
            listen_addr,
            jwt_secret,
            session_ttl: chrono::Duration::hours(session_ttl_hours),
            secure_cookies,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ServerConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_the_secret_is_set() {
        let config = config(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
        assert_eq!(config.session_ttl, chrono::Duration::hours(24));
        assert!(!config.secure_cookies);
        assert_eq!(config.jwt_secret.expose_secret(), "s3cret");
    }

    #[test]
    fn secret_is_required() {
        assert!(matches!(
            config(&[]),
            Err(ConfigError::MissingVar("JWT_SECRET"))
        ));
    }

    #[test]
    fn malformed_values_are_reported() {
        assert!(matches!(
            config(&[("JWT_SECRET", "x"), ("SESSION_TTL_HOURS", "soon")]),
            Err(ConfigError::InvalidVar {
                var: "SESSION_TTL_HOURS",
                ..
            })
        ));
        assert!(matches!(
            config(&[("JWT_SECRET", "x"), ("SECURE_COOKIES", "maybe")]),
            Err(ConfigError::InvalidVar {
                var: "SECURE_COOKIES",
                ..
            })
        ));
        let config = config(&[("JWT_SECRET", "x"), ("SECURE_COOKIES", "true")]).unwrap();
        assert!(config.secure_cookies);
    }
}
