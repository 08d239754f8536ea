//! Shared configuration structures.

use std::env;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Base service configuration shared by all services.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Service name for logging and tracing
    pub service_name: String,
    /// Host address to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Log filter used when RUST_LOG is unset
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_name: "service".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from `<PREFIX>_HOST`, `<PREFIX>_PORT` and
    /// `<PREFIX>_LOG_LEVEL`, falling back to defaults.
    pub fn from_env(service_name: &str, prefix: &str) -> Self {
        let defaults = Self::default();

        Self {
            service_name: service_name.to_string(),
            host: env::var(format!("{}_HOST", prefix)).unwrap_or(defaults.host),
            port: env::var(format!("{}_PORT", prefix))
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: env::var(format!("{}_LOG_LEVEL", prefix)).unwrap_or(defaults.log_level),
        }
    }
}

/// Database connection configuration.
///
/// Either `token` or both `username` and `password` must be set for a
/// connection to be admitted.
#[derive(Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub address: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("address", &self.address)
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            address: "mem://app".to_string(),
            namespace: "app".to_string(),
            database: "app".to_string(),
            username: Some("root".to_string()),
            password: Some("root".to_string()),
            token: None,
        }
    }
}

impl DatabaseConfig {
    /// Load configuration from environment variables.
    ///
    /// See [`from_lookup`](Self::from_lookup) for how credentials resolve.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`.
    ///
    /// The default username/password pair applies only when neither
    /// `DATABASE_USER` nor `DATABASE_PASSWORD` is set and there is no
    /// `DATABASE_TOKEN`. A partial pair is passed through as given so the
    /// driver refuses it instead of silently signing in as the default user.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let token = lookup("DATABASE_TOKEN").filter(|t| !t.is_empty());

        let (username, password) = match (lookup("DATABASE_USER"), lookup("DATABASE_PASSWORD")) {
            (None, None) if token.is_none() => (defaults.username, defaults.password),
            given => given,
        };

        Self {
            address: lookup("DATABASE_ADDRESS").unwrap_or(defaults.address),
            namespace: lookup("DATABASE_NAMESPACE").unwrap_or(defaults.namespace),
            database: lookup("DATABASE_NAME").unwrap_or(defaults.database),
            username,
            password,
            token,
        }
    }
}

#[cfg(feature = "database")]
impl From<DatabaseConfig> for driver::DriverConfig {
    fn from(config: DatabaseConfig) -> Self {
        Self {
            address: config.address,
            namespace: config.namespace,
            database: config.database,
            username: config.username,
            password: config.password,
            token: config.token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_defaults_when_nothing_set() {
        let config = DatabaseConfig::from_lookup(lookup(&[]));

        assert_eq!(config.address, "mem://app");
        assert_eq!(config.username.as_deref(), Some("root"));
        assert_eq!(config.password.as_deref(), Some("root"));
        assert!(config.token.is_none());
    }

    #[test]
    fn test_from_lookup_keeps_partial_user() {
        let config = DatabaseConfig::from_lookup(lookup(&[("DATABASE_USER", "alice")]));

        assert_eq!(config.username.as_deref(), Some("alice"));
        assert!(config.password.is_none());
    }

    #[test]
    fn test_from_lookup_keeps_partial_password() {
        let config = DatabaseConfig::from_lookup(lookup(&[("DATABASE_PASSWORD", "secret")]));

        assert!(config.username.is_none());
        assert_eq!(config.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_from_lookup_token_replaces_default_pair() {
        let config = DatabaseConfig::from_lookup(lookup(&[("DATABASE_TOKEN", "tok123")]));

        assert!(config.username.is_none() && config.password.is_none());
        assert_eq!(config.token.as_deref(), Some("tok123"));
    }

    #[test]
    fn test_from_lookup_empty_token_is_absent() {
        let config = DatabaseConfig::from_lookup(lookup(&[("DATABASE_TOKEN", "")]));

        assert!(config.token.is_none());
        assert_eq!(config.username.as_deref(), Some("root"));
    }

    #[test]
    fn test_database_config_default_is_admissible() {
        let config = DatabaseConfig::default();

        assert!(config.address.starts_with("mem://"));
        assert!(config.username.is_some() && config.password.is_some());
    }

    #[test]
    fn test_database_config_debug_redacts_secrets() {
        let config = DatabaseConfig {
            password: Some("hunter2".to_string()),
            token: Some("tok123".to_string()),
            ..Default::default()
        };

        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("tok123"));
    }

    #[test]
    fn test_database_config_never_serializes_secrets() {
        let config = DatabaseConfig {
            token: Some("tok123".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("token").is_none());
        assert_eq!(json["namespace"], "app");
    }

    #[cfg(feature = "database")]
    #[test]
    fn test_partial_pair_is_refused_by_driver() {
        let config = DatabaseConfig::from_lookup(lookup(&[("DATABASE_USER", "alice")]));

        let driver_config: driver::DriverConfig = config.into();
        assert!(matches!(
            driver_config.credentials(),
            Err(driver::DriverError::AuthenticationConfig)
        ));
    }

    #[cfg(feature = "database")]
    #[test]
    fn test_database_config_into_driver_config() {
        let config = DatabaseConfig {
            token: Some("tok123".to_string()),
            ..Default::default()
        };

        let driver_config: driver::DriverConfig = config.into();
        assert_eq!(
            driver_config.credentials().unwrap(),
            driver::Credentials::Token("tok123".to_string())
        );
    }
}
