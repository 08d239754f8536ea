//! Gateway configuration.

use common::{DatabaseConfig, ServiceConfig};

/// Gateway configuration.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    /// Listener settings (`GATEWAY_HOST`, `GATEWAY_PORT`, `GATEWAY_LOG_LEVEL`)
    pub service: ServiceConfig,
    /// Connection parameters handed to every request's driver
    pub database: DatabaseConfig,
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            service: ServiceConfig::from_env("gateway", "GATEWAY"),
            database: DatabaseConfig::from_env(),
        }
    }
}
