//! Application configuration management.

use std::time::Duration;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Tenant provisioning configuration.
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Shared secret expected in the `x-internal-token` header.
    /// When unset the internal routes are not mounted.
    #[serde(default)]
    pub internal_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            internal_token: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Control database connection URL. Tenant schemas live on the same server.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Tenant provisioning configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisioningConfig {
    /// Prefix prepended to a business code to form its schema name.
    #[serde(default = "default_schema_prefix")]
    pub schema_prefix: String,
    /// Deadline for a single tenant run, in seconds.
    #[serde(default = "default_tenant_timeout")]
    pub tenant_timeout_secs: u64,
    /// How many tenants a batch run provisions at the same time.
    #[serde(default = "default_max_concurrent_tenants")]
    pub max_concurrent_tenants: usize,
}

impl ProvisioningConfig {
    /// Returns the per-tenant deadline as a `Duration`.
    #[must_use]
    pub const fn tenant_timeout(&self) -> Duration {
        Duration::from_secs(self.tenant_timeout_secs)
    }
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            schema_prefix: default_schema_prefix(),
            tenant_timeout_secs: default_tenant_timeout(),
            max_concurrent_tenants: default_max_concurrent_tenants(),
        }
    }
}

fn default_schema_prefix() -> String {
    "biz_".to_string()
}

fn default_tenant_timeout() -> u64 {
    120 // 2 minutes
}

fn default_max_concurrent_tenants() -> usize {
    4
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("BIZHUB").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment_with_defaults() {
        temp_env::with_vars(
            [
                ("BIZHUB__DATABASE__URL", Some("mysql://root@localhost/bizhub")),
                ("RUN_MODE", Some("config-test")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "mysql://root@localhost/bizhub");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.server.port, 8080);
                assert!(config.server.internal_token.is_none());
                assert_eq!(config.provisioning.schema_prefix, "biz_");
                assert_eq!(
                    config.provisioning.tenant_timeout(),
                    Duration::from_secs(120)
                );
                assert_eq!(config.provisioning.max_concurrent_tenants, 4);
            },
        );
    }

    #[test]
    fn test_load_without_database_url_fails() {
        temp_env::with_vars(
            [
                ("BIZHUB__DATABASE__URL", None::<&str>),
                ("RUN_MODE", Some("config-test")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }
}
