use serde::Deserialize;
use std::path::PathBuf;

fn default_expose_port() -> u16 {
    6699
}

fn default_expose_address() -> String {
    "127.0.0.1".to_string()
}

fn default_metrics_address() -> String {
    "0.0.0.0".to_string()
}

fn default_nonce_lifetime_hours() -> u64 {
    24
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub nonce: NonceConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,

    #[serde(flatten)]
    pub common: internal::config::CommonConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_expose_port")]
    pub expose_port: u16,

    #[serde(default = "default_expose_address")]
    pub expose_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            expose_port: default_expose_port(),
            expose_address: default_expose_address(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct StoreConfig {
    /// TOML file with the site options
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct NonceConfig {
    /// Key of the form nonces. A random one is generated on every start when unset
    pub secret: Option<String>,

    #[serde(default = "default_nonce_lifetime_hours")]
    pub lifetime_hours: u64,
}

impl Default for NonceConfig {
    fn default() -> Self {
        Self {
            secret: None,
            lifetime_hours: default_nonce_lifetime_hours(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct MetricsConfig {
    pub expose_port: Option<u16>,

    #[serde(default = "default_metrics_address")]
    pub expose_address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            expose_port: None,
            expose_address: default_metrics_address(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use internal::FieldSet;

    #[test]
    fn full_config() {
        let config: Config = toml::from_str(
            r#"
            fields = "full"

            [server]
            expose_port = 8080

            [store]
            path = "/var/lib/amu-settings/site-options.toml"

            [nonce]
            secret = "s3cret"
            lifetime_hours = 12

            [metrics]
            expose_port = 9100

            [defaults]
            ldap_host = "ldaps://ldap.example.org"
            ldap_port = 636
            "#,
        )
        .unwrap();

        assert_eq!(config.server.expose_port, 8080);
        assert_eq!(config.server.expose_address, "127.0.0.1");
        assert_eq!(
            config.store.path,
            Some(PathBuf::from("/var/lib/amu-settings/site-options.toml"))
        );
        assert_eq!(config.nonce.secret.as_deref(), Some("s3cret"));
        assert_eq!(config.nonce.lifetime_hours, 12);
        assert_eq!(config.metrics.expose_port, Some(9100));
        assert_eq!(config.metrics.expose_address, "0.0.0.0");
        assert_eq!(config.common.fields, FieldSet::Full);
        assert_eq!(config.common.defaults.ldap_port, 636);
    }

    #[test]
    fn empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.expose_port, 6699);
        assert!(config.store.path.is_none());
        assert!(config.nonce.secret.is_none());
        assert_eq!(config.nonce.lifetime_hours, 24);
        assert!(config.metrics.expose_port.is_none());
    }
}
