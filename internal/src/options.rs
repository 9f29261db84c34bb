use serde::{Deserialize, Serialize};

use crate::store::OptionStore;
use crate::validation::{parse_port, FieldError};

pub const USERNAME_VALIDATION: &str = "amu_ldap_username_validation";
pub const LDAP_HOST: &str = "ldap_host";
pub const LDAP_PORT: &str = "ldap_port";
pub const LDAP_DN: &str = "ldap_dn";

pub const DEFAULT_LDAP_PORT: u16 = 389;

/// Stored value of a ticked checkbox. Anything else reads as unticked.
const CHECKED: &str = "1";

fn default_ldap_port() -> u16 {
    DEFAULT_LDAP_PORT
}

pub fn flag_value(enabled: bool) -> String {
    if enabled {
        CHECKED.to_string()
    } else {
        String::new()
    }
}

/// Which fields the settings page manages
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSet {
    /// Username validation flag plus host, port and DN
    #[default]
    Full,

    /// Only the username validation flag
    ValidationOnly,
}

impl FieldSet {
    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            FieldSet::Full => &[USERNAME_VALIDATION, LDAP_HOST, LDAP_PORT, LDAP_DN],
            FieldSet::ValidationOnly => &[USERNAME_VALIDATION],
        }
    }

    pub fn has_ldap_fields(&self) -> bool {
        matches!(self, FieldSet::Full)
    }
}

/// Values written by the initializer for keys missing from the store
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SettingsDefaults {
    #[serde(default)]
    pub ldap_host: String,

    #[serde(default = "default_ldap_port")]
    pub ldap_port: u16,

    #[serde(default)]
    pub ldap_dn: String,
}

impl Default for SettingsDefaults {
    fn default() -> Self {
        Self {
            ldap_host: String::new(),
            ldap_port: default_ldap_port(),
            ldap_dn: String::new(),
        }
    }
}

impl SettingsDefaults {
    pub fn value_for(&self, key: &str) -> Option<String> {
        match key {
            USERNAME_VALIDATION => Some(flag_value(false)),
            LDAP_HOST => Some(self.ldap_host.clone()),
            LDAP_PORT => Some(self.ldap_port.to_string()),
            LDAP_DN => Some(self.ldap_dn.clone()),
            _ => None,
        }
    }
}

/// Typed view over the site options of the settings page
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsRecord {
    pub username_validation: bool,
    pub ldap_host: String,

    /// Kept as stored. Only saves with username validation on guarantee a number here
    pub ldap_port: String,
    pub ldap_dn: String,
}

impl SettingsRecord {
    pub fn load<S: OptionStore + ?Sized>(store: &S) -> Self {
        Self {
            username_validation: store.get(USERNAME_VALIDATION).as_deref() == Some(CHECKED),
            ldap_host: store.get(LDAP_HOST).unwrap_or_default(),
            ldap_port: store.get(LDAP_PORT).unwrap_or_default(),
            ldap_dn: store.get(LDAP_DN).unwrap_or_default(),
        }
    }

    pub fn port(&self) -> Result<u16, FieldError> {
        parse_port(&self.ldap_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn defaults_cover_every_key() {
        let defaults = SettingsDefaults::default();
        for key in FieldSet::Full.keys() {
            assert!(defaults.value_for(key).is_some(), "{key} has no default");
        }
        assert_eq!(defaults.value_for(LDAP_PORT).as_deref(), Some("389"));
        assert_eq!(defaults.value_for(USERNAME_VALIDATION).as_deref(), Some(""));
        assert_eq!(defaults.value_for("unknown"), None);
    }

    #[test]
    fn validation_only_manages_the_flag() {
        assert_eq!(FieldSet::ValidationOnly.keys(), &[USERNAME_VALIDATION]);
        assert!(!FieldSet::ValidationOnly.has_ldap_fields());
        assert!(FieldSet::Full.has_ldap_fields());
    }

    #[test]
    fn record_reads_store_values() {
        let store = MemoryStore::with_values([
            (USERNAME_VALIDATION, "1"),
            (LDAP_HOST, "ldap.example.org"),
            (LDAP_PORT, "636"),
            (LDAP_DN, "ou=people,dc=example"),
        ]);

        let record = SettingsRecord::load(&store);
        assert!(record.username_validation);
        assert_eq!(record.ldap_host, "ldap.example.org");
        assert_eq!(record.port(), Ok(636));
        assert_eq!(record.ldap_dn, "ou=people,dc=example");
    }

    #[test]
    fn only_checked_value_enables_the_flag() {
        let store = MemoryStore::with_values([(USERNAME_VALIDATION, "0")]);
        assert!(!SettingsRecord::load(&store).username_validation);

        let store = MemoryStore::default();
        let record = SettingsRecord::load(&store);
        assert!(!record.username_validation);
        assert_eq!(record.port(), Err(FieldError::PortRequired));
    }

    #[test]
    fn defaults_deserialize_with_fallback_port() {
        let defaults: SettingsDefaults =
            toml::from_str("ldap_host = \"ldaps://ldap.example.org\"").unwrap();
        assert_eq!(defaults.ldap_host, "ldaps://ldap.example.org");
        assert_eq!(defaults.ldap_port, 389);
        assert!(defaults.ldap_dn.is_empty());
    }
}
