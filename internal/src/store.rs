use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

/// Key-value backend of the site options
pub trait OptionStore: Send {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String) -> Result<()>;

    /// Write `default` only when `key` is missing. Returns whether it was written
    fn set_if_absent(&mut self, key: &str, default: String) -> Result<bool> {
        if self.get(key).is_some() {
            return Ok(false);
        }
        self.set(key, default)?;
        Ok(true)
    }

    /// Write several options as one update
    fn set_many(&mut self, entries: Vec<(&str, String)>) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

impl<T: OptionStore + ?Sized> OptionStore for Box<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        (**self).set(key, value)
    }

    fn set_if_absent(&mut self, key: &str, default: String) -> Result<bool> {
        (**self).set_if_absent(key, default)
    }

    fn set_many(&mut self, entries: Vec<(&str, String)>) -> Result<()> {
        (**self).set_many(entries)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn with_values<K, V, I>(values: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl OptionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Options kept as a flat TOML table of strings. Every write rewrites the whole file
#[derive(Debug)]
pub struct TomlFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl TomlFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let values = if path.exists() {
            let file = String::from_utf8(std::fs::read(&path)?)?;
            toml::from_str(&file)
                .map_err(|e| anyhow!("Cannot parse options file {}: {e}", path.display()))?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, values })
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string(&self.values)?;
        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn apply<F>(&mut self, update: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let previous = self.values.clone();
        update(&mut self.values);

        if let Err(e) = self.persist() {
            self.values = previous;
            return Err(e);
        }
        Ok(())
    }
}

impl OptionStore for TomlFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.apply(|values| {
            values.insert(key.to_string(), value);
        })
    }

    fn set_many(&mut self, entries: Vec<(&str, String)>) -> Result<()> {
        self.apply(|values| {
            for (key, value) in entries {
                values.insert(key.to_string(), value);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_if_absent_keeps_existing_value() {
        let mut store = MemoryStore::with_values([("ldap_port", "636")]);

        assert!(!store.set_if_absent("ldap_port", "389".into()).unwrap());
        assert_eq!(store.get("ldap_port").as_deref(), Some("636"));

        assert!(store.set_if_absent("ldap_host", String::new()).unwrap());
        assert_eq!(store.get("ldap_host").as_deref(), Some(""));
    }

    #[test]
    fn boxed_store_forwards() {
        let mut store: Box<dyn OptionStore> = Box::new(MemoryStore::default());
        store
            .set_many(vec![("ldap_host", "a".into()), ("ldap_dn", "b".into())])
            .unwrap();
        assert_eq!(store.get("ldap_host").as_deref(), Some("a"));
        assert_eq!(store.get("ldap_dn").as_deref(), Some("b"));
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("site-options.toml");

        let mut store = TomlFileStore::open(&path).unwrap();
        assert_eq!(store.get("ldap_host"), None);
        store
            .set_many(vec![
                ("ldap_host", "ldap.example.org".into()),
                ("ldap_dn", "ou=people,dc=example".into()),
            ])
            .unwrap();
        store.set("amu_ldap_username_validation", "1".into()).unwrap();

        let reopened = TomlFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("ldap_host").as_deref(), Some("ldap.example.org"));
        assert_eq!(reopened.get("ldap_dn").as_deref(), Some("ou=people,dc=example"));
        assert_eq!(
            reopened.get("amu_ldap_username_validation").as_deref(),
            Some("1")
        );
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn failed_write_keeps_previous_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site-options.toml");

        let mut store = TomlFileStore::open(&path).unwrap();
        store.set("ldap_host", "old.example.org".into()).unwrap();

        // a non-empty directory in place of the file makes the rename fail
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "").unwrap();

        let result = store.set_many(vec![
            ("ldap_host", "new.example.org".into()),
            ("ldap_dn", "dc=new".into()),
        ]);
        assert!(result.is_err());
        assert_eq!(store.get("ldap_host").as_deref(), Some("old.example.org"));
        assert_eq!(store.get("ldap_dn"), None);

        assert!(store.set("ldap_port", "636".into()).is_err());
        assert_eq!(store.get("ldap_port"), None);
    }

    #[test]
    fn file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site-options.toml");
        std::fs::write(&path, "ldap_host = [").unwrap();

        assert!(TomlFileStore::open(&path).is_err());
    }
}
