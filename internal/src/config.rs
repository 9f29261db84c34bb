use crate::options::{FieldSet, SettingsDefaults};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CommonConfig {
    /// Values seeded into missing site options
    #[serde(default)]
    pub defaults: SettingsDefaults,

    #[serde(default)]
    pub fields: FieldSet,
}
