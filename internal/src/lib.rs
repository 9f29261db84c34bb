pub mod config;
pub mod form;
pub mod nonce;
pub mod options;
pub mod page;
pub mod render;
pub mod store;
pub mod validation;

pub use form::{IgnoreReason, SettingsForm, Submission};
pub use nonce::{NonceIssuer, SETTINGS_ACTION};
pub use options::{FieldSet, SettingsDefaults, SettingsRecord};
pub use page::{initialize_options, MenuEntry, SettingsPage};
pub use store::{MemoryStore, OptionStore, TomlFileStore};
pub use validation::{FieldError, ValidationErrors};
