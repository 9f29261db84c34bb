use askama::Template;

use crate::nonce::SETTINGS_ACTION;
use crate::options::{FieldSet, SettingsRecord};
use crate::validation::ValidationErrors;

#[derive(Template)]
#[template(path = "amu_settings.html")]
struct SettingsTemplate<'a> {
    record: &'a SettingsRecord,
    updated: bool,
    errors: Vec<String>,
    nonce_field: &'a str,
    nonce: &'a str,
    ldap_fields: bool,
}

/// Settings form pre-filled with `record`. Values are HTML-escaped
pub fn render(
    record: &SettingsRecord,
    updated: bool,
    errors: &ValidationErrors,
    nonce: &str,
    fields: FieldSet,
) -> askama::Result<String> {
    SettingsTemplate {
        record,
        updated,
        errors: errors.messages(),
        nonce_field: SETTINGS_ACTION,
        nonce,
        ldap_fields: fields.has_ldap_fields(),
    }
    .render()
}
