use anyhow::{anyhow, Result};
use metrics::counter;
use serde::Serialize;

use crate::form::{IgnoreReason, SettingsForm, Submission};
use crate::nonce::{NonceIssuer, SETTINGS_ACTION};
use crate::options::{
    flag_value, FieldSet, SettingsDefaults, SettingsRecord, LDAP_DN, LDAP_HOST, LDAP_PORT,
    USERNAME_VALIDATION,
};
use crate::render::render;
use crate::store::OptionStore;
use crate::validation::{validate_ldap_fields, ValidationErrors};

/// Write defaults for the keys of `fields` missing from the store. Returns how many were written
pub fn initialize_options<S: OptionStore + ?Sized>(
    store: &mut S,
    defaults: &SettingsDefaults,
    fields: FieldSet,
) -> Result<usize> {
    let mut written = 0;

    for key in fields.keys() {
        let default = defaults
            .value_for(key)
            .ok_or_else(|| anyhow!("No default for option {key}"))?;

        if store.set_if_absent(key, default)? {
            tracing::info!("Initialized site option {key}");
            written += 1;
        }
    }

    if written > 0 {
        counter!("settings.initialized_keys").increment(written as u64);
    }

    Ok(written)
}

/// Where the host places the page in its admin menu
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub parent: &'static str,
    pub page_title: &'static str,
    pub menu_title: &'static str,
    /// Capability the host must check before showing the page
    pub capability: &'static str,
    pub slug: &'static str,
}

pub const MENU_ENTRY: MenuEntry = MenuEntry {
    parent: "settings.php",
    page_title: "AMU Settings",
    menu_title: "AMU Settings",
    capability: "manage_options",
    slug: "amu-options",
};

/// The settings page: owns the option store and the nonce issuer
#[derive(Debug)]
pub struct SettingsPage<S> {
    store: S,
    nonces: NonceIssuer,
    defaults: SettingsDefaults,
    fields: FieldSet,
}

impl<S: OptionStore> SettingsPage<S> {
    pub fn new(store: S, nonces: NonceIssuer) -> Self {
        Self {
            store,
            nonces,
            defaults: SettingsDefaults::default(),
            fields: FieldSet::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: SettingsDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_fields(mut self, fields: FieldSet) -> Self {
        self.fields = fields;
        self
    }

    pub fn menu_entry(&self) -> MenuEntry {
        MENU_ENTRY
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn record(&self) -> SettingsRecord {
        SettingsRecord::load(&self.store)
    }

    /// Run on every page load
    pub fn initialize(&mut self) -> Result<usize> {
        initialize_options(&mut self.store, &self.defaults, self.fields)
    }

    pub fn nonce(&self, session: &str) -> String {
        self.nonces.create(SETTINGS_ACTION, session)
    }

    fn check_request(&self, form: &SettingsForm, session: &str) -> Option<IgnoreReason> {
        if form.submit.is_none() {
            return Some(IgnoreReason::NotSubmitted);
        }

        let Some(nonce) = form.nonce.as_deref() else {
            return Some(IgnoreReason::MissingNonce);
        };

        if session.is_empty() || self.nonces.verify(SETTINGS_ACTION, session, nonce).is_none() {
            return Some(IgnoreReason::InvalidNonce);
        }

        None
    }

    fn validate(&self, form: &SettingsForm) -> ValidationErrors {
        if self.fields.has_ldap_fields() && form.username_validation_enabled() {
            validate_ldap_fields(form.ldap_host.as_deref(), form.ldap_port.as_deref())
        } else {
            ValidationErrors::default()
        }
    }

    fn updates<'a>(&self, form: &'a SettingsForm) -> Vec<(&'static str, String)> {
        let mut entries = vec![(
            USERNAME_VALIDATION,
            flag_value(form.username_validation_enabled()),
        )];

        if self.fields.has_ldap_fields() {
            let fields: [(&'static str, &'a Option<String>); 3] = [
                (LDAP_HOST, &form.ldap_host),
                (LDAP_PORT, &form.ldap_port),
                (LDAP_DN, &form.ldap_dn),
            ];
            for (key, value) in fields {
                if let Some(value) = value {
                    entries.push((key, value.trim().to_string()));
                }
            }
        }

        entries
    }

    /// Handle a post of the settings form made from `session`.
    ///
    /// Only store failures are errors. Forged or stale posts are ignored and
    /// invalid input is reported through [`Submission::Invalid`], both without
    /// touching the store.
    pub fn handle_submission(&mut self, form: &SettingsForm, session: &str) -> Result<Submission> {
        let submission = self.process(form, session)?;

        match &submission {
            Submission::Updated => tracing::info!("Settings updated"),
            Submission::Ignored(IgnoreReason::NotSubmitted) => {}
            Submission::Ignored(reason) => {
                tracing::warn!("Ignoring settings post: {}", reason.as_str())
            }
            Submission::Invalid(errors) => tracing::info!("Settings rejected: {errors}"),
        }
        counter!("settings.submissions", "outcome" => submission.outcome()).increment(1);

        Ok(submission)
    }

    fn process(&mut self, form: &SettingsForm, session: &str) -> Result<Submission> {
        if let Some(reason) = self.check_request(form, session) {
            return Ok(Submission::Ignored(reason));
        }

        let errors = self.validate(form);
        if !errors.is_empty() {
            return Ok(Submission::Invalid(errors));
        }

        let entries = self.updates(form);
        self.store.set_many(entries)?;

        Ok(Submission::Updated)
    }

    /// Page markup for `session`, showing the outcome of the request if there was one
    pub fn render(&self, session: &str, submission: Option<&Submission>) -> Result<String> {
        let updated = submission.is_some_and(Submission::is_updated);
        let errors = submission
            .and_then(Submission::errors)
            .cloned()
            .unwrap_or_default();

        Ok(render(
            &self.record(),
            updated,
            &errors,
            &self.nonce(session),
            self.fields,
        )?)
    }
}
