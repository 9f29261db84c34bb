use serde::{Deserialize, Serialize};

use crate::validation::ValidationErrors;

/// Fields posted by the settings page
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SettingsForm {
    /// Checkbox: present means ticked, whatever the value
    #[serde(default, rename = "amu_ldap_username_validation")]
    pub username_validation: Option<String>,

    #[serde(default)]
    pub ldap_host: Option<String>,

    #[serde(default)]
    pub ldap_port: Option<String>,

    #[serde(default)]
    pub ldap_dn: Option<String>,

    #[serde(default, rename = "amu_settings_nonce")]
    pub nonce: Option<String>,

    /// Set by the submit button. Posts without it are not form submissions
    #[serde(default)]
    pub submit: Option<String>,
}

impl SettingsForm {
    pub fn username_validation_enabled(&self) -> bool {
        self.username_validation.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotSubmitted,
    MissingNonce,
    InvalidNonce,
}

impl IgnoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            IgnoreReason::NotSubmitted => "not_submitted",
            IgnoreReason::MissingNonce => "missing_nonce",
            IgnoreReason::InvalidNonce => "invalid_nonce",
        }
    }
}

/// Result of handling one post of the settings form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Updated,

    /// Nothing was stored and nothing is shown to the user
    Ignored(IgnoreReason),

    /// Nothing was stored, the errors are shown on the page
    Invalid(ValidationErrors),
}

impl Submission {
    pub fn is_updated(&self) -> bool {
        matches!(self, Submission::Updated)
    }

    pub fn errors(&self) -> Option<&ValidationErrors> {
        match self {
            Submission::Invalid(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            Submission::Updated => "updated",
            Submission::Ignored(reason) => reason.as_str(),
            Submission::Invalid(_) => "invalid",
        }
    }
}
