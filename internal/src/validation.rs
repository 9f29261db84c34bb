use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("LDAP host is required")]
    HostRequired,

    #[error("LDAP Port is required")]
    PortRequired,

    #[error("LDAP Port must be a valid integer")]
    PortNotInteger,

    #[error("LDAP Port must be between 1 and 65535")]
    PortOutOfRange,
}

/// Every violation found in one submission, in field order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.messages().join("; "))
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

/// Decimal digits only, no sign, 1..=65535. Surrounding whitespace is ignored
pub fn parse_port(value: &str) -> Result<u16, FieldError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(FieldError::PortRequired);
    }

    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FieldError::PortNotInteger);
    }

    match value.parse::<u16>() {
        Ok(0) | Err(_) => Err(FieldError::PortOutOfRange),
        Ok(port) => Ok(port),
    }
}

/// Checks run when username validation is switched on. Missing fields count as empty
pub fn validate_ldap_fields(host: Option<&str>, port: Option<&str>) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    if host.map(str::trim).unwrap_or_default().is_empty() {
        errors.push(FieldError::HostRequired);
    }

    if let Err(e) = parse_port(port.unwrap_or_default()) {
        errors.push(e);
    }

    errors
}
