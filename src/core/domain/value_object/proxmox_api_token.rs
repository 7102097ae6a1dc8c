use crate::core::domain::{error::ValidationError, value_object::ProxmoxPrincipal};
use std::fmt;

/// A pre-provisioned Proxmox API token (token id plus secret).
///
/// The secret never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxmoxApiToken {
    id: String,
    secret: String,
}

impl ProxmoxApiToken {
    /// Creates a new token without validation.
    pub(crate) fn new_unchecked(id: String, secret: String) -> Self {
        Self { id, secret }
    }

    /// Returns the token id (the part after `!` in `user@realm!id`).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Formats the `Authorization` header value for the given principal.
    #[must_use]
    pub fn authorization_value(&self, principal: &ProxmoxPrincipal) -> String {
        format!("PVEAPIToken={}!{}={}", principal, self.id, self.secret)
    }
}

impl fmt::Debug for ProxmoxApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxmoxApiToken")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Strips an optional `user@realm!` prefix from a token id.
pub(crate) fn bare_token_id(token_id: &str) -> &str {
    token_id
        .rsplit_once('!')
        .map(|(_, id)| id)
        .unwrap_or(token_id)
}

/// Validates a token id. Accepts both `id` and `user@realm!id`.
pub(crate) fn validate_token_id(token_id: &str) -> Result<(), ValidationError> {
    let id = bare_token_id(token_id);
    if id.is_empty() {
        return Err(ValidationError::Field {
            field: "token_id".to_string(),
            message: "Token id cannot be empty".to_string(),
        });
    }
    if id.len() > 64 {
        return Err(ValidationError::Format(
            "Token id cannot exceed 64 characters".to_string(),
        ));
    }
    let first = id.chars().next().unwrap_or('-');
    if !first.is_ascii_alphabetic() {
        return Err(ValidationError::Format(
            "Token id must start with a letter".to_string(),
        ));
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.';
    if !id.chars().all(allowed) {
        return Err(ValidationError::Format(
            "Token id contains invalid characters. Allowed: alphanumeric, -, _, .".to_string(),
        ));
    }
    Ok(())
}

/// Validates a token secret.
pub(crate) fn validate_token_secret(secret: &str) -> Result<(), ValidationError> {
    if secret.trim().is_empty() {
        return Err(ValidationError::Field {
            field: "token_secret".to_string(),
            message: "Token secret cannot be empty".to_string(),
        });
    }
    if secret.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::Format(
            "Token secret cannot contain whitespace".to_string(),
        ));
    }
    Ok(())
}
