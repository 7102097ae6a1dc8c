use crate::core::domain::error::ValidationError;
use std::fmt;

/// The authenticated principal an API token belongs to, in `user@realm` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxmoxPrincipal {
    user: String,
    realm: String,
}

impl ProxmoxPrincipal {
    /// Creates a principal from an already validated `user@realm` string.
    ///
    /// The split happens at the last `@`, so user names containing `@`
    /// (e.g. e-mail style LDAP users) keep it.
    pub(crate) fn new_unchecked(principal: &str) -> Self {
        let (user, realm) = principal.rsplit_once('@').unwrap_or((principal, ""));
        Self {
            user: user.to_string(),
            realm: realm.to_string(),
        }
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    #[must_use]
    pub fn realm(&self) -> &str {
        &self.realm
    }
}

impl fmt::Display for ProxmoxPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.realm)
    }
}

/// Validates a `user@realm` principal.
pub(crate) fn validate_principal(principal: &str) -> Result<(), ValidationError> {
    if principal.is_empty() {
        return Err(ValidationError::Field {
            field: "principal".to_string(),
            message: "Principal cannot be empty".to_string(),
        });
    }
    let Some((user, realm)) = principal.rsplit_once('@') else {
        return Err(ValidationError::Format(
            "Principal must be in the form user@realm".to_string(),
        ));
    };

    if user.is_empty() || user.len() > 64 {
        return Err(ValidationError::Format(format!(
            "User name length must be between 1 and 64 characters (got {})",
            user.len()
        )));
    }
    let allowed_user =
        |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' || c == '@';
    if !user.chars().all(allowed_user) {
        return Err(ValidationError::Format(
            "User name contains invalid characters. Allowed: alphanumeric, -, _, ., @".to_string(),
        ));
    }

    if realm.len() < 2 || realm.len() > 32 {
        return Err(ValidationError::Format(
            "Realm length must be between 2 and 32 characters".to_string(),
        ));
    }
    let allowed_realm = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
    if !realm.chars().all(allowed_realm) {
        return Err(ValidationError::Format(
            "Realm contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
