use crate::core::domain::error::ValidationError;

const MAX_HOSTNAME_LENGTH: usize = 253;
const MAX_LABEL_LENGTH: usize = 63;

/// A validated Proxmox host authority (hostname, IPv4 or bracketed IPv6).
///
/// Never carries a scheme; the scheme is decided by the endpoint's
/// `secure` flag when the base URL is composed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxmoxHost(String);

impl ProxmoxHost {
    /// Creates a new host without validation.
    pub(crate) fn new_unchecked(host: String) -> Self {
        Self(host)
    }

    /// Returns the host as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_label(label: &str) -> Result<(), ValidationError> {
    if label.is_empty() || label.len() > MAX_LABEL_LENGTH {
        return Err(ValidationError::Format(format!(
            "Label must be between 1 and {} characters",
            MAX_LABEL_LENGTH
        )));
    }
    if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::Format(
            "Label can only contain alphanumeric characters and hyphens".to_string(),
        ));
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(ValidationError::Format(
            "Label cannot start or end with hyphen".to_string(),
        ));
    }
    Ok(())
}

/// Validates a host authority. Scheme prefixes, paths and ports are rejected.
pub(crate) fn validate_host(host: &str) -> Result<(), ValidationError> {
    if host.is_empty() {
        return Err(ValidationError::Field {
            field: "host".to_string(),
            message: "Host cannot be empty".to_string(),
        });
    }
    if host.contains("://") {
        return Err(ValidationError::Field {
            field: "host".to_string(),
            message: "Host must not include a scheme (use the secure flag instead)".to_string(),
        });
    }
    if host.len() > MAX_HOSTNAME_LENGTH {
        return Err(ValidationError::ConstraintViolation(format!(
            "Host length exceeds maximum of {} characters",
            MAX_HOSTNAME_LENGTH
        )));
    }

    match url::Host::parse(host) {
        Ok(url::Host::Domain(domain)) => {
            for label in domain.split('.') {
                validate_label(label)?;
            }
            Ok(())
        }
        Ok(url::Host::Ipv4(_)) | Ok(url::Host::Ipv6(_)) => Ok(()),
        Err(e) => Err(ValidationError::Format(format!("Invalid host: {}", e))),
    }
}
