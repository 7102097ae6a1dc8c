use crate::core::domain::{
    error::ValidationError,
    value_object::{ProxmoxHost, ProxmoxPort},
};
use url::Url;

/// A validated base URL for the Proxmox API (`scheme://host:port/`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxmoxUrl(Url);

impl ProxmoxUrl {
    /// Composes the base URL from its parts.
    pub(crate) fn compose(
        host: &ProxmoxHost,
        port: ProxmoxPort,
        secure: bool,
    ) -> Result<Self, ValidationError> {
        let scheme = if secure { "https" } else { "http" };
        let raw = format!("{}://{}:{}/", scheme, host.as_str(), port.get());
        validate_url(&raw)?;
        let url =
            Url::parse(&raw).map_err(|e| ValidationError::Format(format!("Invalid URL: {}", e)))?;
        Ok(Self(url))
    }

    /// Returns the base URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Builds the full URL of an API path with its query parameters.
    ///
    /// Each segment is percent-encoded. Dot segments are dropped by the URL
    /// parser, so caller identifiers are validated before they get here.
    pub(crate) fn api_url(&self, segments: &[String], query: &[(&'static str, String)]) -> Url {
        let mut url = self.0.clone();
        // `http`/`https` URLs always accept path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.clear().extend(["api2", "json"]).extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        url
    }
}

/// Validates a base URL.
pub(crate) fn validate_url(url: &str) -> Result<(), ValidationError> {
    if url.is_empty() {
        return Err(ValidationError::Field {
            field: "url".to_string(),
            message: "URL cannot be empty".to_string(),
        });
    }
    if url.len() > 2083 {
        return Err(ValidationError::Format(
            "URL exceeds maximum length of 2083 characters".to_string(),
        ));
    }
    let parsed =
        Url::parse(url).map_err(|e| ValidationError::Format(format!("Invalid URL format: {}", e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::ConstraintViolation(
            "Invalid scheme. Must be one of: https, http".to_string(),
        ));
    }
    if parsed.host().is_none() {
        return Err(ValidationError::ConstraintViolation(
            "URL must contain a host".to_string(),
        ));
    }
    Ok(())
}
