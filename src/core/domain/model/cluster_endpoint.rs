//! Identity and connection settings of the target Proxmox cluster.

use crate::core::domain::{
    error::{ProxmoxError, ProxmoxResult, ValidationError},
    value_object::{
        DEFAULT_PORT, ProxmoxApiToken, ProxmoxHost, ProxmoxPort, ProxmoxPrincipal, ProxmoxUrl,
        bare_token_id, validate_host, validate_port, validate_principal, validate_token_id,
        validate_token_secret,
    },
};
use std::{collections::HashMap, path::Path, time::Duration};

/// Default lifetime of a cached Session.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);
/// Default bound on every remote call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client-side request throttling, applied by the Dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_size: u32,
}

/// The key Sessions are cached under: equivalent configurations share one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    authority: String,
    principal: String,
    token_id: String,
}

impl SessionKey {
    #[must_use]
    pub fn authority(&self) -> &str {
        &self.authority
    }
}

/// Immutable description of the cluster to talk to.
///
/// Built once at startup, either with [`ClusterEndpoint::builder`] or from
/// the environment / a token file, and only read afterwards.
#[derive(Debug, Clone)]
pub struct ClusterEndpoint {
    host: ProxmoxHost,
    port: ProxmoxPort,
    principal: ProxmoxPrincipal,
    token: ProxmoxApiToken,
    verify_tls: bool,
    secure: bool,
    cache_ttl: Duration,
    request_timeout: Duration,
    rate_limit: Option<RateLimitConfig>,
    url: ProxmoxUrl,
}

impl ClusterEndpoint {
    /// Creates a new builder for endpoint configuration
    pub fn builder() -> ClusterEndpointBuilder {
        ClusterEndpointBuilder::default()
    }

    /// Reads the configuration from `PROXMOX_*` environment variables.
    ///
    /// Recognised keys: `PROXMOX_HOST`, `PROXMOX_PORT`, `PROXMOX_USER`,
    /// `PROXMOX_TOKEN_ID`, `PROXMOX_TOKEN_SECRET`, `PROXMOX_VERIFY_SSL`,
    /// `PROXMOX_CACHE_TTL` (seconds) and `PROXMOX_TIMEOUT` (seconds).
    pub fn from_env() -> ProxmoxResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the same keys as [`ClusterEndpoint::from_env`] from a
    /// `KEY=VALUE` token file. The process environment is not touched.
    pub fn from_token_file(path: impl AsRef<Path>) -> ProxmoxResult<Self> {
        let path = path.as_ref();
        let token_file_error = |e: dotenvy::Error| {
            ProxmoxError::field(
                "token_file",
                format!("Cannot read {}: {}", path.display(), e),
            )
        };

        let mut values = HashMap::new();
        for item in dotenvy::from_path_iter(path).map_err(token_file_error)? {
            let (key, value) = item.map_err(token_file_error)?;
            values.insert(key, value);
        }
        Self::from_lookup(|key| values.get(key).cloned())
    }

    fn from_lookup<F>(lookup: F) -> ProxmoxResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();
        if let Some(host) = lookup("PROXMOX_HOST") {
            builder = builder.host(host);
        }
        if let Some(port) = lookup("PROXMOX_PORT") {
            let port = port
                .trim()
                .parse::<u16>()
                .map_err(|_| ProxmoxError::field("port", format!("'{}' is not a port", port)))?;
            builder = builder.port(port);
        }
        if let Some(user) = lookup("PROXMOX_USER") {
            builder = builder.principal(user);
        }
        if let (Some(id), Some(secret)) = (lookup("PROXMOX_TOKEN_ID"), lookup("PROXMOX_TOKEN_SECRET"))
        {
            builder = builder.token(id, secret);
        }
        if let Some(verify) = lookup("PROXMOX_VERIFY_SSL") {
            builder = builder.verify_tls(parse_flag("verify_ssl", &verify)?);
        }
        if let Some(ttl) = lookup("PROXMOX_CACHE_TTL") {
            builder = builder.cache_ttl(Duration::from_secs(parse_secs("cache_ttl", &ttl)?));
        }
        if let Some(timeout) = lookup("PROXMOX_TIMEOUT") {
            builder =
                builder.request_timeout(Duration::from_secs(parse_secs("timeout", &timeout)?));
        }
        builder.build()
    }

    pub fn host(&self) -> &ProxmoxHost {
        &self.host
    }

    pub fn port(&self) -> ProxmoxPort {
        self.port
    }

    pub fn principal(&self) -> &ProxmoxPrincipal {
        &self.principal
    }

    pub fn token(&self) -> &ProxmoxApiToken {
        &self.token
    }

    pub fn verify_tls(&self) -> bool {
        self.verify_tls
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Lifetime of a cached Session; zero disables caching.
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn rate_limit(&self) -> Option<RateLimitConfig> {
        self.rate_limit
    }

    pub fn url(&self) -> &ProxmoxUrl {
        &self.url
    }

    /// The `Authorization` header value for this endpoint's token.
    pub fn authorization_value(&self) -> String {
        self.token.authorization_value(&self.principal)
    }

    /// Cache identity: host + port, principal and token id.
    pub fn session_key(&self) -> SessionKey {
        SessionKey {
            authority: format!(
                "{}:{}",
                self.host.as_str().to_ascii_lowercase(),
                self.port.get()
            ),
            principal: self.principal.to_string(),
            token_id: self.token.id().to_string(),
        }
    }
}

fn parse_flag(field: &str, value: &str) -> ProxmoxResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ProxmoxError::field(
            field,
            format!("'{}' is not a boolean", other),
        )),
    }
}

fn parse_secs(field: &str, value: &str) -> ProxmoxResult<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ProxmoxError::field(field, format!("'{}' is not a number of seconds", value)))
}

/// Builder for [`ClusterEndpoint`] configuration
#[derive(Debug)]
pub struct ClusterEndpointBuilder {
    host: Option<String>,
    port: u16,
    principal: Option<String>,
    token_id: Option<String>,
    token_secret: Option<String>,
    verify_tls: bool,
    secure: bool,
    cache_ttl: Duration,
    request_timeout: Duration,
    rate_limit: Option<RateLimitConfig>,
}

impl Default for ClusterEndpointBuilder {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_PORT,
            principal: None,
            token_id: None,
            token_secret: None,
            verify_tls: true,
            secure: true,
            cache_ttl: DEFAULT_CACHE_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            rate_limit: None,
        }
    }
}

impl ClusterEndpointBuilder {
    /// Host authority without scheme, e.g. `pve.example.com` or `10.0.0.5`.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// The token owner in `user@realm` form.
    pub fn principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    /// Token id (bare or `user@realm!id`) and its secret.
    pub fn token(mut self, id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.token_id = Some(id.into());
        self.token_secret = Some(secret.into());
        self
    }

    /// Whether the server certificate must chain to a trusted root.
    /// Disable for self-signed deployments.
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// `true` for https (default), `false` for plain http.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn rate_limit(mut self, requests_per_second: u32, burst_size: u32) -> Self {
        self.rate_limit = Some(RateLimitConfig {
            requests_per_second,
            burst_size,
        });
        self
    }

    /// Validates every field and produces the endpoint.
    pub fn build(self) -> ProxmoxResult<ClusterEndpoint> {
        let host = self
            .host
            .map(|h| h.trim().trim_end_matches('/').to_string())
            .ok_or_else(|| ProxmoxError::field("host", "Host is required"))?;
        validate_host(&host)?;

        validate_port(self.port)?;

        let principal = self
            .principal
            .map(|p| p.trim().to_string())
            .ok_or_else(|| ProxmoxError::field("principal", "Principal is required"))?;
        validate_principal(&principal)?;

        let token_id = self
            .token_id
            .map(|t| t.trim().to_string())
            .ok_or_else(|| ProxmoxError::field("token_id", "Token id is required"))?;
        validate_token_id(&token_id)?;
        if let Some((owner, _)) = token_id.rsplit_once('!') {
            if owner != principal {
                return Err(ValidationError::ConstraintViolation(format!(
                    "Token '{}' does not belong to principal '{}'",
                    token_id, principal
                ))
                .into());
            }
        }

        let token_secret = self
            .token_secret
            .map(|s| s.trim().to_string())
            .ok_or_else(|| ProxmoxError::field("token_secret", "Token secret is required"))?;
        validate_token_secret(&token_secret)?;

        if self.request_timeout.is_zero() {
            return Err(ProxmoxError::field(
                "request_timeout",
                "Request timeout must be greater than zero",
            ));
        }
        if let Some(rl) = self.rate_limit {
            if rl.requests_per_second == 0 || rl.burst_size == 0 {
                return Err(ProxmoxError::field(
                    "rate_limit",
                    "Requests per second and burst size must be greater than zero",
                ));
            }
        }

        let host = ProxmoxHost::new_unchecked(host);
        let port = ProxmoxPort::new_unchecked(self.port);
        let url = ProxmoxUrl::compose(&host, port, self.secure)?;

        Ok(ClusterEndpoint {
            host,
            port,
            principal: ProxmoxPrincipal::new_unchecked(&principal),
            token: ProxmoxApiToken::new_unchecked(bare_token_id(&token_id).to_string(), token_secret),
            verify_tls: self.verify_tls,
            secure: self.secure,
            cache_ttl: self.cache_ttl,
            request_timeout: self.request_timeout,
            rate_limit: self.rate_limit,
            url,
        })
    }
}
