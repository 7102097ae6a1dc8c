//! Issues one logical operation against the remote API and classifies the outcome.

use crate::core::domain::{
    error::{ProxmoxError, ProxmoxResult, ValidationError},
    model::{cluster_endpoint::RateLimitConfig, operation::Operation, session::Session},
};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::{StatusCode, header::AUTHORIZATION};
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, warn};

/// The seam between the Aggregation layer and the transport.
///
/// Implementations return the raw `data` payload of a successful call, or
/// exactly one classified [`ProxmoxError`]. They never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn call(&self, session: &Session, operation: &Operation) -> ProxmoxResult<Value>;
}

/// The HTTP Dispatcher.
///
/// Applies the optional client-side rate limit before each request, sends
/// it with the Session's token, and maps the response onto the error
/// taxonomy. A 401/403 invalidates the Session.
#[derive(Debug, Default)]
pub struct Dispatcher {
    rate_limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl Dispatcher {
    /// Creates a Dispatcher, throttled when `rate_limit` is set.
    ///
    /// # Errors
    /// Returns `ProxmoxError::Validation` if the rate or burst is zero.
    pub fn new(rate_limit: Option<RateLimitConfig>) -> ProxmoxResult<Self> {
        let rate_limiter = match rate_limit {
            Some(rl) => {
                let rate = non_zero("requests_per_second", rl.requests_per_second)?;
                let burst = non_zero("burst_size", rl.burst_size)?;
                let quota = Quota::per_second(rate).allow_burst(burst);
                Some(Arc::new(DefaultDirectRateLimiter::direct(quota)))
            }
            None => None,
        };
        Ok(Self { rate_limiter })
    }

    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.rate_limiter.is_some()
    }
}

fn non_zero(field: &str, value: u32) -> ProxmoxResult<NonZeroU32> {
    NonZeroU32::new(value).ok_or_else(|| {
        ProxmoxError::Validation(ValidationError::Field {
            field: field.to_string(),
            message: "Must be greater than zero".to_string(),
        })
    })
}

#[async_trait]
impl Dispatch for Dispatcher {
    async fn call(&self, session: &Session, operation: &Operation) -> ProxmoxResult<Value> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }
        execute(session, operation).await
    }
}

/// Sends `operation` over `session` without throttling.
///
/// Also used by the Session Cache to verify a freshly built Session.
pub(crate) async fn execute(session: &Session, operation: &Operation) -> ProxmoxResult<Value> {
    let url = session
        .base_url()
        .api_url(&operation.segments(), &operation.query());
    debug!(%operation, session = session.id(), "dispatching");

    let response = session
        .http_client()
        .get(url)
        .header(AUTHORIZATION, session.authorization())
        .send()
        .await
        .map_err(|e| {
            let message = transport_message(&e);
            warn!(%operation, error = %message, "transport failure");
            ProxmoxError::Connectivity(message)
        })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| {
        ProxmoxError::Connectivity(format!("Failed to read response body: {}", e))
    })?;

    classify(session, operation, status, &body)
}

fn classify(
    session: &Session,
    operation: &Operation,
    status: StatusCode,
    body: &str,
) -> ProxmoxResult<Value> {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            session.invalidate();
            warn!(%operation, status = status.as_u16(), session = session.id(), "credentials rejected, session invalidated");
            Err(ProxmoxError::Authentication(remote_message(status, body)))
        }
        // pveproxy could not reach the node that owns the resource.
        s if s.as_u16() == 595 || s.as_u16() == 596 => {
            Err(ProxmoxError::Connectivity(remote_message(status, body)))
        }
        s if !s.is_success() => Err(ProxmoxError::Api {
            status: s.as_u16(),
            message: remote_message(status, body),
        }),
        s => {
            let envelope: Value = serde_json::from_str(body).map_err(|e| ProxmoxError::Api {
                status: s.as_u16(),
                message: format!("malformed response: {}", e),
            })?;
            Ok(match envelope {
                Value::Object(mut map) => map.remove("data").unwrap_or(Value::Null),
                _ => Value::Null,
            })
        }
    }
}

fn transport_message(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("Request timed out: {}", error)
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else {
        format!("HTTP request failed: {}", error)
    }
}

/// The remote error text, verbatim: per-field `errors`, else `message`, else
/// the raw body, else the HTTP reason.
fn remote_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(envelope)) = serde_json::from_str::<Value>(body) {
        if let Some(Value::Object(errors)) = envelope.get("errors") {
            let fields: Vec<String> = errors
                .iter()
                .map(|(field, message)| match message {
                    Value::String(m) => format!("{}: {}", field, m.trim()),
                    other => format!("{}: {}", field, other),
                })
                .collect();
            if !fields.is_empty() {
                return fields.join("; ");
            }
        }
        if let Some(message) = envelope
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
        {
            return message.to_string();
        }
    } else if !body.trim().is_empty() {
        return body.trim().to_string();
    }
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}
