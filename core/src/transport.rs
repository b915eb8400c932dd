//! Pluggable HTTP dispatch.
//!
//! `ChangeEventClient::create_change_event` hands its `HttpRequest` to a
//! [`Transport`] and parses whatever comes back. Any blocking HTTP library
//! can back the trait; [`UreqTransport`] is bundled behind the `ureq`
//! feature.

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes an `HttpRequest` and returns the raw response.
///
/// Implementations must return 4xx/5xx responses as `Ok` data so the client
/// can interpret the status. `Err` is reserved for failures where no
/// response was received.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

#[cfg(feature = "ureq")]
pub use self::blocking::UreqTransport;

#[cfg(feature = "ureq")]
mod blocking {
    use super::*;
    use crate::config::ClientConfig;
    use crate::http::HttpMethod;
    use crate::TRACING_TARGET;

    /// Blocking transport backed by a shared `ureq::Agent`.
    #[derive(Debug, Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl UreqTransport {
        /// Build an agent using the configured timeout. Status codes are
        /// never turned into errors.
        pub fn new(config: &ClientConfig) -> Self {
            let timeout = config.effective_timeout();
            tracing::debug!(
                target: TRACING_TARGET,
                timeout_ms = timeout.as_millis() as u64,
                "Creating ureq transport"
            );

            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(Some(timeout))
                .build()
                .new_agent();
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new(&ClientConfig::default())
        }
    }

    impl Transport for UreqTransport {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            let HttpRequest {
                method,
                url,
                headers,
                body,
            } = request;

            let result = match method {
                HttpMethod::Post => {
                    let mut builder = self.agent.post(url.as_str());
                    for (name, value) in &headers {
                        builder = builder.header(name.as_str(), value.as_str());
                    }
                    match body {
                        Some(body) => builder.send(body.as_bytes()),
                        None => builder.send_empty(),
                    }
                }
            };

            let mut response = result.map_err(|e| {
                tracing::warn!(target: TRACING_TARGET, %url, error = %e, "HTTP request failed");
                TransportError::Request(e.to_string())
            })?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.as_str().to_string(), value.to_string()))
                })
                .collect();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| TransportError::Body(e.to_string()))?;

            tracing::debug!(target: TRACING_TARGET, %url, status, "HTTP request completed");

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}
