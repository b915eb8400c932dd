//! Request builder and response parser for the change event endpoint.
//!
//! # Design
//! `ChangeEventClient` holds only its `ClientConfig` and carries no mutable
//! state between calls. Creating a change event is split into
//! `build_create_change_event`, which produces an `HttpRequest`, and
//! `parse_create_change_event`, which consumes an `HttpResponse`.
//! `create_change_event` glues the two together around a `Transport` for
//! callers that do not need to own the I/O.

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{ChangeEvent, ChangeEventResponse, CHANGE_EVENT_PATH};
use crate::TRACING_TARGET;

/// Media type PagerDuty expects for v2 API calls.
const ACCEPT_V2: &str = "application/vnd.pagerduty+json;version=2";

/// Synchronous, stateless client for the PagerDuty change event endpoint.
#[derive(Debug, Clone, Default)]
pub struct ChangeEventClient {
    config: ClientConfig,
}

impl ChangeEventClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Client for the given events API endpoint with default settings.
    pub fn with_endpoint(events_api_endpoint: &str) -> Self {
        Self::new(ClientConfig::new(events_api_endpoint))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the `POST /v2/change/enqueue` request for `event`.
    ///
    /// Fails with `ApiError::MissingEndpoint` before serializing anything
    /// when the events API endpoint is empty.
    pub fn build_create_change_event(&self, event: &ChangeEvent) -> Result<HttpRequest, ApiError> {
        let endpoint = self.config.events_api_endpoint.trim();
        if endpoint.is_empty() {
            return Err(ApiError::MissingEndpoint);
        }

        let body = serde_json::to_string(event).map_err(ApiError::Serialization)?;
        let url = format!("{}{CHANGE_EVENT_PATH}", endpoint.trim_end_matches('/'));

        tracing::debug!(
            target: TRACING_TARGET,
            %url,
            summary = %event.payload.summary,
            links = event.links.len(),
            "Built change event request"
        );

        Ok(HttpRequest {
            method: HttpMethod::Post,
            url,
            headers: vec![
                ("accept".to_string(), ACCEPT_V2.to_string()),
                ("content-type".to_string(), "application/json".to_string()),
                ("user-agent".to_string(), self.config.effective_user_agent()),
            ],
            body: Some(body),
        })
    }

    /// Interpret the response to a change event request.
    pub fn parse_create_change_event(
        &self,
        response: HttpResponse,
    ) -> Result<ChangeEventResponse, ApiError> {
        if response.is_success() {
            let parsed: ChangeEventResponse =
                serde_json::from_str(&response.body).map_err(ApiError::Deserialization)?;
            tracing::debug!(
                target: TRACING_TARGET,
                status = response.status,
                pd_status = %parsed.status,
                "Change event accepted"
            );
            return Ok(parsed);
        }

        Err(rejection(response))
    }

    /// Send `event` through `transport` and parse the reply.
    pub fn create_change_event<T: Transport>(
        &self,
        transport: &T,
        event: &ChangeEvent,
    ) -> Result<ChangeEventResponse, ApiError> {
        let request = self.build_create_change_event(event)?;
        let response = transport.execute(request)?;
        self.parse_create_change_event(response)
    }
}

/// Map a non-2xx response to `Rejected` when PagerDuty sent a structured
/// body, or `Http` otherwise.
fn rejection(response: HttpResponse) -> ApiError {
    let HttpResponse { status, body, .. } = response;
    match serde_json::from_str::<ChangeEventResponse>(&body) {
        Ok(parsed) if !parsed.status.is_empty() || !parsed.errors.is_empty() => {
            tracing::warn!(
                target: TRACING_TARGET,
                status,
                pd_status = %parsed.status,
                errors = parsed.errors.len(),
                "Change event rejected"
            );
            ApiError::Rejected {
                status,
                response: parsed,
            }
        }
        _ => {
            tracing::warn!(target: TRACING_TARGET, status, "Unexpected HTTP status");
            ApiError::Http { status, body }
        }
    }
}
