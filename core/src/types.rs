//! Change event DTOs for the PagerDuty Events API v2.
//!
//! # Design
//! These types mirror the documented wire format of
//! `POST /v2/change/enqueue`. The mock-server defines its own copies; the
//! integration test catches schema drift between the two crates.
//!
//! Empty collections and absent optionals are left out of the serialized
//! JSON so the request body only carries what the caller set.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Path of the change event endpoint, relative to the events API endpoint.
pub const CHANGE_EVENT_PATH: &str = "/v2/change/enqueue";

/// A change event, such as a deploy or a config rollout, sent to a
/// PagerDuty integration.
///
/// See <https://developer.pagerduty.com/docs/events-api-v2/send-change-events/#parameters>.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub routing_key: String,
    pub payload: Payload,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

impl ChangeEvent {
    pub fn new(routing_key: impl Into<String>, payload: Payload) -> Self {
        Self {
            routing_key: routing_key.into(),
            payload,
            links: Vec::new(),
        }
    }

    /// Attach a link shown alongside the change event in the PagerDuty UI.
    #[must_use]
    pub fn with_link(mut self, href: impl Into<String>, text: impl Into<String>) -> Self {
        self.links.push(Link {
            href: href.into(),
            text: text.into(),
        });
        self
    }
}

/// The descriptive body of a change event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    pub summary: String,
    /// ISO 8601 time of the change. PagerDuty uses the receive time when
    /// this is absent.
    #[serde(default, skip_serializing_if = "timestamp_is_unset")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_details: BTreeMap<String, String>,
}

impl Payload {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Set the change time. An empty string clears it.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        let timestamp = timestamp.into();
        self.timestamp = (!timestamp.is_empty()).then_some(timestamp);
        self
    }

    #[must_use]
    pub fn with_custom_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_details.insert(key.into(), value.into());
        self
    }
}

fn timestamp_is_unset(timestamp: &Option<String>) -> bool {
    timestamp.as_deref().map_or(true, str::is_empty)
}

/// A single link attached to a change event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub text: String,
}

/// Body returned by the change event endpoint, for both accepted and
/// rejected events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEventResponse {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ChangeEventResponse {
    /// Whether PagerDuty reported the event as processed.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}
