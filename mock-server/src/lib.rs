use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Tracing target for the mock events API.
pub const TRACING_TARGET: &str = "mock_server";

const ROUTING_KEY_LEN: usize = 32;
const MAX_SUMMARY_LEN: usize = 1024;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(default)]
    pub routing_key: String,
    #[serde(default)]
    pub payload: Payload,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub custom_details: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventResponse {
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// A change event the server accepted, tagged with a server-side id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReceivedEvent {
    pub id: Uuid,
    pub event: ChangeEvent,
}

pub type Store = Arc<RwLock<Vec<ReceivedEvent>>>;

pub fn app() -> Router {
    app_with_store(Store::default())
}

/// Router backed by a caller-owned store, so tests can inspect what arrived.
pub fn app_with_store(store: Store) -> Router {
    Router::new()
        .route("/v2/change/enqueue", post(enqueue_change_event))
        .route("/v2/change/events", get(list_change_events))
        .with_state(store)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_store(listener: TcpListener, store: Store) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_store(store)).await
}

/// Collect the reasons PagerDuty would refuse `event`.
pub fn validate(event: &ChangeEvent) -> Vec<String> {
    let mut errors = Vec::new();
    if event.routing_key.chars().count() != ROUTING_KEY_LEN {
        errors.push("'routing_key' is invalid".to_string());
    }
    let summary = &event.payload.summary;
    if summary.trim().is_empty() {
        errors.push("'payload.summary' is missing or blank".to_string());
    } else if summary.chars().count() > MAX_SUMMARY_LEN {
        errors.push("'payload.summary' must be at most 1024 characters".to_string());
    }
    for (i, link) in event.links.iter().enumerate() {
        if link.href.trim().is_empty() {
            errors.push(format!("'links[{i}].href' is missing or blank"));
        }
    }
    errors
}

async fn enqueue_change_event(
    State(store): State<Store>,
    Json(event): Json<ChangeEvent>,
) -> (StatusCode, Json<EventResponse>) {
    let errors = validate(&event);
    if !errors.is_empty() {
        tracing::info!(target: TRACING_TARGET, errors = errors.len(), "Rejected change event");
        return (
            StatusCode::BAD_REQUEST,
            Json(EventResponse {
                status: "invalid event".to_string(),
                message: "Event object is invalid".to_string(),
                errors,
            }),
        );
    }

    let id = Uuid::new_v4();
    tracing::info!(target: TRACING_TARGET, %id, summary = %event.payload.summary, "Accepted change event");
    store.write().await.push(ReceivedEvent { id, event });
    (
        StatusCode::ACCEPTED,
        Json(EventResponse {
            status: "success".to_string(),
            message: "Change event processed".to_string(),
            errors: Vec::new(),
        }),
    )
}

async fn list_change_events(State(store): State<Store>) -> Json<Vec<ReceivedEvent>> {
    Json(store.read().await.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(routing_key: &str, summary: &str) -> ChangeEvent {
        ChangeEvent {
            routing_key: routing_key.to_string(),
            payload: Payload {
                summary: summary.to_string(),
                ..Payload::default()
            },
            links: Vec::new(),
        }
    }

    const KEY: &str = "a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4";

    #[test]
    fn valid_event_has_no_errors() {
        assert!(validate(&event(KEY, "Deploy")).is_empty());
    }

    #[test]
    fn short_routing_key_is_invalid() {
        assert_eq!(validate(&event("abc", "Deploy")), vec!["'routing_key' is invalid"]);
    }

    #[test]
    fn blank_summary_is_invalid() {
        assert_eq!(
            validate(&event(KEY, "   ")),
            vec!["'payload.summary' is missing or blank"]
        );
    }

    #[test]
    fn long_summary_is_invalid() {
        let summary = "x".repeat(MAX_SUMMARY_LEN + 1);
        assert_eq!(
            validate(&event(KEY, &summary)),
            vec!["'payload.summary' must be at most 1024 characters"]
        );
    }

    #[test]
    fn summary_at_limit_is_valid() {
        let summary = "x".repeat(MAX_SUMMARY_LEN);
        assert!(validate(&event(KEY, &summary)).is_empty());
    }

    #[test]
    fn summary_padding_counts_toward_limit() {
        let summary = format!("{}      ", "x".repeat(MAX_SUMMARY_LEN));
        assert_eq!(validate(&event(KEY, &summary)).len(), 1);
    }

    #[test]
    fn summary_limit_counts_characters_not_bytes() {
        let summary = "é".repeat(MAX_SUMMARY_LEN);
        assert!(validate(&event(KEY, &summary)).is_empty());
    }

    #[test]
    fn blank_link_href_is_invalid() {
        let mut e = event(KEY, "Deploy");
        e.links.push(Link {
            href: String::new(),
            text: None,
        });
        assert_eq!(validate(&e), vec!["'links[0].href' is missing or blank"]);
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let e: ChangeEvent = serde_json::from_str("{}").unwrap();
        assert!(e.routing_key.is_empty());
        assert_eq!(validate(&e).len(), 2);
    }

    #[test]
    fn success_response_omits_errors() {
        let json = serde_json::to_value(EventResponse {
            status: "success".to_string(),
            message: "Change event processed".to_string(),
            errors: Vec::new(),
        })
        .unwrap();
        assert!(json.get("errors").is_none());
    }
}
