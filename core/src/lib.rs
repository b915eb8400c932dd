//! Synchronous client core for the PagerDuty change events API.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values for
//! `POST /v2/change/enqueue` without requiring a particular HTTP stack
//! (host-does-IO pattern). `ChangeEventClient::create_change_event` runs the
//! whole round trip through any [`Transport`]; the `ureq` feature provides a
//! blocking one.
//!
//! # Design
//! - `ChangeEventClient` is stateless; it holds only its `ClientConfig`.
//! - The single operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary is explicit.
//! - Types use owned `String` / `Vec` fields to simplify FFI mapping.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::ChangeEventClient;
pub use config::ClientConfig;
pub use error::{ApiError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::Transport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{ChangeEvent, ChangeEventResponse, Link, Payload, CHANGE_EVENT_PATH};

/// Tracing target for change event client operations.
pub const TRACING_TARGET: &str = "pagerduty_core";
