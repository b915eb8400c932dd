//! C-ABI wrapper around `pagerduty-core`.
//!
//! # Overview
//! Exposes change event request building and response parsing through
//! `extern "C"` functions so any language with a C FFI can talk to the
//! PagerDuty change events endpoint using its own HTTP stack.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `pd_build_change_event` / `pd_parse_change_event` mirror the core API
//!   1:1.
//! - A single `FfiChangeEventResult` envelope conveys success payloads and
//!   errors uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `pd_free_*` function to release them.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::catch_unwind;

use pagerduty_core::http::HttpResponse;
use pagerduty_core::{ChangeEventClient, ClientConfig};

use types::*;

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new client bound to the events API `endpoint`
/// (e.g. `https://events.pagerduty.com`).
///
/// Returns null if `endpoint` is null or not valid UTF-8. An empty endpoint
/// is accepted here and reported when a request is built.
/// The caller must free the returned pointer with `pd_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn pd_client_new(endpoint: *const c_char) -> *mut FfiChangeEventClient {
    catch_unwind(|| {
        let Some(endpoint) = (unsafe { read_c_str(endpoint) }) else {
            return std::ptr::null_mut();
        };
        let client = ChangeEventClient::new(ClientConfig::new(endpoint));
        Box::into_raw(Box::new(FfiChangeEventClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `pd_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pd_client_free(client: *mut FfiChangeEventClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request
// ---------------------------------------------------------------------------

/// Build the `POST /v2/change/enqueue` request for `event`.
///
/// Returns null if `client` or `event` is null, if a required field is null
/// or not valid UTF-8, or if the client has an empty endpoint.
/// The caller must free the returned pointer with `pd_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn pd_build_change_event(
    client: *const FfiChangeEventClient,
    event: *const FfiChangeEvent,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() || event.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let Some(event) = (unsafe { (*event).to_core() }) else {
            return std::ptr::null_mut();
        };
        match client.inner.build_create_change_event(&event) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse response
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body is
/// treated as empty.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(resp.body) }
            .to_string_lossy()
            .into_owned()
    };
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body,
    }
}

/// Parse the HTTP response to a change event request.
///
/// Never returns null. The caller must free the result with
/// `pd_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn pd_parse_change_event(
    client: *const FfiChangeEventClient,
    response: *const FfiHttpResponse,
) -> *mut FfiChangeEventResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiChangeEventResult::null_arg("client");
        }
        if response.is_null() {
            return FfiChangeEventResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match client.inner.parse_create_change_event(ffi_response_to_core(resp)) {
            Ok(parsed) => FfiChangeEventResult::ok(parsed),
            Err(e) => FfiChangeEventResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiChangeEventResult::panic("panic in pd_parse_change_event"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by `pd_build_change_event`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pd_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.url);
        free_c_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    });
}

/// Free an `FfiChangeEventResult` returned by `pd_parse_change_event`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pd_free_result(result: *mut FfiChangeEventResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        unsafe { free_response(result.data) };
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pd_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    const KEY: &str = "a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4";

    fn new_client(endpoint: &str) -> *mut FfiChangeEventClient {
        let endpoint = CString::new(endpoint).unwrap();
        pd_client_new(endpoint.as_ptr())
    }

    fn c_str(ptr: *const c_char) -> &'static str {
        unsafe { CStr::from_ptr(ptr) }.to_str().unwrap()
    }

    fn event(routing_key: &CString, summary: &CString) -> FfiChangeEvent {
        FfiChangeEvent {
            routing_key: routing_key.as_ptr(),
            summary: summary.as_ptr(),
            source: std::ptr::null(),
            timestamp: std::ptr::null(),
            custom_details: std::ptr::null(),
            custom_details_len: 0,
            links: std::ptr::null(),
            links_len: 0,
        }
    }

    fn parse(client: *const FfiChangeEventClient, status: u16, body: &str) -> *mut FfiChangeEventResult {
        let body = CString::new(body).unwrap();
        let resp = FfiHttpResponse {
            status,
            body: body.as_ptr(),
        };
        pd_parse_change_event(client, &resp)
    }

    #[test]
    fn client_new_and_free() {
        let client = new_client("https://events.pagerduty.com");
        assert!(!client.is_null());
        pd_client_free(client);
    }

    #[test]
    fn client_new_null_returns_null() {
        assert!(pd_client_new(std::ptr::null()).is_null());
    }

    #[test]
    fn client_free_null_is_safe() {
        pd_client_free(std::ptr::null_mut());
    }

    #[test]
    fn build_minimal_event() {
        let client = new_client("http://localhost:3000");
        let key = CString::new(KEY).unwrap();
        let summary = CString::new("Deploy api v42").unwrap();
        let ev = event(&key, &summary);

        let req = pd_build_change_event(client, &ev);
        assert!(!req.is_null());

        let req_ref = unsafe { &*req };
        assert!(matches!(req_ref.method, FfiHttpMethod::Post));
        assert_eq!(c_str(req_ref.url), "http://localhost:3000/v2/change/enqueue");
        assert_eq!(req_ref.headers_len, 3);

        let headers =
            unsafe { std::slice::from_raw_parts(req_ref.headers, req_ref.headers_len as usize) };
        assert!(headers
            .iter()
            .any(|h| c_str(h.key) == "content-type" && c_str(h.value) == "application/json"));

        let body: serde_json::Value = serde_json::from_str(c_str(req_ref.body)).unwrap();
        assert_eq!(body["routing_key"], KEY);
        assert_eq!(body["payload"]["summary"], "Deploy api v42");
        assert!(body.get("links").is_none());

        pd_free_request(req);
        pd_client_free(client);
    }

    #[test]
    fn build_full_event() {
        let client = new_client("http://localhost:3000");
        let key = CString::new(KEY).unwrap();
        let summary = CString::new("Build success").unwrap();
        let source = CString::new("ci").unwrap();
        let timestamp = CString::new("2020-07-17T08:42:58.315+0000").unwrap();
        let detail_key = CString::new("build_state").unwrap();
        let detail_value = CString::new("passed").unwrap();
        let href = CString::new("https://acme.pagerduty.dev/build/2").unwrap();
        let text = CString::new("View build").unwrap();

        let details = [FfiKeyValue {
            key: detail_key.as_ptr(),
            value: detail_value.as_ptr(),
        }];
        let links = [FfiLink {
            href: href.as_ptr(),
            text: text.as_ptr(),
        }];
        let mut ev = event(&key, &summary);
        ev.source = source.as_ptr();
        ev.timestamp = timestamp.as_ptr();
        ev.custom_details = details.as_ptr();
        ev.custom_details_len = 1;
        ev.links = links.as_ptr();
        ev.links_len = 1;

        let req = pd_build_change_event(client, &ev);
        assert!(!req.is_null());

        let body: serde_json::Value =
            serde_json::from_str(c_str(unsafe { &*req }.body)).unwrap();
        assert_eq!(body["payload"]["source"], "ci");
        assert_eq!(body["payload"]["timestamp"], "2020-07-17T08:42:58.315+0000");
        assert_eq!(body["payload"]["custom_details"]["build_state"], "passed");
        assert_eq!(body["links"][0]["href"], "https://acme.pagerduty.dev/build/2");
        assert_eq!(body["links"][0]["text"], "View build");

        pd_free_request(req);
        pd_client_free(client);
    }

    #[test]
    fn build_null_summary_returns_null() {
        let client = new_client("http://localhost:3000");
        let key = CString::new(KEY).unwrap();
        let summary = CString::new("unused").unwrap();
        let mut ev = event(&key, &summary);
        ev.summary = std::ptr::null();

        assert!(pd_build_change_event(client, &ev).is_null());
        pd_client_free(client);
    }

    #[test]
    fn build_null_array_with_length_returns_null() {
        let client = new_client("http://localhost:3000");
        let key = CString::new(KEY).unwrap();
        let summary = CString::new("Deploy").unwrap();
        let mut ev = event(&key, &summary);
        ev.links_len = 2;

        assert!(pd_build_change_event(client, &ev).is_null());
        pd_client_free(client);
    }

    #[test]
    fn build_with_empty_endpoint_returns_null() {
        let client = new_client("");
        assert!(!client.is_null());
        let key = CString::new(KEY).unwrap();
        let summary = CString::new("Deploy").unwrap();
        let ev = event(&key, &summary);

        assert!(pd_build_change_event(client, &ev).is_null());
        pd_client_free(client);
    }

    #[test]
    fn build_null_link_text_is_empty() {
        let client = new_client("http://localhost:3000");
        let key = CString::new(KEY).unwrap();
        let summary = CString::new("Deploy").unwrap();
        let href = CString::new("https://acme.pagerduty.dev/build/2").unwrap();
        let links = [FfiLink {
            href: href.as_ptr(),
            text: std::ptr::null(),
        }];
        let mut ev = event(&key, &summary);
        ev.links = links.as_ptr();
        ev.links_len = 1;

        let req = pd_build_change_event(client, &ev);
        assert!(!req.is_null());
        let body: serde_json::Value =
            serde_json::from_str(c_str(unsafe { &*req }.body)).unwrap();
        assert_eq!(body["links"][0]["text"], "");

        pd_free_request(req);
        pd_client_free(client);
    }

    #[test]
    fn build_invalid_utf8_link_text_returns_null() {
        let client = new_client("http://localhost:3000");
        let key = CString::new(KEY).unwrap();
        let summary = CString::new("Deploy").unwrap();
        let href = CString::new("https://acme.pagerduty.dev/build/2").unwrap();
        let text = CString::new(vec![0xff, 0xfe]).unwrap();
        let links = [FfiLink {
            href: href.as_ptr(),
            text: text.as_ptr(),
        }];
        let mut ev = event(&key, &summary);
        ev.links = links.as_ptr();
        ev.links_len = 1;

        assert!(pd_build_change_event(client, &ev).is_null());
        pd_client_free(client);
    }

    #[test]
    fn build_null_client_returns_null() {
        let key = CString::new(KEY).unwrap();
        let summary = CString::new("Deploy").unwrap();
        let ev = event(&key, &summary);
        assert!(pd_build_change_event(std::ptr::null(), &ev).is_null());
    }

    #[test]
    fn parse_accepted() {
        let client = new_client("http://localhost:3000");
        let result = parse(
            client,
            202,
            r#"{"status":"success","message":"Change event processed"}"#,
        );
        assert!(!result.is_null());

        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert!(r.error_message.is_null());

        let data = unsafe { &*r.data };
        assert_eq!(c_str(data.status), "success");
        assert_eq!(c_str(data.message), "Change event processed");
        assert_eq!(data.errors_len, 0);
        assert!(data.errors.is_null());

        pd_free_result(result);
        pd_client_free(client);
    }

    #[test]
    fn parse_rejected_exposes_errors() {
        let client = new_client("http://localhost:3000");
        let result = parse(
            client,
            400,
            r#"{"status":"invalid event","message":"Event object is invalid","errors":["'routing_key' is invalid"]}"#,
        );
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Rejected);
        assert_eq!(r.http_status, 400);
        assert!(!r.error_message.is_null());

        let data = unsafe { &*r.data };
        assert_eq!(data.errors_len, 1);
        let errors = unsafe { std::slice::from_raw_parts(data.errors, 1) };
        assert_eq!(c_str(errors[0]), "'routing_key' is invalid");

        pd_free_result(result);
        pd_client_free(client);
    }

    #[test]
    fn parse_unstructured_error() {
        let client = new_client("http://localhost:3000");
        let result = parse(client, 503, "Service Unavailable");
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Http);
        assert_eq!(r.http_status, 503);
        assert!(r.data.is_null());

        pd_free_result(result);
        pd_client_free(client);
    }

    #[test]
    fn parse_bad_json() {
        let client = new_client("http://localhost:3000");
        let result = parse(client, 202, "not json");
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Deserialization);

        pd_free_result(result);
        pd_client_free(client);
    }

    #[test]
    fn parse_null_body_is_empty() {
        let client = new_client("http://localhost:3000");
        let resp = FfiHttpResponse {
            status: 202,
            body: std::ptr::null(),
        };
        let result = pd_parse_change_event(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Deserialization);

        pd_free_result(result);
        pd_client_free(client);
    }

    #[test]
    fn parse_null_client_returns_null_arg() {
        let result = parse(std::ptr::null(), 202, "{}");
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);
        assert_eq!(c_str(r.error_message), "null argument: client");

        pd_free_result(result);
    }

    #[test]
    fn parse_null_response_returns_null_arg() {
        let client = new_client("http://localhost:3000");
        let result = pd_parse_change_event(client, std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);

        pd_free_result(result);
        pd_client_free(client);
    }

    #[test]
    fn free_request_null_is_safe() {
        pd_free_request(std::ptr::null_mut());
    }

    #[test]
    fn free_result_null_is_safe() {
        pd_free_result(std::ptr::null_mut());
    }

    #[test]
    fn free_string_null_is_safe() {
        pd_free_string(std::ptr::null_mut());
    }
}
