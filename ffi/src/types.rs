//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, pointer plus length instead of `Vec`,
//! and enums with explicit discriminants. Conversion functions live here to
//! keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use pagerduty_core::error::ApiError;
use pagerduty_core::http::HttpMethod;
use pagerduty_core::types::{ChangeEvent, ChangeEventResponse, Payload};

/// Opaque handle to a `ChangeEventClient`. C callers receive a pointer to
/// this and pass it back into every FFI function.
pub struct FfiChangeEventClient {
    pub(crate) inner: pagerduty_core::ChangeEventClient,
}

/// Convert a Rust string into an owned C string. Interior NUL bytes are
/// dropped rather than failing the whole call.
pub(crate) fn to_c_string(s: impl Into<String>) -> *mut c_char {
    let mut s = s.into();
    s.retain(|c| c != '\0');
    CString::new(s).unwrap_or_default().into_raw()
}

/// Copy a borrowed C string. `None` for null or invalid UTF-8.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
pub(crate) unsafe fn read_c_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok().map(str::to_string)
}

// ---------------------------------------------------------------------------
// Event input (caller-provided, borrowed for the duration of the call)
// ---------------------------------------------------------------------------

/// A custom detail entry.
#[repr(C)]
pub struct FfiKeyValue {
    pub key: *const c_char,
    pub value: *const c_char,
}

/// A link attached to a change event.
#[repr(C)]
pub struct FfiLink {
    pub href: *const c_char,
    pub text: *const c_char,
}

/// A change event described by the C caller.
///
/// `routing_key` and `summary` are required. `source` and `timestamp` may be
/// null. Arrays may be null when their length is zero.
#[repr(C)]
pub struct FfiChangeEvent {
    pub routing_key: *const c_char,
    pub summary: *const c_char,
    pub source: *const c_char,
    pub timestamp: *const c_char,
    pub custom_details: *const FfiKeyValue,
    pub custom_details_len: u32,
    pub links: *const FfiLink,
    pub links_len: u32,
}

impl FfiChangeEvent {
    /// Copy the C-side event into a core `ChangeEvent`.
    ///
    /// Returns `None` when a required string is null, any string is not
    /// valid UTF-8, or an array pointer is null with a non-zero length.
    ///
    /// # Safety
    /// Every non-null pointer must be valid for the declared lengths.
    pub(crate) unsafe fn to_core(&self) -> Option<ChangeEvent> {
        let routing_key = unsafe { read_c_str(self.routing_key) }?;
        let mut payload = Payload::new(unsafe { read_c_str(self.summary) }?);

        if !self.source.is_null() {
            payload.source = unsafe { read_c_str(self.source) }?;
        }
        if !self.timestamp.is_null() {
            payload.timestamp = Some(unsafe { read_c_str(self.timestamp) }?);
        }

        let details = unsafe { borrowed_slice(self.custom_details, self.custom_details_len) }?;
        for detail in details {
            let key = unsafe { read_c_str(detail.key) }?;
            let value = unsafe { read_c_str(detail.value) }?;
            payload.custom_details.insert(key, value);
        }

        let mut event = ChangeEvent::new(routing_key, payload);
        let links = unsafe { borrowed_slice(self.links, self.links_len) }?;
        for link in links {
            let href = unsafe { read_c_str(link.href) }?;
            let text = if link.text.is_null() {
                String::new()
            } else {
                unsafe { read_c_str(link.text) }?
            };
            event = event.with_link(href, text);
        }
        Some(event)
    }
}

/// View a C array as a slice. Null with a zero length is an empty slice.
unsafe fn borrowed_slice<'a, T>(ptr: *const T, len: u32) -> Option<&'a [T]> {
    match (ptr.is_null(), len) {
        (_, 0) => Some(&[]),
        (true, _) => None,
        (false, len) => Some(unsafe { std::slice::from_raw_parts(ptr, len as usize) }),
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
pub enum FfiHttpMethod {
    Post = 0,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Post => FfiHttpMethod::Post,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `pd_build_change_event`. The C caller executes the request and
/// passes the response back through `pd_parse_change_event`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: pagerduty_core::HttpRequest) -> *mut Self {
        let url = to_c_string(req.url);
        let body = match req.body {
            Some(b) => to_c_string(b),
            None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: to_c_string(k),
                    value: to_c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url,
            headers,
            headers_len,
            body,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing the request,
/// then passes a pointer to `pd_parse_change_event`. The FFI layer reads but
/// does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiChangeEventResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    MissingEndpoint = 1,
    Http = 2,
    Rejected = 3,
    Deserialization = 4,
    Serialization = 5,
    Transport = 6,
    Panic = 7,
    NullArg = 8,
}

/// The change event endpoint's reply exposed to C.
#[repr(C)]
pub struct FfiChangeEventResponse {
    pub status: *mut c_char,
    pub message: *mut c_char,
    pub errors: *mut *mut c_char,
    pub errors_len: u32,
}

impl FfiChangeEventResponse {
    fn from_core(response: ChangeEventResponse) -> *mut Self {
        let errors_len = response.errors.len() as u32;
        let errors = if response.errors.is_empty() {
            std::ptr::null_mut()
        } else {
            let items: Box<[*mut c_char]> =
                response.errors.into_iter().map(to_c_string).collect();
            Box::into_raw(items) as *mut *mut c_char
        };
        Box::into_raw(Box::new(FfiChangeEventResponse {
            status: to_c_string(response.status),
            message: to_c_string(response.message),
            errors,
            errors_len,
        }))
    }
}

/// Result envelope for `pd_parse_change_event`.
///
/// On success `error_code` is `Ok`, `error_message` is null and `data`
/// points to the parsed response. On failure `error_code` describes the
/// category and `error_message` is a human-readable C string. `Rejected`
/// failures also set `data` so the caller can read PagerDuty's `errors`;
/// every other failure leaves it null.
#[repr(C)]
pub struct FfiChangeEventResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data: *mut FfiChangeEventResponse,
}

impl FfiChangeEventResult {
    /// Build a success result carrying the parsed response.
    pub(crate) fn ok(response: ChangeEventResponse) -> *mut Self {
        Box::into_raw(Box::new(FfiChangeEventResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            data: FfiChangeEventResponse::from_core(response),
        }))
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let msg = err.to_string();
        let http_status = err.status().unwrap_or(0);
        let (error_code, data) = match err {
            ApiError::MissingEndpoint => (FfiErrorCode::MissingEndpoint, std::ptr::null_mut()),
            ApiError::Http { .. } => (FfiErrorCode::Http, std::ptr::null_mut()),
            ApiError::Rejected { response, .. } => (
                FfiErrorCode::Rejected,
                FfiChangeEventResponse::from_core(response),
            ),
            ApiError::Deserialization(_) => (FfiErrorCode::Deserialization, std::ptr::null_mut()),
            ApiError::Serialization(_) => (FfiErrorCode::Serialization, std::ptr::null_mut()),
            ApiError::Transport(_) => (FfiErrorCode::Transport, std::ptr::null_mut()),
        };

        Box::into_raw(Box::new(FfiChangeEventResult {
            error_code,
            error_message: to_c_string(msg),
            http_status,
            data,
        }))
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, &format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, msg)
    }

    fn failure(error_code: FfiErrorCode, msg: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiChangeEventResult {
            error_code,
            error_message: to_c_string(msg),
            http_status: 0,
            data: std::ptr::null_mut(),
        }))
    }
}

/// Free an `FfiChangeEventResponse` and every string it owns.
///
/// # Safety
/// `response` must come from `FfiChangeEventResponse::from_core` and must
/// not be used afterwards.
pub(crate) unsafe fn free_response(response: *mut FfiChangeEventResponse) {
    if response.is_null() {
        return;
    }
    let response = unsafe { Box::from_raw(response) };
    free_c_string(response.status);
    free_c_string(response.message);
    if !response.errors.is_null() && response.errors_len > 0 {
        let errors = unsafe {
            Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                response.errors,
                response.errors_len as usize,
            ))
        };
        for e in errors.iter() {
            free_c_string(*e);
        }
    }
}

pub(crate) fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}
