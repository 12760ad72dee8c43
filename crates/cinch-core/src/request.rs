//! Request context and utilities

use http::{HeaderMap, Method, Request, Uri, Version};
use uuid::Uuid;

/// Header carrying a caller-supplied request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Snapshot of a request, kept by middleware that must inspect the request
/// after it has been handed to the rest of the chain.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique request ID for tracing
    pub request_id: String,

    /// HTTP method
    pub method: Method,

    /// Request URI
    pub uri: Uri,

    /// HTTP version
    pub version: Version,

    /// Request headers
    pub headers: HeaderMap,
}

impl RequestContext {
    /// Capture a context from a request.
    ///
    /// Reuses the `x-request-id` header when the caller sent one, otherwise a
    /// fresh UUID is generated.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let request_id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            request_id,
            method: req.method().clone(),
            uri: req.uri().clone(),
            version: req.version(),
            headers: req.headers().clone(),
        }
    }

    /// Request path
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Get a header value as a string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
