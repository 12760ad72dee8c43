//! Response builder and utilities

use crate::middleware::Body;
use crate::Result;
use bytes::Bytes;
use http::{header, Response, StatusCode};
use http_body_util::Full;

/// Response builder for convenient response construction
#[derive(Debug)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(header::HeaderName, String)>,
}

impl ResponseBuilder {
    /// Create a new response builder
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
        }
    }

    /// Set a header
    pub fn header(mut self, name: header::HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Build response with empty body
    pub fn build(self) -> Result<Response<Body>> {
        self.bytes(Bytes::new())
    }

    /// Build response with text body
    pub fn text(self, body: impl Into<String>) -> Result<Response<Body>> {
        self.header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .bytes(Bytes::from(body.into()))
    }

    /// Build response with a raw body, leaving Content-Type to the caller
    pub fn bytes(self, body: impl Into<Bytes>) -> Result<Response<Body>> {
        let mut response = Response::builder().status(self.status);

        for (name, value) in self.headers {
            response = response.header(name, value);
        }

        Ok(response.body(Full::new(body.into()))?)
    }
}

/// Convenience functions for common responses
pub mod responses {
    use super::*;

    /// 200 OK
    pub fn ok() -> ResponseBuilder {
        ResponseBuilder::new(StatusCode::OK)
    }

    /// 404 Not Found
    pub fn not_found(message: impl Into<String>) -> Result<Response<Body>> {
        ResponseBuilder::new(StatusCode::NOT_FOUND).text(message)
    }
}
