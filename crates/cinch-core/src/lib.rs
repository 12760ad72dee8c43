//! # Cinch Core
//!
//! Core types, traits, and error handling shared by the Cinch crates.
//!
//! This crate provides the pipeline abstractions a middleware plugs into:
//! - Middleware trait and the `Next` chain
//! - Per-request context snapshot
//! - Response builder
//! - Error types

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod error;
pub mod middleware;
pub mod request;
pub mod response;

pub use error::{Error, Result};
pub use middleware::{handler_fn, Body, HandlerFn, Middleware, Next};
pub use request::RequestContext;
pub use response::ResponseBuilder;

// Re-export commonly used HTTP types
pub use bytes::Bytes;
pub use http::{Method, Request, Response, StatusCode};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::middleware::{handler_fn, Body, HandlerFn, Middleware, Next};
    pub use crate::request::RequestContext;
    pub use crate::response::{responses, ResponseBuilder};
}
