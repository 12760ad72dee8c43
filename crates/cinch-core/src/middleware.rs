//! Middleware trait and the handler chain

use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Body type alias
pub type Body = Full<Bytes>;

/// Middleware trait for request/response processing
#[async_trait]
pub trait Middleware: Send + Sync + fmt::Debug {
    /// Process a request
    ///
    /// # Arguments
    ///
    /// * `req` - The incoming HTTP request
    /// * `next` - The rest of the chain, ending in the final handler
    ///
    /// # Returns
    ///
    /// Returns the HTTP response or an error
    async fn call(&self, req: Request<Body>, next: Next) -> Result<Response<Body>>;
}

/// Boxed future returned by a [`HandlerFn`]
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Response<Body>>> + Send>>;

/// Type alias for the final handler function
pub type HandlerFn = Box<dyn Fn(Request<Body>) -> HandlerFuture + Send + Sync>;

/// Box an async closure into a [`HandlerFn`]
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response<Body>>> + Send + 'static,
{
    Box::new(move |req| Box::pin(f(req)))
}

/// Represents the next middleware/handler in the chain
pub struct Next {
    middleware_stack: Arc<[Arc<dyn Middleware>]>,
    index: usize,
    final_handler: Option<Arc<HandlerFn>>,
}

impl Next {
    /// Create a new Next from a middleware stack
    pub fn new(middleware_stack: Arc<[Arc<dyn Middleware>]>) -> Self {
        Self {
            middleware_stack,
            index: 0,
            final_handler: None,
        }
    }

    /// Create a new Next with a final handler
    pub fn with_handler(middleware_stack: Arc<[Arc<dyn Middleware>]>, handler: HandlerFn) -> Self {
        Self {
            middleware_stack,
            index: 0,
            final_handler: Some(Arc::new(handler)),
        }
    }

    /// Run the next middleware or final handler
    pub async fn run(self, req: Request<Body>) -> Result<Response<Body>> {
        if let Some(middleware) = self.middleware_stack.get(self.index) {
            let next = Self {
                middleware_stack: Arc::clone(&self.middleware_stack),
                index: self.index + 1,
                final_handler: self.final_handler.clone(),
            };
            middleware.call(req, next).await
        } else if let Some(handler) = self.final_handler {
            handler(req).await
        } else {
            Err(Error::Internal(
                "Middleware chain completed without handler".to_string(),
            ))
        }
    }
}

impl Clone for Next {
    fn clone(&self) -> Self {
        Self {
            middleware_stack: Arc::clone(&self.middleware_stack),
            index: self.index,
            final_handler: self.final_handler.clone(),
        }
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("index", &self.index)
            .field(
                "remaining",
                &self.middleware_stack.len().saturating_sub(self.index),
            )
            .field("has_handler", &self.final_handler.is_some())
            .finish()
    }
}
