//! Compression middleware implementation

use crate::compressor::CompressHandler;
use crate::config::CompressionConfig;
use async_trait::async_trait;
use cinch_core::middleware::{Body, Middleware, Next};
use cinch_core::{RequestContext, Result};
use http::{header, Request, Response};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, Instrument, Level, Span};

/// Compression middleware
///
/// Runs the rest of the chain first, then hands the response to a
/// [`CompressHandler`] unless the configured exclusion predicate opts the
/// request out.
#[derive(Clone)]
pub struct CompressionMiddleware {
    config: Arc<CompressionConfig>,
    handler: Arc<CompressHandler>,
}

impl CompressionMiddleware {
    /// Create a new compression middleware.
    ///
    /// `None` uses [`CompressionConfig::default`]: no exclusion predicate and
    /// the default compression level.
    pub fn new(config: Option<CompressionConfig>) -> Self {
        Self::from_configs(config)
    }

    /// Create a middleware from candidate configurations; only the first is used
    pub fn from_configs<I>(configs: I) -> Self
    where
        I: IntoIterator<Item = CompressionConfig>,
    {
        let config = CompressionConfig::resolve(configs);
        let handler = CompressHandler::new(config.level.engine_level());

        info!(
            level = %config.level,
            engine_level = handler.level(),
            exclude = config.exclude.is_some(),
            "Compression middleware enabled"
        );

        Self {
            config: Arc::new(config),
            handler: Arc::new(handler),
        }
    }

    /// Effective configuration
    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Engine level the shared handler compresses with
    pub fn engine_level(&self) -> i32 {
        self.handler.level()
    }
}

impl Default for CompressionMiddleware {
    fn default() -> Self {
        Self::new(None)
    }
}

impl fmt::Debug for CompressionMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressionMiddleware")
            .field("level", &self.config.level)
            .field("engine_level", &self.handler.level())
            .field("exclude", &self.config.exclude.is_some())
            .finish()
    }
}

#[async_trait]
impl Middleware for CompressionMiddleware {
    async fn call(&self, req: Request<Body>, next: Next) -> Result<Response<Body>> {
        let accept_encoding = req.headers().get(header::ACCEPT_ENCODING).cloned();
        // Snapshot only when a predicate or the debug span will read it.
        let ctx = (self.config.exclude.is_some() || tracing::enabled!(Level::DEBUG))
            .then(|| RequestContext::from_request(&req));

        let response = next.run(req).await?;

        if let Some(ctx) = ctx
            .as_ref()
            .filter(|ctx| self.config.is_excluded(ctx, &response))
        {
            debug!(
                request_id = %ctx.request_id,
                path = ctx.path(),
                "Request excluded from compression"
            );
            return Ok(response);
        }

        let span = match &ctx {
            Some(ctx) => tracing::debug_span!("compress", request_id = %ctx.request_id),
            None => Span::none(),
        };
        let accept_encoding = accept_encoding.as_ref().and_then(|v| v.to_str().ok());
        Ok(self
            .handler
            .apply(accept_encoding, response)
            .instrument(span)
            .await)
    }
}
