//! Configuration for compression middleware

use crate::level::CompressLevel;
use cinch_core::{Body, RequestContext};
use http::Response;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Predicate deciding whether a request skips compression.
///
/// Called after the rest of the chain has run, with the request snapshot and
/// the response produced downstream.
pub type ExcludeFn = Arc<dyn Fn(&RequestContext, &Response<Body>) -> bool + Send + Sync>;

/// Compression configuration
///
/// The default has no exclusion predicate and uses
/// [`CompressLevel::DefaultCompression`].
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// Skip compression for requests where this returns `true`.
    /// Code-only; never read from configuration files.
    #[serde(skip)]
    pub exclude: Option<ExcludeFn>,

    /// Compression level
    #[serde(default)]
    pub level: CompressLevel,
}

impl CompressionConfig {
    /// Resolve zero or more candidate configurations into one.
    ///
    /// The first candidate wins; the rest are ignored. With no candidates the
    /// default configuration is used.
    pub fn resolve<I>(configs: I) -> Self
    where
        I: IntoIterator<Item = CompressionConfig>,
    {
        configs.into_iter().next().unwrap_or_default()
    }

    /// Set the compression level
    pub fn with_level(mut self, level: CompressLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the exclusion predicate
    pub fn with_exclude<F>(mut self, exclude: F) -> Self
    where
        F: Fn(&RequestContext, &Response<Body>) -> bool + Send + Sync + 'static,
    {
        self.exclude = Some(Arc::new(exclude));
        self
    }

    /// Whether the request is opted out of compression
    pub fn is_excluded(&self, ctx: &RequestContext, response: &Response<Body>) -> bool {
        self.exclude
            .as_ref()
            .is_some_and(|exclude| exclude(ctx, response))
    }
}

impl fmt::Debug for CompressionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressionConfig")
            .field("exclude", &self.exclude.as_ref().map(|_| "<fn>"))
            .field("level", &self.level)
            .finish()
    }
}
