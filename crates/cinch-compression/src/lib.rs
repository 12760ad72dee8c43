//! Compression middleware for Cinch
//!
//! Compresses outgoing responses after the rest of the chain has run:
//! - gzip (preferred) or deflate, negotiated from Accept-Encoding
//! - friendly [`CompressLevel`] mapped onto the engine's integer scale
//! - optional per-request exclusion predicate
//! - configuration files in YAML, TOML, or JSON
//!
//! ```no_run
//! use cinch_compression::{CompressLevel, CompressionConfig, CompressionMiddleware};
//!
//! let middleware = CompressionMiddleware::new(Some(
//!     CompressionConfig::default()
//!         .with_level(CompressLevel::BestCompression)
//!         .with_exclude(|ctx, _| ctx.path() == "/raw"),
//! ));
//! assert_eq!(middleware.engine_level(), 9);
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod compressor;
pub mod config;
pub mod level;
pub mod loader;
pub mod middleware;

pub use compressor::{CompressHandler, CompressionAlgorithm, Compressor};
pub use config::{CompressionConfig, ExcludeFn};
pub use level::{engine_level_from_raw, CompressLevel};
pub use loader::{load_from_file, load_from_str, ConfigFormat};
pub use middleware::CompressionMiddleware;
