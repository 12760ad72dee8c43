//! Compression engine: encoding negotiation and body encoding

use bytes::Bytes;
use cinch_core::Body;
use flate2::Compression;
use http::{header, HeaderMap, HeaderValue, Response};
use http_body_util::BodyExt;
use std::io::{self, Write};
use tracing::{debug, warn};

/// Engine-scale levels and limits
pub mod engine {
    /// Store blocks without compressing
    pub const NO_COMPRESSION: i32 = 0;
    /// Fastest level
    pub const BEST_SPEED: i32 = 1;
    /// Smallest output
    pub const BEST_COMPRESSION: i32 = 9;
    /// Default level
    pub const DEFAULT_COMPRESSION: i32 = 6;
    /// Huffman-only coding
    pub const HUFFMAN_ONLY: i32 = -2;
    /// Zlib's "use the default" sentinel
    pub const ZLIB_DEFAULT: i32 = -1;
    /// Bodies shorter than this are sent as-is
    pub const MIN_COMPRESS_LEN: usize = 200;
}

/// Supported compression algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionAlgorithm {
    /// gzip framing
    Gzip,
    /// zlib framing, advertised as `deflate`
    Deflate,
}

impl CompressionAlgorithm {
    /// Get the Content-Encoding header value
    pub fn encoding_name(&self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Deflate => "deflate",
        }
    }

    /// Parse a single Accept-Encoding token
    pub fn from_token(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gzip" => Some(Self::Gzip),
            "deflate" => Some(Self::Deflate),
            _ => None,
        }
    }
}

/// Stateless body encoder
#[derive(Debug, Clone, Copy)]
pub struct Compressor;

impl Compressor {
    /// Compress data using the specified algorithm and engine level
    pub fn compress(data: &[u8], algorithm: CompressionAlgorithm, level: i32) -> io::Result<Bytes> {
        let compression = flate_level(level);
        let compressed = match algorithm {
            CompressionAlgorithm::Gzip => {
                let mut encoder = flate2::write::GzEncoder::new(Vec::new(), compression);
                encoder.write_all(data)?;
                encoder.finish()?
            }
            CompressionAlgorithm::Deflate => {
                let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), compression);
                encoder.write_all(data)?;
                encoder.finish()?
            }
        };
        Ok(Bytes::from(compressed))
    }

    /// Negotiate an algorithm from the Accept-Encoding header.
    ///
    /// gzip wins over deflate. Tokens with `q=0` are refused.
    pub fn negotiate_algorithm(accept_encoding: Option<&str>) -> Option<CompressionAlgorithm> {
        let accept = accept_encoding?;

        let accepted: Vec<CompressionAlgorithm> = accept
            .split(',')
            .filter_map(|item| {
                let mut parts = item.split(';');
                let algorithm = CompressionAlgorithm::from_token(parts.next()?)?;
                let refused = parts.any(|param| {
                    let Some((name, value)) = param.split_once('=') else {
                        return false;
                    };
                    name.trim().eq_ignore_ascii_case("q")
                        && value.trim().parse::<f32>().is_ok_and(|q| q <= 0.0)
                });
                (!refused).then_some(algorithm)
            })
            .collect();

        [CompressionAlgorithm::Gzip, CompressionAlgorithm::Deflate]
            .into_iter()
            .find(|algo| accepted.contains(algo))
    }
}

/// Translate an engine level into a flate2 setting.
///
/// flate2 has no strategy knob, so Huffman-only runs at the fastest level.
fn flate_level(level: i32) -> Compression {
    match level {
        engine::HUFFMAN_ONLY => Compression::fast(),
        engine::ZLIB_DEFAULT => Compression::default(),
        0..=9 => Compression::new(level.unsigned_abs()),
        _ => Compression::default(),
    }
}

/// Clamp a requested level onto the engine scale
pub fn normalize_level(level: i32) -> i32 {
    if (engine::HUFFMAN_ONLY..=engine::BEST_COMPRESSION).contains(&level) {
        level
    } else {
        engine::DEFAULT_COMPRESSION
    }
}

/// Check if a content type should be compressed
pub fn is_compressible_content_type(content_type: &str) -> bool {
    let ct = content_type.to_lowercase();

    ct.starts_with("text/")
        || ct.contains("json")
        || ct.contains("xml")
        || ct.contains("javascript")
        || ct.starts_with("image/svg+xml")
        || ct.starts_with("application/wasm")
}

/// Compress handler built once from an engine level and shared by all requests.
#[derive(Debug, Clone, Copy)]
pub struct CompressHandler {
    level: i32,
}

impl CompressHandler {
    /// Create a handler; out-of-range levels become the default (6)
    pub fn new(level: i32) -> Self {
        Self {
            level: normalize_level(level),
        }
    }

    /// Engine level this handler encodes with
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Whether the response headers allow compression
    pub fn should_compress(&self, headers: &HeaderMap) -> bool {
        if headers.contains_key(header::CONTENT_ENCODING) {
            return false;
        }

        match headers.get(header::CONTENT_TYPE) {
            Some(ct) => ct.to_str().is_ok_and(is_compressible_content_type),
            None => true,
        }
    }

    /// Compress the response if the client and the response allow it.
    ///
    /// Encoder failures are logged and the original body is returned.
    pub async fn apply(&self, accept_encoding: Option<&str>, response: Response<Body>) -> Response<Body> {
        let Some(algorithm) = Compressor::negotiate_algorithm(accept_encoding) else {
            return response;
        };

        if !self.should_compress(response.headers()) {
            return response;
        }

        let (mut parts, body) = response.into_parts();
        let body_bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };

        if body_bytes.len() < engine::MIN_COMPRESS_LEN {
            return Response::from_parts(parts, Body::new(body_bytes));
        }

        let compressed = match Compressor::compress(&body_bytes, algorithm, self.level) {
            Ok(compressed) => compressed,
            Err(e) => {
                warn!(
                    error = %e,
                    algorithm = algorithm.encoding_name(),
                    "Failed to compress response, returning uncompressed"
                );
                return Response::from_parts(parts, Body::new(body_bytes));
            }
        };

        debug!(
            algorithm = algorithm.encoding_name(),
            level = self.level,
            original_size = body_bytes.len(),
            compressed_size = compressed.len(),
            "Response compressed"
        );

        parts.headers.insert(
            header::CONTENT_ENCODING,
            HeaderValue::from_static(algorithm.encoding_name()),
        );
        parts
            .headers
            .insert(header::CONTENT_LENGTH, HeaderValue::from(compressed.len()));
        parts.headers.remove(header::TRANSFER_ENCODING);
        add_vary_accept_encoding(&mut parts.headers);

        Response::from_parts(parts, Body::new(compressed))
    }
}

impl Default for CompressHandler {
    fn default() -> Self {
        Self::new(engine::DEFAULT_COMPRESSION)
    }
}

fn add_vary_accept_encoding(headers: &mut HeaderMap) {
    let already_varies = headers.get_all(header::VARY).iter().any(|v| {
        v.to_str().is_ok_and(|v| {
            v.split(',')
                .any(|item| item.trim().eq_ignore_ascii_case("accept-encoding") || item.trim() == "*")
        })
    });

    if !already_varies {
        headers.append(header::VARY, HeaderValue::from_static("Accept-Encoding"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::{GzDecoder, ZlibDecoder};
    use std::io::Read;

    fn text_body() -> String {
        "Hello, World! This is a test string that should compress well. ".repeat(100)
    }

    fn response(content_type: Option<&str>, body: String) -> Response<Body> {
        let mut builder = Response::builder();
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn body_bytes(response: Response<Body>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[test]
    fn test_algorithm_encoding_name() {
        assert_eq!(CompressionAlgorithm::Gzip.encoding_name(), "gzip");
        assert_eq!(CompressionAlgorithm::Deflate.encoding_name(), "deflate");
        assert_eq!(CompressionAlgorithm::from_token(" GZIP "), Some(CompressionAlgorithm::Gzip));
        assert_eq!(CompressionAlgorithm::from_token("br"), None);
    }

    #[test]
    fn test_negotiate_algorithm() {
        assert_eq!(
            Compressor::negotiate_algorithm(Some("deflate, gzip")),
            Some(CompressionAlgorithm::Gzip)
        );
        assert_eq!(
            Compressor::negotiate_algorithm(Some("br, deflate")),
            Some(CompressionAlgorithm::Deflate)
        );
        assert_eq!(
            Compressor::negotiate_algorithm(Some("gzip;q=0, deflate;q=0.5")),
            Some(CompressionAlgorithm::Deflate)
        );
        assert_eq!(Compressor::negotiate_algorithm(Some("gzip;Q=0")), None);
        assert_eq!(
            Compressor::negotiate_algorithm(Some("gzip ; Q = 0.0, deflate")),
            Some(CompressionAlgorithm::Deflate)
        );
        assert_eq!(
            Compressor::negotiate_algorithm(Some("gzip;Q=0.8")),
            Some(CompressionAlgorithm::Gzip)
        );
        assert_eq!(Compressor::negotiate_algorithm(Some("br, identity")), None);
        assert_eq!(Compressor::negotiate_algorithm(None), None);
    }

    #[test]
    fn test_normalize_level() {
        assert_eq!(normalize_level(9), 9);
        assert_eq!(normalize_level(-2), -2);
        assert_eq!(normalize_level(-1), -1);
        assert_eq!(normalize_level(10), 6);
        assert_eq!(normalize_level(-3), 6);
        assert_eq!(CompressHandler::new(42).level(), 6);
    }

    #[test]
    fn test_compress_every_level_shrinks_or_stores() {
        let data = text_body();
        for level in [-2, -1, 1, 6, 9] {
            let compressed =
                Compressor::compress(data.as_bytes(), CompressionAlgorithm::Gzip, level).unwrap();
            assert!(compressed.len() < data.len(), "level {level}");
        }

        let stored = Compressor::compress(data.as_bytes(), CompressionAlgorithm::Gzip, 0).unwrap();
        let mut decoded = String::new();
        GzDecoder::new(&stored[..]).read_to_string(&mut decoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_compressible_content_types() {
        assert!(is_compressible_content_type("text/html; charset=utf-8"));
        assert!(is_compressible_content_type("application/json"));
        assert!(is_compressible_content_type("application/javascript"));
        assert!(is_compressible_content_type("image/svg+xml"));

        assert!(!is_compressible_content_type("image/png"));
        assert!(!is_compressible_content_type("video/mp4"));
        assert!(!is_compressible_content_type("application/octet-stream"));
    }

    #[tokio::test]
    async fn test_apply_gzip() {
        let handler = CompressHandler::new(9);
        let data = text_body();

        let result = handler
            .apply(Some("gzip, deflate"), response(Some("text/plain"), data.clone()))
            .await;

        assert_eq!(result.headers()[header::CONTENT_ENCODING], "gzip");
        assert_eq!(result.headers()[header::VARY], "Accept-Encoding");

        let compressed = body_bytes(result).await;
        assert!(compressed.len() < data.len());

        let mut decoded = String::new();
        GzDecoder::new(&compressed[..]).read_to_string(&mut decoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[tokio::test]
    async fn test_apply_deflate() {
        let handler = CompressHandler::default();
        let data = text_body();

        let result = handler.apply(Some("deflate"), response(None, data.clone())).await;
        assert_eq!(result.headers()[header::CONTENT_ENCODING], "deflate");

        let compressed = body_bytes(result).await;
        let mut decoded = String::new();
        ZlibDecoder::new(&compressed[..]).read_to_string(&mut decoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[tokio::test]
    async fn test_apply_skips_small_body() {
        let handler = CompressHandler::default();
        let result = handler
            .apply(Some("gzip"), response(Some("text/plain"), "tiny".to_string()))
            .await;

        assert!(!result.headers().contains_key(header::CONTENT_ENCODING));
        assert_eq!(body_bytes(result).await, Bytes::from("tiny"));
    }

    #[tokio::test]
    async fn test_apply_skips_already_encoded_and_binary() {
        let handler = CompressHandler::default();

        let mut encoded = response(Some("text/plain"), text_body());
        encoded
            .headers_mut()
            .insert(header::CONTENT_ENCODING, HeaderValue::from_static("br"));
        let result = handler.apply(Some("gzip"), encoded).await;
        assert_eq!(result.headers()[header::CONTENT_ENCODING], "br");

        let result = handler
            .apply(Some("gzip"), response(Some("image/png"), text_body()))
            .await;
        assert!(!result.headers().contains_key(header::CONTENT_ENCODING));
    }

    #[tokio::test]
    async fn test_apply_without_accept_encoding() {
        let handler = CompressHandler::default();
        let data = text_body();
        let result = handler.apply(None, response(Some("text/plain"), data.clone())).await;

        assert!(!result.headers().contains_key(header::CONTENT_ENCODING));
        assert_eq!(body_bytes(result).await, Bytes::from(data));
    }

    #[test]
    fn test_vary_not_duplicated() {
        let mut headers = HeaderMap::new();
        headers.insert(header::VARY, HeaderValue::from_static("Origin, accept-encoding"));
        add_vary_accept_encoding(&mut headers);
        assert_eq!(headers.get_all(header::VARY).iter().count(), 1);

        let mut headers = HeaderMap::new();
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));
        add_vary_accept_encoding(&mut headers);
        assert_eq!(headers.get_all(header::VARY).iter().count(), 2);
    }
}
