//! Compression levels and their mapping onto the engine scale

use crate::compressor::engine;
use cinch_core::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Friendly compression level
///
/// Raw codes run from -1 to 3 in declaration order, with
/// `DefaultCompression` as the zero value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressLevel {
    /// Store only, no size reduction
    NoCompression,
    /// Balanced speed and ratio
    #[default]
    DefaultCompression,
    /// Fastest encoding
    BestSpeed,
    /// Smallest output
    BestCompression,
    /// Huffman coding without string matching
    HuffmanOnly,
}

impl CompressLevel {
    /// All named levels
    pub const ALL: [CompressLevel; 5] = [
        CompressLevel::NoCompression,
        CompressLevel::DefaultCompression,
        CompressLevel::BestSpeed,
        CompressLevel::BestCompression,
        CompressLevel::HuffmanOnly,
    ];

    /// Raw code of this level
    pub const fn code(self) -> i32 {
        match self {
            CompressLevel::NoCompression => -1,
            CompressLevel::DefaultCompression => 0,
            CompressLevel::BestSpeed => 1,
            CompressLevel::BestCompression => 2,
            CompressLevel::HuffmanOnly => 3,
        }
    }

    /// Level for a raw code, if the code names one
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(CompressLevel::NoCompression),
            0 => Some(CompressLevel::DefaultCompression),
            1 => Some(CompressLevel::BestSpeed),
            2 => Some(CompressLevel::BestCompression),
            3 => Some(CompressLevel::HuffmanOnly),
            _ => None,
        }
    }

    /// Integer level understood by the compression engine
    pub const fn engine_level(self) -> i32 {
        match self {
            CompressLevel::NoCompression => engine::NO_COMPRESSION,
            CompressLevel::DefaultCompression => engine::DEFAULT_COMPRESSION,
            CompressLevel::BestSpeed => engine::BEST_SPEED,
            CompressLevel::BestCompression => engine::BEST_COMPRESSION,
            CompressLevel::HuffmanOnly => engine::HUFFMAN_ONLY,
        }
    }

    /// Snake-case name, as used in configuration files
    pub const fn as_str(self) -> &'static str {
        match self {
            CompressLevel::NoCompression => "no_compression",
            CompressLevel::DefaultCompression => "default_compression",
            CompressLevel::BestSpeed => "best_speed",
            CompressLevel::BestCompression => "best_compression",
            CompressLevel::HuffmanOnly => "huffman_only",
        }
    }
}

/// Map a raw level code onto the engine scale.
///
/// Codes that name no level fall back to the engine default (6).
pub fn engine_level_from_raw(code: i32) -> i32 {
    CompressLevel::from_code(code)
        .map(CompressLevel::engine_level)
        .unwrap_or(engine::DEFAULT_COMPRESSION)
}

impl fmt::Display for CompressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "no_compression" | "none" => Ok(CompressLevel::NoCompression),
            "default_compression" | "default" => Ok(CompressLevel::DefaultCompression),
            "best_speed" | "fastest" => Ok(CompressLevel::BestSpeed),
            "best_compression" | "best" => Ok(CompressLevel::BestCompression),
            "huffman_only" | "huffman" => Ok(CompressLevel::HuffmanOnly),
            other => Err(Error::Config(format!(
                "Unknown compression level '{other}'"
            ))),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLevel {
    Code(i64),
    Name(String),
}

impl<'de> Deserialize<'de> for CompressLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match RawLevel::deserialize(deserializer)? {
            RawLevel::Code(code) => {
                let level = i32::try_from(code).ok().and_then(CompressLevel::from_code);
                Ok(level.unwrap_or_else(|| {
                    tracing::warn!(
                        code,
                        "Unknown compression level code, using default_compression"
                    );
                    CompressLevel::DefaultCompression
                }))
            }
            RawLevel::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_engine_level_table() {
        assert_eq!(CompressLevel::NoCompression.engine_level(), 0);
        assert_eq!(CompressLevel::DefaultCompression.engine_level(), 6);
        assert_eq!(CompressLevel::BestSpeed.engine_level(), 1);
        assert_eq!(CompressLevel::BestCompression.engine_level(), 9);
        assert_eq!(CompressLevel::HuffmanOnly.engine_level(), -2);
    }

    #[test]
    fn test_default_is_zero_code() {
        assert_eq!(CompressLevel::default(), CompressLevel::DefaultCompression);
        assert_eq!(CompressLevel::default().code(), 0);
    }

    #[test]
    fn test_codes_match_named_levels() {
        for level in CompressLevel::ALL {
            assert_eq!(CompressLevel::from_code(level.code()), Some(level));
            assert_eq!(engine_level_from_raw(level.code()), level.engine_level());
        }
    }

    #[test]
    fn test_unknown_code_falls_back_to_default() {
        assert_eq!(engine_level_from_raw(4), 6);
        assert_eq!(engine_level_from_raw(-2), 6);
        assert_eq!(engine_level_from_raw(i32::MAX), 6);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(
            "best_compression".parse::<CompressLevel>().unwrap(),
            CompressLevel::BestCompression
        );
        assert_eq!(
            "Best-Speed".parse::<CompressLevel>().unwrap(),
            CompressLevel::BestSpeed
        );
        assert_eq!(
            "huffman".parse::<CompressLevel>().unwrap(),
            CompressLevel::HuffmanOnly
        );
        assert!("turbo".parse::<CompressLevel>().is_err());
    }

    #[test]
    fn test_serde_names_and_codes() {
        let json = serde_json::to_string(&CompressLevel::BestCompression).unwrap();
        assert_eq!(json, "\"best_compression\"");

        let level: CompressLevel = serde_json::from_str("\"no_compression\"").unwrap();
        assert_eq!(level, CompressLevel::NoCompression);

        let level: CompressLevel = serde_json::from_str("3").unwrap();
        assert_eq!(level, CompressLevel::HuffmanOnly);

        let level: CompressLevel = serde_json::from_str("42").unwrap();
        assert_eq!(level, CompressLevel::DefaultCompression);

        assert!(serde_json::from_str::<CompressLevel>("\"turbo\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_engine_level_is_total(code in any::<i32>()) {
            let level = engine_level_from_raw(code);
            prop_assert!([0, 6, 1, 9, -2].contains(&level));
            if !(-1..=3).contains(&code) {
                prop_assert_eq!(level, 6);
            }
        }
    }
}
