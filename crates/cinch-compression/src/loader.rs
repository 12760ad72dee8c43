//! Configuration loading from YAML, TOML, or JSON

use crate::config::CompressionConfig;
use cinch_core::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::Path;

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format
    Yaml,
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::Config("Unable to detect config format".to_string()))?;

        match ext {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            _ => Err(Error::Config(format!("Unsupported config format: {ext}"))),
        }
    }
}

/// Load configuration from a file
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<CompressionConfig> {
    let path = path.as_ref();

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    let format = ConfigFormat::from_path(path)?;

    let config = load_from_str(&content, format)?;
    tracing::debug!(path = %path.display(), level = %config.level, "Compression config loaded");
    Ok(config)
}

/// Load configuration from a string
pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<CompressionConfig> {
    let expanded = expand_env_vars(content)?;

    let config = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(&expanded)
            .map_err(|e| Error::Serialization(format!("Failed to parse YAML: {e}")))?,
        ConfigFormat::Toml => toml::from_str(&expanded)
            .map_err(|e| Error::Serialization(format!("Failed to parse TOML: {e}")))?,
        ConfigFormat::Json => serde_json::from_str(&expanded)
            .map_err(|e| Error::Serialization(format!("Failed to parse JSON: {e}")))?,
    };

    Ok(config)
}

/// Expand `${VAR}` and `${VAR:-default}` references
fn expand_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]*))?\}")
        .map_err(|e| Error::Config(format!("Invalid regex: {e}")))?;

    let mut result = String::with_capacity(content.len());
    let mut last_match = 0;

    for cap in re.captures_iter(content) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let var_name = var_name.as_str();

        let value = match (env::var(var_name), cap.get(3)) {
            (Ok(val), _) => val,
            (Err(_), Some(default)) => default.as_str().to_string(),
            (Err(_), None) => {
                return Err(Error::Config(format!(
                    "Environment variable '{var_name}' not set and no default provided"
                )));
            }
        };

        result.push_str(&content[last_match..full_match.start()]);
        result.push_str(&value);
        last_match = full_match.end();
    }

    result.push_str(&content[last_match..]);

    Ok(result)
}
