//! Harness configuration (assetcheck.toml)
//!
//! Everything the run needs beyond the command line lives here: the names
//! of the external test executables, the per-invocation timeout, and the
//! trusted-root policy that gates the whole run. The trusted root is
//! injected configuration, not a baked-in constant, so it can be swapped
//! per target version without recompiling.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use crate::digest::Digest;
use crate::invoke::DEFAULT_TIMEOUT_SECONDS;

/// Error types for config operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Names of the external tool executables, resolved inside the tool
/// directory given on the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolNames {
    /// Executable extractor (compiled binary to linked image).
    #[serde(default = "default_extract_tool")]
    pub extract: String,

    /// Compression codec (decode/encode).
    #[serde(default = "default_codec_tool")]
    pub codec: String,

    /// Container packer/unpacker.
    #[serde(default = "default_container_tool")]
    pub container: String,
}

fn default_extract_tool() -> String {
    "rpxtest".to_string()
}

fn default_codec_tool() -> String {
    "yaz0test".to_string()
}

fn default_container_tool() -> String {
    "sarctest".to_string()
}

impl Default for ToolNames {
    fn default() -> Self {
        Self {
            extract: default_extract_tool(),
            codec: default_codec_tool(),
            container: default_container_tool(),
        }
    }
}

/// A file that must match a known digest before any entry runs.
///
/// Typically the game's root executable; a mismatch means the dump has
/// already been modified and the baseline expectations do not apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustedRootPolicy {
    /// Path relative to the game root.
    pub path: String,

    /// Expected SHA-256 of the untouched file.
    pub sha256: Digest,
}

/// Harness configuration from assetcheck.toml.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Deadline for a single tool invocation, in seconds.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// External tool executable names.
    #[serde(default)]
    pub tools: ToolNames,

    /// Optional pre-flight authenticity check for the whole run.
    #[serde(default)]
    pub trusted_root: Option<TrustedRootPolicy>,
}

impl HarnessConfig {
    /// Load and parse config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: HarnessConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configured bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(seconds) = self.timeout_seconds {
            // One day is already absurd for a single decode.
            if seconds == 0 || seconds > 86400 {
                return Err(ConfigError::Validation(format!(
                    "timeout_seconds must be in (0, 86400], got {seconds}"
                )));
            }
        }
        Ok(())
    }

    /// Effective tool timeout, falling back to the built-in default.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_name_the_standard_tools() {
        let config = HarnessConfig::default();
        assert_eq!(config.tools.extract, "rpxtest");
        assert_eq!(config.tools.codec, "yaz0test");
        assert_eq!(config.tools.container, "sarctest");
        assert_eq!(config.timeout(), Duration::from_secs(600));
        assert!(config.trusted_root.is_none());
    }

    #[test]
    fn full_config_round_trips_from_toml() {
        let toml_text = r#"
            timeout_seconds = 120

            [tools]
            extract = "rpxtool"
            codec = "yaz0tool"
            container = "sarctool"

            [trusted_root]
            path = "code/cking.rpx"
            sha256 = "c4f0ab300542e0bfc462696850534e71db2ad02288a7eb55e5a4cd4062f16153"
        "#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(toml_text.as_bytes()).unwrap();

        let config = HarnessConfig::from_file(file.path()).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert_eq!(config.tools.container, "sarctool");
        let root = config.trusted_root.unwrap();
        assert_eq!(root.path, "code/cking.rpx");
    }

    #[test]
    fn partial_tools_table_keeps_other_defaults() {
        let config: HarnessConfig = toml::from_str("[tools]\ncodec = \"lz77test\"\n").unwrap();
        assert_eq!(config.tools.codec, "lz77test");
        assert_eq!(config.tools.extract, "rpxtest");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config: HarnessConfig = toml::from_str("timeout_seconds = 0").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }
}
