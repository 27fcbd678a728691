//! Configuration for ARG dataset creation.

use serde::{Deserialize, Serialize};

/// Configuration for writing ARG datasets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgConfig {
    /// Allow create/copy to replace an existing `.arg`/`.json` pair.
    pub overwrite: bool,

    /// Maximum number of rows a block copy buffers before writing them out.
    pub copy_chunk_rows: usize,
}

impl Default for ArgConfig {
    fn default() -> Self {
        Self {
            overwrite: true,
            copy_chunk_rows: 256,
        }
    }
}

impl ArgConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("ARG_OVERWRITE") {
            config.overwrite = parse_bool(&val);
        }

        if let Ok(val) = std::env::var("ARG_COPY_CHUNK_ROWS") {
            if let Ok(rows) = val.parse() {
                config.copy_chunk_rows = rows;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.copy_chunk_rows == 0 {
            return Err("copy_chunk_rows must be > 0".to_string());
        }

        Ok(())
    }
}

fn parse_bool(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ArgConfig::default();
        assert!(config.overwrite);
        assert_eq!(config.copy_chunk_rows, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = ArgConfig {
            copy_chunk_rows: 0,
            ..ArgConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("1"));
        assert!(!parse_bool("no"));
        assert!(!parse_bool("0"));
    }
}
