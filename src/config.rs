//! Editor configuration module.
//!
//! Handles loading and validating `darkroom.toml`. Every key has a default,
//! so the file only needs the keys it changes.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [batch]
//! concurrency = 3           # Operations in flight at once
//!
//! [output]
//! quality = 90              # JPEG quality when an operation gives none (1-100)
//!
//! [filter]
//! intensity = 100           # Filter strength when --intensity is omitted (0-100)
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::batch::DEFAULT_CONCURRENCY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the config directory.
pub const CONFIG_FILE: &str = "darkroom.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Editor configuration loaded from `darkroom.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    pub batch: BatchConfig,
    pub output: OutputConfig,
    pub filter: FilterConfig,
    pub processing: ProcessingConfig,
}

impl EditorConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch.concurrency == 0 {
            return Err(ConfigError::Validation(
                "batch.concurrency must be at least 1".into(),
            ));
        }
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if !(0.0..=100.0).contains(&self.filter.intensity) {
            return Err(ConfigError::Validation(
                "filter.intensity must be 0-100".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { quality: 90 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    pub intensity: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { intensity: 100.0 }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers. When absent, defaults to the
    /// number of CPU cores. Values larger than the core count are clamped.
    pub max_processes: Option<usize>,
}

impl ProcessingConfig {
    /// Worker count for the rayon pool: `max_processes` capped at the core
    /// count, or every core when unset.
    pub fn effective_threads(&self) -> usize {
        let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
        match self.max_processes {
            Some(n) => n.min(cores),
            None => cores,
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Parse and validate config text. Missing keys take their defaults.
pub fn parse_config(content: &str) -> Result<EditorConfig, ConfigError> {
    let config: EditorConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load `dir/darkroom.toml`, or the defaults when there is no such file.
pub fn load_config(dir: &Path) -> Result<EditorConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(EditorConfig::default());
    }
    parse_config(&fs::read_to_string(path)?)
}

/// A documented `darkroom.toml` with every key at its default.
pub fn stock_config_toml() -> &'static str {
    r##"# Darkroom Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Batch processing
# ---------------------------------------------------------------------------
[batch]
# Maximum number of operations in flight at once. Operations run in
# consecutive groups of this size; a group starts when the previous one ends.
concurrency = 3

# ---------------------------------------------------------------------------
# Output encoding
# ---------------------------------------------------------------------------
[output]
# JPEG quality (1 = worst, 100 = best) used when an operation sets none.
# PNG and WebP output is lossless and ignores it.
quality = 90

# ---------------------------------------------------------------------------
# Filters
# ---------------------------------------------------------------------------
[filter]
# Strength used by `darkroom filter` when --intensity is omitted.
# 0 leaves the image untouched, 100 applies the preset fully.
intensity = 100.0

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = EditorConfig::default();
        assert_eq!(config.batch.concurrency, 3);
        assert_eq!(config.output.quality, 90);
        assert_eq!(config.filter.intensity, 100.0);
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[output]
quality = 70
"#;
        let config: EditorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.output.quality, 70);
        // Defaults preserved
        assert_eq!(config.batch.concurrency, 3);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let toml = r#"
[batch]
concurency = 4
"#;
        let result: Result<EditorConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_section_is_rejected() {
        let result: Result<EditorConfig, _> = toml::from_str("[colors]\nbackground = \"#fff\"\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // validate
    // =========================================================================

    #[test]
    fn validate_default_is_ok() {
        assert!(EditorConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = EditorConfig::default();
        config.batch.concurrency = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_quality_out_of_range() {
        for quality in [0, 101] {
            let mut config = EditorConfig::default();
            config.output.quality = quality;
            assert!(config.validate().is_err(), "quality {quality}");
        }
    }

    #[test]
    fn validate_rejects_intensity_out_of_range() {
        let mut config = EditorConfig::default();
        config.filter.intensity = 150.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_processes() {
        let mut config = EditorConfig::default();
        config.processing.max_processes = Some(0);
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // loading
    // =========================================================================

    #[test]
    fn load_config_without_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE),
            "[batch]\nconcurrency = 8\n[processing]\nmax_processes = 2\n",
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.batch.concurrency, 8);
        assert_eq!(config.processing.max_processes, Some(2));
        assert_eq!(config.output.quality, 90);
    }

    #[test]
    fn load_config_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[batch\n").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[output]\nquality = 0\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn parse_config_validates() {
        assert!(parse_config("[batch]\nconcurrency = 2\n").is_ok());
        assert!(matches!(
            parse_config("[batch]\nconcurrency = 0\n"),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn parse_config_empty_is_default() {
        assert_eq!(parse_config("").unwrap(), EditorConfig::default());
    }

    // =========================================================================
    // stock config / threads
    // =========================================================================

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let config: EditorConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(ProcessingConfig::default().effective_threads(), cores);
    }

    #[test]
    fn effective_threads_capped_at_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(cores + 64),
        };
        assert_eq!(config.effective_threads(), cores);
    }

    #[test]
    fn effective_threads_constrained_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(config.effective_threads(), 1);
    }
}
