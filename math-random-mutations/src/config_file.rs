//! JSON/TOML settings files for the optimizer.
//!
//! Every field is optional in the file and falls back to the same default
//! as [`RMConfig::default`](crate::RMConfig). Only the callback cannot be
//! expressed in a file.
//!
//! ## Example TOML settings
//!
//! ```toml
//! n_pop = 30
//! n_des = 8
//! p_min = -8
//! p_max = 1
//! max_iter = 2000
//! seed = 7
//!
//! [parallel]
//! enabled = true
//! granularity = "slots"
//! ```

use std::fs;
use std::path::Path;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::parallel_eval::{Granularity, ParallelConfig};
use crate::{RMConfig, Result};

/// Serializable optimizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RMSettings {
    /// Initial guess
    #[serde(default)]
    pub x0: Option<Vec<f64>>,
    /// Mutation scale
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Population size
    #[serde(default = "default_n_pop")]
    pub n_pop: usize,
    /// Descendants per population member
    #[serde(default = "default_n_des")]
    pub n_des: usize,
    /// Largest mutation power
    #[serde(default = "default_p_max")]
    pub p_max: i32,
    /// Smallest mutation power
    #[serde(default = "default_p_min")]
    pub p_min: i32,
    /// Maximum mutations per descendant
    #[serde(default = "default_max_mut")]
    pub max_mut: usize,
    /// Stalled iterations before stopping
    #[serde(default = "default_n_stall")]
    pub n_stall: usize,
    /// Stall threshold
    #[serde(default = "default_eps")]
    pub eps: f64,
    /// Iteration cap
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// Ancestor competes with its descendants
    #[serde(default = "default_true")]
    pub include_ancestor: bool,
    /// Base of the power law
    #[serde(default = "default_base")]
    pub base: f64,
    /// Random seed
    #[serde(default)]
    pub seed: Option<u64>,
    /// Progress table on stderr
    #[serde(default)]
    pub disp: bool,
    /// Multiline progress table
    #[serde(default = "default_true")]
    pub disp_multiline: bool,
    /// Parallel evaluation
    #[serde(default)]
    pub parallel: ParallelSettings,
}

/// Serializable parallel evaluation settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParallelSettings {
    /// Enable parallel evaluation
    #[serde(default)]
    pub enabled: bool,
    /// Unit of parallel work
    #[serde(default)]
    pub granularity: Granularity,
    /// Number of threads (rayon default when absent)
    #[serde(default)]
    pub num_threads: Option<usize>,
}

fn default_scale() -> f64 {
    1.0
}
fn default_n_pop() -> usize {
    50
}
fn default_n_des() -> usize {
    10
}
fn default_p_max() -> i32 {
    2
}
fn default_p_min() -> i32 {
    -10
}
fn default_max_mut() -> usize {
    5
}
fn default_n_stall() -> usize {
    10
}
fn default_eps() -> f64 {
    1e-6
}
fn default_max_iter() -> usize {
    1000
}
fn default_base() -> f64 {
    10.0
}
fn default_true() -> bool {
    true
}

impl Default for RMSettings {
    fn default() -> Self {
        Self::from_config(&RMConfig::default())
    }
}

impl RMSettings {
    /// Captures every serializable option of `config`.
    pub fn from_config(config: &RMConfig) -> Self {
        Self {
            x0: config.x0.as_ref().map(|x| x.to_vec()),
            scale: config.scale,
            n_pop: config.n_pop,
            n_des: config.n_des,
            p_max: config.p_max,
            p_min: config.p_min,
            max_mut: config.max_mut,
            n_stall: config.n_stall,
            eps: config.eps,
            max_iter: config.max_iter,
            include_ancestor: config.include_ancestor,
            base: config.base,
            seed: config.seed,
            disp: config.disp,
            disp_multiline: config.disp_multiline,
            parallel: ParallelSettings {
                enabled: config.parallel.enabled,
                granularity: config.parallel.granularity,
                num_threads: config.parallel.num_threads,
            },
        }
    }

    /// Builds a validated optimizer configuration (without callback).
    ///
    /// # Errors
    ///
    /// Returns `RMError::InvalidConfiguration` if a value is out of range.
    pub fn to_config(&self) -> Result<RMConfig> {
        let config = RMConfig {
            x0: self.x0.clone().map(Array1::from),
            scale: self.scale,
            n_pop: self.n_pop,
            n_des: self.n_des,
            p_max: self.p_max,
            p_min: self.p_min,
            max_mut: self.max_mut,
            n_stall: self.n_stall,
            eps: self.eps,
            max_iter: self.max_iter,
            include_ancestor: self.include_ancestor,
            base: self.base,
            callback: None,
            seed: self.seed,
            disp: self.disp,
            disp_multiline: self.disp_multiline,
            parallel: ParallelConfig {
                enabled: self.parallel.enabled,
                granularity: self.parallel.granularity,
                num_threads: self.parallel.num_threads,
            },
        };
        config.validate()?;
        Ok(config)
    }
}

/// Settings file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format
    Json,
    /// TOML format
    Toml,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?;
        match ext.to_lowercase().as_str() {
            "json" => Some(ConfigFormat::Json),
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }
}

/// Settings file error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Serialize error
    #[error("Serialize error: {0}")]
    SerializeError(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Load settings from a file
///
/// Format is auto-detected from file extension (.json or .toml)
pub fn load_settings<P: AsRef<Path>>(path: P) -> std::result::Result<RMSettings, ConfigError> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)
        .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;
    let content = fs::read_to_string(path)?;
    parse_settings(&content, format)
}

/// Parse settings from a string
pub fn parse_settings(
    content: &str,
    format: ConfigFormat,
) -> std::result::Result<RMSettings, ConfigError> {
    match format {
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
        }
        ConfigFormat::Toml => {
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
        }
    }
}

/// Save settings to a file
pub fn save_settings<P: AsRef<Path>>(
    settings: &RMSettings,
    path: P,
) -> std::result::Result<(), ConfigError> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)
        .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;
    let content = serialize_settings(settings, format)?;
    fs::write(path, content)?;
    Ok(())
}

/// Serialize settings to a string
pub fn serialize_settings(
    settings: &RMSettings,
    format: ConfigFormat,
) -> std::result::Result<String, ConfigError> {
    match format {
        ConfigFormat::Json => serde_json::to_string_pretty(settings)
            .map_err(|e| ConfigError::SerializeError(e.to_string())),
        ConfigFormat::Toml => {
            toml::to_string_pretty(settings).map_err(|e| ConfigError::SerializeError(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TOML: &str = r#"
n_pop = 30
n_des = 8
p_min = -8
p_max = 1
seed = 7

[parallel]
enabled = true
granularity = "descendants"
"#;

    const SAMPLE_JSON: &str = r#"{
    "x0": [0.5, -0.5],
    "scale": 0.25,
    "max_iter": 200,
    "include_ancestor": false
}"#;

    #[test]
    fn test_parse_toml_with_defaults() {
        let s = parse_settings(SAMPLE_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(s.n_pop, 30);
        assert_eq!(s.n_des, 8);
        assert_eq!((s.p_min, s.p_max), (-8, 1));
        assert_eq!(s.seed, Some(7));
        assert!(s.parallel.enabled);
        assert_eq!(s.parallel.granularity, Granularity::Descendants);
        // untouched fields keep their defaults
        assert_eq!(s.max_mut, 5);
        assert_eq!(s.n_stall, 10);
        assert!(s.include_ancestor);
        assert!((s.base - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_json_to_config() {
        let s = parse_settings(SAMPLE_JSON, ConfigFormat::Json).unwrap();
        let cfg = s.to_config().unwrap();
        assert_eq!(cfg.x0.as_ref().unwrap().len(), 2);
        assert!((cfg.scale - 0.25).abs() < 1e-12);
        assert_eq!(cfg.max_iter, 200);
        assert!(!cfg.include_ancestor);
        assert!(cfg.callback.is_none());
        assert_eq!(cfg.n_pop, 50);
    }

    #[test]
    fn test_empty_document_is_default() {
        let s = parse_settings("{}", ConfigFormat::Json).unwrap();
        assert_eq!(s, RMSettings::default());
        let s = parse_settings("", ConfigFormat::Toml).unwrap();
        assert_eq!(s, RMSettings::default());
    }

    #[test]
    fn test_serialize_and_reparse() {
        let s = parse_settings(SAMPLE_TOML, ConfigFormat::Toml).unwrap();
        for format in [ConfigFormat::Json, ConfigFormat::Toml] {
            let text = serialize_settings(&s, format).unwrap();
            assert_eq!(parse_settings(&text, format).unwrap(), s);
        }
    }

    #[test]
    fn test_invalid_values_rejected_by_to_config() {
        let s = parse_settings(r#"{"n_des": 0}"#, ConfigFormat::Json).unwrap();
        assert!(s.to_config().unwrap_err().is_config_error());
    }

    #[test]
    fn test_config_debug_hides_callback() {
        let mut config = RMSettings::default().to_config().unwrap();
        config.callback = Some(Box::new(|s: &crate::OuterStatus| s.iteration.to_string()));
        let text = format!("{config:?}");
        assert!(text.starts_with("RMConfig"));
        assert!(text.contains("n_pop: 50"));
        assert!(text.contains("callback: true"));
    }

    #[test]
    fn test_parse_error() {
        let err = parse_settings("n_pop = \"many\"", ConfigFormat::Toml).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path("a/b.JSON"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_path("rm.toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_path("rm.yaml"), None);
        assert!(matches!(
            load_settings("settings.yaml").unwrap_err(),
            ConfigError::UnsupportedFormat(_)
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("rm_settings_{}.toml", std::process::id()));
        let s = RMSettings {
            n_pop: 12,
            seed: Some(3),
            ..RMSettings::default()
        };
        save_settings(&s, &path).unwrap();
        let back = load_settings(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(back, s);
    }
}
