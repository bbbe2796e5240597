//! Service configuration – `~/.tfmesh/config.toml` plus `TFMESH_*` overrides.
//!
//! Every field has a default, so an empty or missing file is valid.
//!
//! ```toml
//! history_capacity = 100
//! max_staleness_ms = 1000   # 0 = no limit
//! policy = "interpolate"    # or "nearest"
//! legacy_enabled = true
//! current_enabled = true
//! tf_topic = "/tf"
//! tf_static_topic = "/tf_static"
//! legacy_topic = "/tf"        # a separate topic lets both dialects run
//! dynamic_queue_depth = 10
//! static_queue_depth = 1
//! legacy_queue_depth = 10
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tfmesh_graph::{
    DEFAULT_HISTORY_CAPACITY, DEFAULT_MAX_STALENESS_MS, GraphOptions, ResolutionPolicy,
};
use tfmesh_middleware::feed::{
    CurrentFeedConfig, DEFAULT_DYNAMIC_QUEUE_DEPTH, DEFAULT_STATIC_QUEUE_DEPTH,
    DEFAULT_TF_STATIC_TOPIC, DEFAULT_TF_TOPIC, LegacyFeedConfig,
};
use tfmesh_types::TfError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl From<ConfigError> for TfError {
    fn from(e: ConfigError) -> Self {
        TfError::Config(e.to_string())
    }
}

/// Settings of one transform service process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfConfig {
    /// Records retained per directed edge.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// How far (ms) past an edge's newest record a lookup may still use it.
    /// `0` disables the limit.
    #[serde(default = "default_max_staleness_ms")]
    pub max_staleness_ms: u64,

    #[serde(default)]
    pub policy: ResolutionPolicy,

    #[serde(default = "default_true")]
    pub legacy_enabled: bool,

    #[serde(default = "default_true")]
    pub current_enabled: bool,

    #[serde(default = "default_tf_topic")]
    pub tf_topic: String,

    #[serde(default = "default_tf_static_topic")]
    pub tf_static_topic: String,

    /// Topic of the legacy feed.  Sharing `tf_topic` leaves the legacy feed
    /// disabled whenever the current feed is enabled.
    #[serde(default = "default_tf_topic")]
    pub legacy_topic: String,

    #[serde(default = "default_dynamic_queue_depth")]
    pub dynamic_queue_depth: usize,

    #[serde(default = "default_static_queue_depth")]
    pub static_queue_depth: usize,

    #[serde(default = "default_dynamic_queue_depth")]
    pub legacy_queue_depth: usize,
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}
fn default_max_staleness_ms() -> u64 {
    DEFAULT_MAX_STALENESS_MS
}
fn default_true() -> bool {
    true
}
fn default_tf_topic() -> String {
    DEFAULT_TF_TOPIC.to_string()
}
fn default_tf_static_topic() -> String {
    DEFAULT_TF_STATIC_TOPIC.to_string()
}
fn default_dynamic_queue_depth() -> usize {
    DEFAULT_DYNAMIC_QUEUE_DEPTH
}
fn default_static_queue_depth() -> usize {
    DEFAULT_STATIC_QUEUE_DEPTH
}

impl Default for TfConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            max_staleness_ms: default_max_staleness_ms(),
            policy: ResolutionPolicy::default(),
            legacy_enabled: true,
            current_enabled: true,
            tf_topic: default_tf_topic(),
            tf_static_topic: default_tf_static_topic(),
            legacy_topic: default_tf_topic(),
            dynamic_queue_depth: default_dynamic_queue_depth(),
            static_queue_depth: default_static_queue_depth(),
            legacy_queue_depth: default_dynamic_queue_depth(),
        }
    }
}

impl TfConfig {
    pub fn graph_options(&self) -> GraphOptions {
        GraphOptions {
            history_capacity: self.history_capacity,
            policy: self.policy,
            max_staleness_ms: (self.max_staleness_ms > 0).then_some(self.max_staleness_ms),
        }
    }

    pub fn legacy_feed(&self) -> LegacyFeedConfig {
        LegacyFeedConfig {
            topic: self.legacy_topic.clone(),
            queue_depth: self.legacy_queue_depth,
        }
    }

    pub fn current_feed(&self) -> CurrentFeedConfig {
        CurrentFeedConfig {
            dynamic_topic: self.tf_topic.clone(),
            static_topic: self.tf_static_topic.clone(),
            dynamic_queue_depth: self.dynamic_queue_depth,
            static_queue_depth: self.static_queue_depth,
        }
    }

    /// Every topic an enabled feed listens on.
    pub fn transform_topics(&self) -> Vec<String> {
        let mut topics = Vec::with_capacity(3);
        if self.current_enabled {
            topics.push(self.tf_topic.clone());
            topics.push(self.tf_static_topic.clone());
        }
        if self.legacy_enabled {
            topics.push(self.legacy_topic.clone());
        }
        topics
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Return the path to `~/.tfmesh/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".tfmesh").join("config.toml")
}

/// Load the config at `path` with environment overrides applied.
/// Returns `None` if the file does not exist.
pub fn load_from(path: &Path) -> Result<Option<TfConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut cfg: TfConfig = toml::from_str(&raw)?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Load `path` (or the default location), falling back to defaults when the
/// file is missing.  Environment overrides apply either way.
pub fn load_or_default(path: Option<&Path>) -> Result<TfConfig, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    match load_from(&path)? {
        Some(cfg) => Ok(cfg),
        None => {
            let mut cfg = TfConfig::default();
            apply_env_overrides(&mut cfg);
            Ok(cfg)
        }
    }
}

/// Apply `TFMESH_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `TFMESH_HISTORY_CAPACITY` | `history_capacity` |
/// | `TFMESH_MAX_STALENESS_MS` | `max_staleness_ms` |
/// | `TFMESH_POLICY` | `policy` |
/// | `TFMESH_LEGACY_ENABLED` | `legacy_enabled` |
/// | `TFMESH_CURRENT_ENABLED` | `current_enabled` |
/// | `TFMESH_TF_TOPIC` | `tf_topic` |
/// | `TFMESH_TF_STATIC_TOPIC` | `tf_static_topic` |
/// | `TFMESH_LEGACY_TOPIC` | `legacy_topic` |
/// | `TFMESH_DYNAMIC_QUEUE_DEPTH` | `dynamic_queue_depth` |
/// | `TFMESH_STATIC_QUEUE_DEPTH` | `static_queue_depth` |
/// | `TFMESH_LEGACY_QUEUE_DEPTH` | `legacy_queue_depth` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut TfConfig) {
    apply_overrides(cfg, |name| std::env::var(name).ok());
}

pub(crate) fn apply_overrides(cfg: &mut TfConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("TFMESH_HISTORY_CAPACITY")
        && let Ok(n) = v.parse::<usize>()
    {
        cfg.history_capacity = n;
    }
    if let Some(v) = var("TFMESH_MAX_STALENESS_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.max_staleness_ms = ms;
    }
    if let Some(policy) = var("TFMESH_POLICY").as_deref().and_then(parse_policy) {
        cfg.policy = policy;
    }
    if let Some(on) = var("TFMESH_LEGACY_ENABLED").as_deref().and_then(parse_bool) {
        cfg.legacy_enabled = on;
    }
    if let Some(on) = var("TFMESH_CURRENT_ENABLED").as_deref().and_then(parse_bool) {
        cfg.current_enabled = on;
    }
    if let Some(v) = var("TFMESH_TF_TOPIC") {
        cfg.tf_topic = v;
    }
    if let Some(v) = var("TFMESH_TF_STATIC_TOPIC") {
        cfg.tf_static_topic = v;
    }
    if let Some(v) = var("TFMESH_LEGACY_TOPIC") {
        cfg.legacy_topic = v;
    }

    let depth = |name: &str| var(name).and_then(|v| v.parse::<usize>().ok());
    if let Some(n) = depth("TFMESH_DYNAMIC_QUEUE_DEPTH") {
        cfg.dynamic_queue_depth = n;
    }
    if let Some(n) = depth("TFMESH_STATIC_QUEUE_DEPTH") {
        cfg.static_queue_depth = n;
    }
    if let Some(n) = depth("TFMESH_LEGACY_QUEUE_DEPTH") {
        cfg.legacy_queue_depth = n;
    }
}

fn parse_policy(value: &str) -> Option<ResolutionPolicy> {
    match value.to_ascii_lowercase().as_str() {
        "interpolate" => Some(ResolutionPolicy::Interpolate),
        "nearest" => Some(ResolutionPolicy::Nearest),
        _ => None,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
