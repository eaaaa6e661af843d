use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use crate::list::Navigation;
use crate::service::SortMode;

const DEFAULT_ENV_PREFIX: &str = "THREADVIEW";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub ui: UIConfig,
    #[serde(default)]
    pub threads: ThreadConfig,
    #[serde(default)]
    pub lists: ListConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UIConfig {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_tick_rate", with = "humantime_serde")]
    pub tick_rate: Duration,
    #[serde(default)]
    pub rounded_borders: bool,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            tick_rate: default_tick_rate(),
            rounded_borders: false,
        }
    }
}

fn default_theme() -> String {
    "default".into()
}

fn default_tick_rate() -> Duration {
    Duration::from_millis(120)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreadConfig {
    #[serde(default = "default_max_comment_depth")]
    pub max_comment_depth: usize,
    #[serde(default = "default_true")]
    pub auto_expand_replies: bool,
    #[serde(default)]
    pub default_sort: SortMode,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            max_comment_depth: default_max_comment_depth(),
            auto_expand_replies: true,
            default_sort: SortMode::default(),
        }
    }
}

fn default_max_comment_depth() -> usize {
    8
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListConfig {
    #[serde(default = "default_visible_count")]
    pub visible_count: usize,
    #[serde(default)]
    pub wrap_navigation: bool,
    #[serde(default = "default_load_more_threshold")]
    pub load_more_threshold: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            visible_count: default_visible_count(),
            wrap_navigation: false,
            load_more_threshold: default_load_more_threshold(),
        }
    }
}

impl ListConfig {
    pub fn navigation(&self) -> Navigation {
        Navigation::from_wrap(self.wrap_navigation)
    }
}

fn default_visible_count() -> usize {
    10
}

fn default_load_more_threshold() -> usize {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

/// An environment override that was ignored because its value did not parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("ignoring {key}={value:?}: {reason}")]
pub struct OverrideWarning {
    pub key: String,
    pub value: String,
    pub reason: String,
}

/// The loaded config plus any overrides that were skipped. Loading happens
/// before logging is up, so the caller reports the warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: Config,
    pub warnings: Vec<OverrideWarning>,
}

/// Defaults, then the YAML file, then `THREADVIEW_*` environment overrides.
pub fn load(options: LoadOptions) -> Result<LoadedConfig> {
    let mut cfg = Config::default();

    if let Some(path) = options.config_file.as_ref() {
        if path.exists() {
            cfg = read_config_file(path)?;
        }
    } else if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            cfg = read_config_file(&default_path)?;
        }
    }

    let prefix = options.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX);
    let mut warnings = Vec::new();
    for (key, value) in env_overrides(prefix) {
        if let Err(reason) = apply_env_value(&mut cfg, &key, &value) {
            warnings.push(OverrideWarning { key, value, reason });
        }
    }
    warnings.sort_by(|a, b| a.key.cmp(&b.key));

    Ok(LoadedConfig {
        config: cfg,
        warnings,
    })
}

fn read_config_file(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    Ok(config)
}

fn env_overrides(prefix: &str) -> HashMap<String, String> {
    let upper_prefix = format!("{}_", prefix.to_uppercase());
    env::vars()
        .filter_map(|(key, value)| {
            key.strip_prefix(&upper_prefix)
                .map(|stripped| (stripped.to_ascii_lowercase().replace("__", "."), value))
        })
        .collect()
}

fn parse_flag(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err("expected a boolean".into()),
    }
}

fn parse_count(value: &str) -> Result<usize, String> {
    value.trim().parse::<usize>().map_err(|err| err.to_string())
}

fn parse_sort(value: &str) -> Result<SortMode, String> {
    let sort = SortMode::from_key(value);
    if sort == SortMode::Best && !value.trim().eq_ignore_ascii_case(SortMode::Best.as_str()) {
        return Err("unknown sort mode".into());
    }
    Ok(sort)
}

// Unknown keys are skipped quietly; `THREADVIEW_LOG` shares the prefix.
fn apply_env_value(cfg: &mut Config, key: &str, value: &str) -> Result<(), String> {
    match key {
        "ui.theme" => cfg.ui.theme = value.to_string(),
        "ui.tick_rate" => {
            cfg.ui.tick_rate =
                humantime::parse_duration(value.trim()).map_err(|err| err.to_string())?;
        }
        "ui.rounded_borders" => cfg.ui.rounded_borders = parse_flag(value)?,
        "threads.max_comment_depth" => cfg.threads.max_comment_depth = parse_count(value)?,
        "threads.auto_expand_replies" => cfg.threads.auto_expand_replies = parse_flag(value)?,
        "threads.default_sort" => cfg.threads.default_sort = parse_sort(value)?,
        "lists.visible_count" => cfg.lists.visible_count = parse_count(value)?.max(1),
        "lists.wrap_navigation" => cfg.lists.wrap_navigation = parse_flag(value)?,
        "lists.load_more_threshold" => cfg.lists.load_more_threshold = parse_count(value)?,
        "logging.enabled" => cfg.logging.enabled = parse_flag(value)?,
        "logging.level" => cfg.logging.level = value.to_string(),
        "logging.dir" => cfg.logging.dir = Some(PathBuf::from(value)),
        _ => {}
    }
    Ok(())
}

pub fn default_path() -> Option<PathBuf> {
    default_config_path()
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("threadview").join("config.yaml"))
}

/// Write `cfg` as YAML, creating parent directories. Returns the path used.
pub fn save(path: Option<PathBuf>, cfg: &Config) -> Result<PathBuf> {
    let path = if let Some(path) = path {
        path
    } else {
        default_config_path().context("config: unable to determine default config path")?
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("config: failed to create directory {}", parent.display()))?;
    }

    let contents = serde_yaml::to_string(cfg).context("config: failed to serialize config")?;
    fs::write(&path, contents)
        .with_context(|| format!("config: failed to write file {}", path.display()))?;

    Ok(path)
}
