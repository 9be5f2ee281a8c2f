use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::translate::orchestrator::PollPolicy;

/// Files tried, in order, when `CONFIG_PATH` is not set.
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["conf.yaml", "conf.json"];

/// Largest accepted `poll_backoff_factor`.
pub const MAX_POLL_BACKOFF_FACTOR: f64 = 10.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system_config: SystemConfig,
    #[serde(default)]
    pub deepl_config: DeepLConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_upload_bytes() -> usize {
    30 * 1024 * 1024
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Settings for the DeepL document API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepLConfig {
    /// Base URL for keys ending in `:fx`
    #[serde(default = "default_free_api_url")]
    pub free_api_url: String,

    #[serde(default = "default_pro_api_url")]
    pub pro_api_url: String,

    #[serde(default = "default_target_lang")]
    pub target_lang: String,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: f64,

    /// Multiplier applied to the poll interval after each non-terminal status.
    /// `1.0` keeps the interval fixed.
    #[serde(default = "default_poll_backoff_factor")]
    pub poll_backoff_factor: f64,

    #[serde(default = "default_max_poll_interval_secs")]
    pub max_poll_interval_secs: f64,

    /// Upper bound on the time spent polling one job. `0` disables the bound.
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Skip DeepL entirely and return a stub document.
    #[serde(default)]
    pub dry_run: bool,
}

fn default_free_api_url() -> String {
    "https://api-free.deepl.com".to_string()
}

fn default_pro_api_url() -> String {
    "https://api.deepl.com".to_string()
}

fn default_target_lang() -> String {
    "EN-GB".to_string()
}

fn default_poll_interval_secs() -> f64 {
    2.0
}

fn default_poll_backoff_factor() -> f64 {
    1.0
}

fn default_max_poll_interval_secs() -> f64 {
    30.0
}

fn default_max_wait_secs() -> u64 {
    600
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for DeepLConfig {
    fn default() -> Self {
        Self {
            free_api_url: default_free_api_url(),
            pro_api_url: default_pro_api_url(),
            target_lang: default_target_lang(),
            poll_interval_secs: default_poll_interval_secs(),
            poll_backoff_factor: default_poll_backoff_factor(),
            max_poll_interval_secs: default_max_poll_interval_secs(),
            max_wait_secs: default_max_wait_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            dry_run: false,
        }
    }
}

impl DeepLConfig {
    /// Unvalidated values fall back to the defaults instead of panicking.
    pub fn poll_policy(&self) -> PollPolicy {
        let interval = Duration::try_from_secs_f64(self.poll_interval_secs)
            .ok()
            .filter(|d| !d.is_zero())
            .unwrap_or_else(|| Duration::from_secs_f64(default_poll_interval_secs()));
        let max_interval = Duration::try_from_secs_f64(self.max_poll_interval_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_max_poll_interval_secs()))
            .max(interval);

        PollPolicy {
            interval,
            backoff_factor: self.poll_backoff_factor,
            max_interval,
            max_wait: (self.max_wait_secs > 0).then(|| Duration::from_secs(self.max_wait_secs)),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Load configuration from a YAML or JSON file, picked by extension.
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            anyhow::bail!("Configuration file not found: {}", path);
        }

        let content = load_text_file(path)?;
        let content = substitute_env_vars(&content)?;

        let path_lower = path.to_lowercase();
        let config: Config = if path_lower.ends_with(".json") || path_lower.ends_with(".jsonld") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config {}", path))?
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config {}", path))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Resolve the configuration the way the binary does: `$CONFIG_PATH` if set,
    /// otherwise the first default file that exists, otherwise built-in defaults.
    ///
    /// Returns the path that was loaded, if any.
    pub fn discover() -> Result<(Self, Option<String>)> {
        Self::discover_from(std::env::var("CONFIG_PATH").ok(), &DEFAULT_CONFIG_PATHS)
    }

    /// `explicit` wins and must exist; otherwise the first existing `candidate`.
    pub fn discover_from(
        explicit: Option<String>,
        candidates: &[&str],
    ) -> Result<(Self, Option<String>)> {
        if let Some(path) = explicit {
            let config = Self::load(&path)?;
            return Ok((config, Some(path)));
        }

        for path in candidates {
            if Path::new(path).exists() {
                let config = Self::load(path)?;
                return Ok((config, Some(path.to_string())));
            }
            debug!("No config at {}", path);
        }

        Ok((Self::default(), None))
    }

    pub fn validate(&self) -> Result<()> {
        if self.system_config.port == 0 {
            anyhow::bail!("system_config.port must be non-zero");
        }
        let deepl = &self.deepl_config;
        check_interval("poll_interval_secs", deepl.poll_interval_secs)?;
        check_interval("max_poll_interval_secs", deepl.max_poll_interval_secs)?;
        if !(1.0..=MAX_POLL_BACKOFF_FACTOR).contains(&deepl.poll_backoff_factor) {
            anyhow::bail!(
                "deepl_config.poll_backoff_factor must be between 1.0 and {}",
                MAX_POLL_BACKOFF_FACTOR
            );
        }
        if deepl.max_poll_interval_secs < deepl.poll_interval_secs {
            anyhow::bail!("deepl_config.max_poll_interval_secs must not be below poll_interval_secs");
        }
        if deepl.target_lang.trim().is_empty() {
            anyhow::bail!("deepl_config.target_lang must not be empty");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.system_config.host, self.system_config.port)
    }
}

/// A poll interval must be positive and representable as a `Duration`.
fn check_interval(name: &str, secs: f64) -> Result<()> {
    match Duration::try_from_secs_f64(secs) {
        Ok(d) if !d.is_zero() => Ok(()),
        _ => anyhow::bail!("deepl_config.{} must be a positive number of seconds, got {}", name, secs),
    }
}

/// Replace `${VAR_NAME}` with the value of the environment variable.
/// Unset variables are left untouched.
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let pattern = Regex::new(r"\$\{(\w+)\}")?;
    let replaced = pattern.replace_all(content, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });
    Ok(replaced.into_owned())
}

/// Read a text file as UTF-8, dropping a leading BOM.
fn load_text_file(path: &str) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path))?;
    let (text, _, had_errors) = encoding_rs::UTF_8.decode(&bytes);
    if had_errors {
        debug!("Replaced invalid UTF-8 sequences while reading {}", path);
    }
    Ok(text.into_owned())
}
