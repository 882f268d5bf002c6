//! Client configuration.
//!
//! Configuration can be loaded from:
//! - Environment variables (NATS_URL)
//! - TOML configuration file

use anyhow::{Context, Result};
use relay_stats::SamplerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// NATS server URLs.
    #[serde(default = "default_servers")]
    pub servers: Vec<String>,

    /// Optional client name advertised to the server.
    #[serde(default)]
    pub name: Option<String>,

    /// Opaque labels attached to every stats snapshot.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Stats sampler options.
    #[serde(default)]
    pub stats: StatsOptions,

    /// Request/response options.
    #[serde(default)]
    pub request: RequestOptions,
}

/// Stats sampler options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsOptions {
    /// Sampling interval in milliseconds.
    #[serde(default = "default_stats_interval")]
    pub interval_ms: u64,

    /// Start the sampler as soon as the app is constructed.
    #[serde(default)]
    pub auto_start: bool,
}

/// Request/response options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Round-trip timeout in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub timeout_ms: u64,
}

// Default value functions
fn default_servers() -> Vec<String> {
    let url = std::env::var("NATS_URL").unwrap_or_else(|_| "nats://127.0.0.1:4222".to_string());
    vec![url]
}

fn default_stats_interval() -> u64 {
    600_000 // 10 minutes
}

fn default_request_timeout() -> u64 {
    1_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            servers: default_servers(),
            name: None,
            tags: Vec::new(),
            stats: StatsOptions::default(),
            request: RequestOptions::default(),
        }
    }
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            interval_ms: default_stats_interval(),
            auto_start: false,
        }
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            timeout_ms: default_request_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from file or defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        // Try to load from default paths
        let config_paths = [
            "relay.toml",
            "/etc/relay/relay.toml",
            "~/.config/relay/relay.toml",
        ];

        for path in &config_paths {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::from_file(expanded.as_ref());
            }
        }

        // Fall back to defaults with environment overrides
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Sampler configuration assembled from the top-level tags and the
    /// `[stats]` section.
    #[must_use]
    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            tags: self.tags.clone(),
            interval_ms: self.stats.interval_ms,
            auto_start: self.stats.auto_start,
        }
    }
}
