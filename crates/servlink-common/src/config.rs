//! ---
//! sl_section: "05-runtime"
//! sl_subsection: "module"
//! sl_type: "source"
//! sl_scope: "code"
//! sl_description: "Shared configuration handling and logging setup."
//! sl_version: "v0.1.0-alpha"
//! sl_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds, DurationSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_host() -> String {
    "172.16.11.7".to_owned()
}

fn default_port() -> u16 {
    8888
}

fn default_ws_path() -> String {
    "/ws".to_owned()
}

fn default_handshake_delay() -> Duration {
    Duration::from_millis(50)
}

fn default_heartbeat_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_watchdog_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_stale_after() -> Duration {
    Duration::from_secs(10)
}

fn default_signal_info_path() -> PathBuf {
    PathBuf::from("assets/signal-info.json")
}

fn default_layout_path() -> PathBuf {
    PathBuf::from("assets/panel-layout.json")
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

/// Primary configuration object for the panel client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub link: LinkSettings,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: PathBuf,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "SERVLINK_CONFIG";

    /// Load configuration from disk, respecting the `SERVLINK_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig { config, source: path });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig { config, source: path });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn from_path(path: PathBuf) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.link.validate()
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Device link parameters. Intervals default to the device contract.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_ws_path")]
    pub path: String,
    #[serde(default = "default_handshake_delay")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub handshake_delay: Duration,
    #[serde(default = "default_heartbeat_interval")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub heartbeat_interval: Duration,
    #[serde(default = "default_watchdog_interval")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub watchdog_interval: Duration,
    #[serde(default = "default_stale_after")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub stale_after: Duration,
    /// File whose contents are sent verbatim after the bus subscriptions.
    #[serde(default)]
    pub subscription_script: Option<PathBuf>,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            path: default_ws_path(),
            handshake_delay: default_handshake_delay(),
            heartbeat_interval: default_heartbeat_interval(),
            watchdog_interval: default_watchdog_interval(),
            stale_after: default_stale_after(),
            subscription_script: None,
        }
    }
}

impl LinkSettings {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(anyhow!("link host must not be empty"));
        }
        if !self.path.starts_with('/') {
            return Err(anyhow!("link path must start with '/'"));
        }
        if self.stale_after < self.watchdog_interval {
            return Err(anyhow!(
                "stale_after ({:?}) must be at least the watchdog interval ({:?})",
                self.stale_after,
                self.watchdog_interval
            ));
        }
        Ok(())
    }
}

/// Location of the signal metadata catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    #[serde(default = "default_signal_info_path")]
    pub signal_info_path: PathBuf,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            signal_info_path: default_signal_info_path(),
        }
    }
}

/// Location of the panel layout description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_layout_path")]
    pub path: PathBuf,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            path: default_layout_path(),
        }
    }
}

/// Logging sink configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_takes_the_device_defaults() {
        let config: AppConfig = "".parse().expect("parses");
        assert_eq!(config.link.host, "172.16.11.7");
        assert_eq!(config.link.port, 8888);
        assert_eq!(config.link.path, "/ws");
        assert_eq!(config.link.handshake_delay, Duration::from_millis(50));
        assert_eq!(config.link.heartbeat_interval, Duration::from_secs(5));
        assert_eq!(config.link.watchdog_interval, Duration::from_secs(2));
        assert_eq!(config.link.stale_after, Duration::from_secs(10));
    }

    #[test]
    fn partial_overrides_keep_the_rest_defaulted() {
        let config: AppConfig = r#"
            [link]
            host = "10.0.0.2"
            heartbeat_interval = 2
        "#
        .parse()
        .expect("parses");
        assert_eq!(config.link.host, "10.0.0.2");
        assert_eq!(config.link.heartbeat_interval, Duration::from_secs(2));
        assert_eq!(config.link.port, 8888);
    }

    #[test]
    fn invalid_links_are_rejected() {
        assert!("[link]\nhost = \"\"".parse::<AppConfig>().is_err());
        assert!("[link]\npath = \"ws\"".parse::<AppConfig>().is_err());
        assert!("[link]\nstale_after = 1".parse::<AppConfig>().is_err());
    }

    #[test]
    fn load_prefers_the_first_existing_candidate() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "[link]\nport = 9999").expect("write");
        let missing = PathBuf::from("/nonexistent/servlink.toml");
        let loaded =
            AppConfig::load_with_source(&[missing, file.path().to_path_buf()]).expect("loads");
        assert_eq!(loaded.config.link.port, 9999);
        assert_eq!(loaded.source, file.path());
    }
}
