use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use crate::errors::{AppError, AppResult};
use crate::utils::Resolution;
use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Probe scheduling and admission settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Probes allowed in flight across the whole run
    #[serde(default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: usize,
    /// Capture window handed to ffmpeg (`-t`)
    #[serde(default = "default_probe_duration_seconds")]
    pub duration_seconds: u64,
    /// Results kept per channel
    #[serde(default = "default_collect_count")]
    pub collect_count: usize,
    /// Streams below this size in either dimension are discarded
    #[serde(default = "default_min_resolution")]
    pub min_resolution: Resolution,
    /// Extra time granted past `duration_seconds` before the probe is killed
    #[serde(default = "default_grace_period", with = "duration_serde::duration")]
    pub grace_period: Duration,
    #[serde(default = "default_ffmpeg_command")]
    pub ffmpeg_command: String,
    /// Where transient capture files are written
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,
    /// Also probe URLs listed in the template itself
    #[serde(default = "default_include_template_urls")]
    pub include_template_urls: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_template_path")]
    pub template_path: PathBuf,
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    #[serde(default = "default_fetch_timeout", with = "duration_serde::duration")]
    pub fetch_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_result_path")]
    pub result_path: PathBuf,
}

fn default_max_concurrent_probes() -> usize {
    DEFAULT_MAX_CONCURRENT_PROBES
}

fn default_probe_duration_seconds() -> u64 {
    DEFAULT_PROBE_DURATION_SECONDS
}

fn default_collect_count() -> usize {
    DEFAULT_COLLECT_COUNT
}

fn default_min_resolution() -> Resolution {
    DEFAULT_MIN_RESOLUTION
        .parse()
        .unwrap_or(Resolution::new(1280, 720))
}

fn default_grace_period() -> Duration {
    Duration::from_secs(DEFAULT_PROBE_GRACE_SECONDS)
}

fn default_ffmpeg_command() -> String {
    DEFAULT_FFMPEG_COMMAND.to_string()
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACT_DIR)
}

fn default_include_template_urls() -> bool {
    DEFAULT_INCLUDE_TEMPLATE_URLS
}

fn default_template_path() -> PathBuf {
    PathBuf::from(DEFAULT_TEMPLATE_PATH)
}

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECONDS)
}

fn default_result_path() -> PathBuf {
    PathBuf::from(DEFAULT_RESULT_PATH)
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            max_concurrent_probes: default_max_concurrent_probes(),
            duration_seconds: default_probe_duration_seconds(),
            collect_count: default_collect_count(),
            min_resolution: default_min_resolution(),
            grace_period: default_grace_period(),
            ffmpeg_command: default_ffmpeg_command(),
            artifact_dir: default_artifact_dir(),
            include_template_urls: default_include_template_urls(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            template_path: default_template_path(),
            feed_url: default_feed_url(),
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            result_path: default_result_path(),
        }
    }
}

impl ProbeConfig {
    /// Capture window as a `Duration`
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_seconds)
    }

    /// Seconds used as the throughput denominator.
    ///
    /// Stream startup dominates short captures, so five seconds are discounted
    /// whenever the window is longer than that.
    pub fn effective_seconds(&self) -> f64 {
        if self.duration_seconds > 5 {
            (self.duration_seconds - 5) as f64
        } else {
            self.duration_seconds as f64
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.max_concurrent_probes == 0 {
            return Err(AppError::configuration(
                "probe.max_concurrent_probes must be at least 1",
            ));
        }
        if self.duration_seconds == 0 {
            return Err(AppError::configuration(
                "probe.duration_seconds must be at least 1",
            ));
        }
        if self.collect_count == 0 {
            return Err(AppError::configuration(
                "probe.collect_count must be at least 1",
            ));
        }
        if self.ffmpeg_command.trim().is_empty() {
            return Err(AppError::configuration("probe.ffmpeg_command is empty"));
        }
        Ok(())
    }
}

impl Config {
    /// Read `config_file`, writing the defaults there first if it is missing.
    pub fn load_from_file(config_file: impl AsRef<Path>) -> Result<Self> {
        let config_file = config_file.as_ref();
        if config_file.exists() {
            let contents = std::fs::read_to_string(config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file.display());
            Ok(default_config)
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        self.probe.validate()?;
        if self.source.feed_url.trim().is_empty() {
            return Err(AppError::configuration("source.feed_url is empty"));
        }
        Ok(())
    }
}
