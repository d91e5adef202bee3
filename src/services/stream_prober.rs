//! Stream Probing Service
//!
//! Measures a single candidate URL: the stream is captured for a fixed window
//! by an external inspector (ffmpeg), its reported resolution is checked
//! against the configured minimum, and throughput is derived from the number
//! of bytes captured.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, trace, warn};

use crate::config::ProbeConfig;
use crate::errors::{ProbeError, ProbeOutcome};
use crate::utils::Resolution;
use crate::utils::url::UrlUtils;

/// Prefix shared by every capture file, used by the leftover sweep
pub const ARTIFACT_PREFIX: &str = "output_";
pub const ARTIFACT_EXTENSION: &str = "ts";

static VIDEO_RESOLUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Video:.* (\d+)x(\d+)").expect("valid resolution regex"));

/// Successful measurement of one URL
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub url: String,
    pub speed_mbps: f64,
}

/// What an inspector observed during one capture window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inspection {
    pub resolution: Option<Resolution>,
    pub captured_bytes: u64,
}

/// External stream inspection, kept behind a narrow interface so the
/// scheduler never sees the inspector's text format.
#[async_trait]
pub trait MediaInspector: Send + Sync {
    /// Capture `url` for `budget` into `output`.
    ///
    /// Cancellation (dropping the future) must stop any external work.
    async fn inspect(&self, url: &str, budget: Duration, output: &Path) -> ProbeOutcome<Inspection>;
}

/// Something that turns a URL into an optional measurement
#[async_trait]
pub trait UrlProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Option<ProbeResult>;
}

/// Runs `ffmpeg -t <secs> -stats -i <url> -c copy <output>`
pub struct FfmpegInspector {
    ffmpeg_command: String,
}

impl FfmpegInspector {
    pub fn new(ffmpeg_command: Option<String>) -> Self {
        Self {
            ffmpeg_command: ffmpeg_command.unwrap_or_else(|| "ffmpeg".to_string()),
        }
    }
}

#[async_trait]
impl MediaInspector for FfmpegInspector {
    async fn inspect(
        &self,
        url: &str,
        budget: Duration,
        output: &Path,
    ) -> ProbeOutcome<Inspection> {
        let mut cmd = Command::new(&self.ffmpeg_command);
        cmd.arg("-nostdin")
            .arg("-t")
            .arg(budget.as_secs().to_string())
            .arg("-stats")
            .args(["-i", url])
            .args(["-c", "copy"])
            .arg(output);

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            ProbeError::Failure(format!("Failed to execute {}: {e}", self.ffmpeg_command))
        })?;
        let result = child.wait_with_output().await.map_err(|e| {
            ProbeError::Failure(format!("Failed to wait for {}: {e}", self.ffmpeg_command))
        })?;

        // ffmpeg reports stream info and -stats on stderr
        let diagnostics = if result.stderr.is_empty() {
            String::from_utf8_lossy(&result.stdout)
        } else {
            String::from_utf8_lossy(&result.stderr)
        };
        if diagnostics.trim().is_empty() {
            return Err(ProbeError::Failure(format!(
                "{} produced no output (status {})",
                self.ffmpeg_command, result.status
            )));
        }
        trace!("ffmpeg diagnostics for {}: {}", UrlUtils::obfuscate_credentials(url), diagnostics);

        let captured_bytes = match tokio::fs::metadata(output).await {
            Ok(meta) => meta.len(),
            Err(_) => 0,
        };

        Ok(Inspection {
            resolution: parse_resolution(&diagnostics),
            captured_bytes,
        })
    }
}

/// Extract the first `Video: ... <w>x<h>` descriptor from inspector output
pub fn parse_resolution(diagnostics: &str) -> Option<Resolution> {
    let captures = VIDEO_RESOLUTION.captures(diagnostics)?;
    let width = captures.get(1)?.as_str().parse().ok()?;
    let height = captures.get(2)?.as_str().parse().ok()?;
    Some(Resolution::new(width, height))
}

/// Capture file owned by one probe; removed when dropped, which covers
/// success, failure, timeout and task cancellation alike.
#[derive(Debug)]
pub struct ProbeArtifact {
    path: PathBuf,
}

impl ProbeArtifact {
    /// Reserve a collision-resistant file name derived from the URL and a
    /// random disambiguator.
    pub fn allocate(dir: &Path, url: &str) -> Self {
        let disambiguator = fastrand::u32(1..=1_000_000);
        let digest = md5::compute(format!("{url}{disambiguator}"));
        let path = dir.join(format!("{ARTIFACT_PREFIX}{digest:x}.{ARTIFACT_EXTENSION}"));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ProbeArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => trace!("Removed probe artifact {:?}", self.path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove probe artifact {:?}: {}", self.path, e),
        }
    }
}

/// Remove capture files left in `dir` by an interrupted earlier run.
///
/// Best effort: unreadable directories and undeletable files are logged.
pub async fn sweep_leftover_artifacts(dir: &Path) -> usize {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot scan {:?} for leftover probe artifacts: {}", dir, e);
            return 0;
        }
    };

    let mut removed = 0;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let extension = format!(".{ARTIFACT_EXTENSION}");
        if !name.starts_with(ARTIFACT_PREFIX) || !name.ends_with(&extension) {
            continue;
        }
        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to remove leftover artifact {:?}: {}", entry.path(), e),
        }
    }

    if removed > 0 {
        debug!("Removed {} leftover probe artifacts from {:?}", removed, dir);
    }
    removed
}

/// Measures URLs with a [`MediaInspector`] under the configured budget
pub struct StreamProber<I> {
    inspector: I,
    budget: Duration,
    grace_period: Duration,
    effective_seconds: f64,
    min_resolution: Resolution,
    artifact_dir: PathBuf,
}

impl<I: MediaInspector> StreamProber<I> {
    pub fn new(inspector: I, config: &ProbeConfig) -> Self {
        Self {
            inspector,
            budget: config.duration(),
            grace_period: config.grace_period,
            effective_seconds: config.effective_seconds(),
            min_resolution: config.min_resolution,
            artifact_dir: config.artifact_dir.clone(),
        }
    }

    /// Probe one URL, reporting why it produced no result.
    pub async fn measure(&self, url: &str) -> ProbeOutcome<ProbeResult> {
        let artifact = ProbeArtifact::allocate(&self.artifact_dir, url);
        let deadline = self.budget + self.grace_period;

        let inspection = tokio::time::timeout(
            deadline,
            self.inspector.inspect(url, self.budget, artifact.path()),
        )
        .await
        .map_err(|_| ProbeError::Timeout(deadline))??;

        let resolution = inspection.resolution.ok_or(ProbeError::NoResolution)?;
        if !resolution.meets(&self.min_resolution) {
            return Err(ProbeError::BelowMinResolution {
                actual: resolution,
                minimum: self.min_resolution,
            });
        }
        if inspection.captured_bytes == 0 {
            return Err(ProbeError::EmptyCapture);
        }

        Ok(ProbeResult {
            url: url.to_string(),
            speed_mbps: throughput_mbps(inspection.captured_bytes, self.effective_seconds),
        })
    }
}

#[async_trait]
impl<I: MediaInspector> UrlProbe for StreamProber<I> {
    async fn probe(&self, url: &str) -> Option<ProbeResult> {
        match self.measure(url).await {
            Ok(result) => {
                debug!(
                    "Probed {}: {:.3} MB/s",
                    UrlUtils::obfuscate_credentials(url),
                    result.speed_mbps
                );
                Some(result)
            }
            Err(e) => {
                debug!("No result for {}: {}", UrlUtils::obfuscate_credentials(url), e);
                None
            }
        }
    }
}

/// Megabytes per second over the effective capture window
pub fn throughput_mbps(captured_bytes: u64, effective_seconds: f64) -> f64 {
    captured_bytes as f64 / (1024.0 * 1024.0) / effective_seconds
}
