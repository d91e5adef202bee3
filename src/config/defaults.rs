//! Configuration default values
//!
//! All defaults live here so they can be changed in one place.

// Probe defaults
pub const DEFAULT_MAX_CONCURRENT_PROBES: usize = 10;
pub const DEFAULT_PROBE_DURATION_SECONDS: u64 = 10;
pub const DEFAULT_COLLECT_COUNT: usize = 5;
pub const DEFAULT_MIN_RESOLUTION: &str = "1280x720";
pub const DEFAULT_PROBE_GRACE_SECONDS: u64 = 5;
pub const DEFAULT_FFMPEG_COMMAND: &str = "ffmpeg";
pub const DEFAULT_ARTIFACT_DIR: &str = ".";
pub const DEFAULT_INCLUDE_TEMPLATE_URLS: bool = false;

// Source defaults
pub const DEFAULT_TEMPLATE_PATH: &str = "template.txt";
pub const DEFAULT_FEED_URL: &str =
    "https://raw.githubusercontent.com/kimwang1978/collect-tv-txt/main/merged_output.txt";
pub const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 30;

// Output defaults
pub const DEFAULT_RESULT_PATH: &str = "result.txt";
