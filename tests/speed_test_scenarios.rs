//! End-to-end runs with scripted inspectors and feeds
//!
//! The real ffmpeg process and HTTP fetch are replaced by in-memory fakes;
//! everything between them (template file, merge, scheduling, probing,
//! ranking, report file, artifact cleanup) is the production path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stream_ranker::{
    config::Config,
    errors::{AppError, ProbeError, ProbeOutcome, SourceError, SourceResult, TemplateError},
    services::{Inspection, MediaInspector, SpeedTestRunner, StreamProber},
    sources::FeedSource,
    utils::Resolution,
};

const MIB: u64 = 1024 * 1024;

#[derive(Clone, Copy)]
enum Behaviour {
    /// Report a resolution and write this many bytes
    Stream { width: u32, height: u32, bytes: u64 },
    /// Never finish within the budget
    Stall,
}

/// Inspector whose behaviour is scripted per URL
struct ScriptedInspector {
    script: HashMap<&'static str, Behaviour>,
}

#[async_trait]
impl MediaInspector for ScriptedInspector {
    async fn inspect(
        &self,
        url: &str,
        _budget: Duration,
        output: &Path,
    ) -> ProbeOutcome<Inspection> {
        match self.script.get(url).copied() {
            Some(Behaviour::Stream { width, height, bytes }) => {
                tokio::fs::write(output, vec![0u8; bytes as usize])
                    .await
                    .map_err(|e| ProbeError::Failure(e.to_string()))?;
                Ok(Inspection {
                    resolution: Some(Resolution::new(width, height)),
                    captured_bytes: bytes,
                })
            }
            Some(Behaviour::Stall) => {
                tokio::fs::write(output, b"partial")
                    .await
                    .map_err(|e| ProbeError::Failure(e.to_string()))?;
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err(ProbeError::Failure("unreachable".into()))
            }
            None => Err(ProbeError::Failure(format!("connection refused: {url}"))),
        }
    }
}

struct StaticFeed(String);

#[async_trait]
impl FeedSource for StaticFeed {
    async fn fetch(&self) -> SourceResult<String> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        "static feed".into()
    }
}

struct UnreachableFeed;

#[async_trait]
impl FeedSource for UnreachableFeed {
    async fn fetch(&self) -> SourceResult<String> {
        Err(SourceError::feed_fetch("http://feed.invalid/list.txt", "dns error"))
    }

    fn describe(&self) -> String {
        "unreachable feed".into()
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    config: Config,
    artifact_dir: PathBuf,
    result_path: PathBuf,
}

fn fixture(template: &str, collect_count: usize) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let template_path = dir.path().join("template.txt");
    std::fs::write(&template_path, template).unwrap();

    let mut config = Config::default();
    config.source.template_path = template_path;
    config.output.result_path = dir.path().join("result.txt");
    config.probe.artifact_dir = dir.path().join("artifacts");
    config.probe.collect_count = collect_count;
    config.probe.duration_seconds = 1;
    config.probe.grace_period = Duration::from_millis(300);
    config.probe.min_resolution = Resolution::new(640, 360);
    config.probe.max_concurrent_probes = 4;

    Fixture {
        artifact_dir: config.probe.artifact_dir.clone(),
        result_path: config.output.result_path.clone(),
        config,
        _dir: dir,
    }
}

fn runner(
    fixture: &Fixture,
    feed: impl FeedSource + 'static,
    script: &[(&'static str, Behaviour)],
) -> SpeedTestRunner {
    let inspector = ScriptedInspector {
        script: script.iter().copied().collect(),
    };
    let probe = StreamProber::new(inspector, &fixture.config.probe);
    SpeedTestRunner::new(fixture.config.clone(), Arc::new(feed), Arc::new(probe))
}

fn stream(width: u32, height: u32, bytes: u64) -> Behaviour {
    Behaviour::Stream {
        width,
        height,
        bytes,
    }
}

fn leftover_artifacts(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[tokio::test]
async fn test_keeps_fastest_high_resolution_streams() {
    let fixture = fixture("CCTV,#genre#\nCCTV-5\n", 2);
    let feed = StaticFeed(
        "体育,#genre#\n\
         CCTV 5,http://slow.example/cctv5\n\
         CCTV 5,http://tiny.example/cctv5\n\
         CCTV 5,http://fast.example/cctv5\n"
            .to_string(),
    );
    let runner = runner(
        &fixture,
        feed,
        &[
            ("http://slow.example/cctv5", stream(1920, 1080, MIB)),
            ("http://tiny.example/cctv5", stream(320, 240, 8 * MIB)),
            ("http://fast.example/cctv5", stream(1920, 1080, 3 * MIB)),
        ],
    );

    let summary = runner.run().await.unwrap();

    assert_eq!(
        std::fs::read_to_string(&fixture.result_path).unwrap(),
        "CCTV,#genre#\n\
         CCTV-5,http://fast.example/cctv5\n\
         CCTV-5,http://slow.example/cctv5\n"
    );
    assert_eq!(summary.channels_with_results, 1);
    assert_eq!(summary.urls_kept, 2);
    assert_eq!(leftover_artifacts(&fixture.artifact_dir), 0);
}

#[tokio::test]
async fn test_unreachable_feed_still_writes_report() {
    let fixture = fixture("\u{feff}央视,#genre#\nCCTV-1\nCCTV-5\n卫视,#genre#\n湖南卫视\n", 3);
    let runner = runner(&fixture, UnreachableFeed, &[]);

    let summary = runner.run().await.unwrap();

    assert_eq!(summary.channels_scheduled, 0);
    assert_eq!(
        std::fs::read_to_string(&fixture.result_path).unwrap(),
        "央视,#genre#\n卫视,#genre#\n"
    );
}

#[tokio::test]
async fn test_stalled_probe_does_not_block_the_channel() {
    let fixture = fixture("CCTV,#genre#\nCCTV-1\n", 2);
    let feed = StaticFeed(
        "CCTV-1,http://stuck.example/1\n\
         CCTV-1,http://a.example/1\n\
         CCTV-1,http://dead.example/1\n\
         CCTV-1,http://b.example/1\n"
            .to_string(),
    );
    let runner = runner(
        &fixture,
        feed,
        &[
            ("http://stuck.example/1", Behaviour::Stall),
            ("http://a.example/1", stream(1280, 720, 2 * MIB)),
            ("http://b.example/1", stream(1280, 720, MIB)),
        ],
    );

    let started = std::time::Instant::now();
    runner.run().await.unwrap();
    // Bounded by the probe budget plus grace, not by the stalled inspector
    assert!(started.elapsed() < Duration::from_secs(10));

    assert_eq!(
        std::fs::read_to_string(&fixture.result_path).unwrap(),
        "CCTV,#genre#\nCCTV-1,http://a.example/1\nCCTV-1,http://b.example/1\n"
    );
    assert_eq!(leftover_artifacts(&fixture.artifact_dir), 0);
}

#[tokio::test]
async fn test_channel_line_before_category_aborts_run() {
    let fixture = fixture("CCTV-1\nCCTV,#genre#\nCCTV-5\n", 2);
    let runner = runner(&fixture, UnreachableFeed, &[]);

    let err = runner.run().await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Template(TemplateError::Malformed { line: 1, .. })
    ));
    assert!(!fixture.result_path.exists());
}

#[tokio::test]
async fn test_result_file_is_overwritten_between_runs() {
    let fixture = fixture("CCTV,#genre#\nCCTV-5\n", 1);
    std::fs::write(&fixture.result_path, "stale,#genre#\nstale,http://old\n").unwrap();

    let feed = StaticFeed("CCTV5,http://new.example/5\n".to_string());
    let runner = runner(
        &fixture,
        feed,
        &[("http://new.example/5", stream(1920, 1080, MIB))],
    );
    runner.run().await.unwrap();

    assert_eq!(
        std::fs::read_to_string(&fixture.result_path).unwrap(),
        "CCTV,#genre#\nCCTV-5,http://new.example/5\n"
    );
}
