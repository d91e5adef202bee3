//! Per-channel probe scheduling
//!
//! Every candidate URL of a channel gets its own task. Tasks wait on the
//! run-wide [`ProbeGate`], then consult the channel's bounded collection:
//! once `collect_count` results are in, remaining tasks exit without probing.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::probe_gate::ProbeGate;
use super::stream_prober::{ProbeResult, UrlProbe};

/// Bounded, shared result set for one channel.
///
/// Admission closes once `capacity` results are held; nothing is ever
/// truncated afterwards.
#[derive(Debug, Clone)]
pub struct ChannelCollection {
    results: Arc<Mutex<Vec<ProbeResult>>>,
    capacity: usize,
}

impl ChannelCollection {
    pub fn new(capacity: usize) -> Self {
        Self {
            results: Arc::new(Mutex::new(Vec::with_capacity(capacity))),
            capacity,
        }
    }

    pub async fn is_full(&self) -> bool {
        self.results.lock().await.len() >= self.capacity
    }

    /// Insert `result` if the collection is still below capacity.
    pub async fn try_admit(&self, result: ProbeResult) -> bool {
        let mut results = self.results.lock().await;
        if results.len() >= self.capacity {
            return false;
        }
        results.push(result);
        true
    }

    pub async fn len(&self) -> usize {
        self.results.lock().await.len()
    }

    /// Results in insertion order
    pub async fn snapshot(&self) -> Vec<ProbeResult> {
        self.results.lock().await.clone()
    }
}

/// Outcome of one probe task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskOutcome {
    Admitted,
    /// Collection was already full before probing
    Skipped,
    /// Probe succeeded but the collection filled up meanwhile
    Late,
    Failed,
}

/// Counters for one channel run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    pub admitted: usize,
    pub skipped: usize,
    pub late: usize,
    pub failed: usize,
}

impl ChannelStats {
    /// Probes that actually ran
    pub fn probed(&self) -> usize {
        self.admitted + self.late + self.failed
    }

    fn record(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Admitted => self.admitted += 1,
            TaskOutcome::Skipped => self.skipped += 1,
            TaskOutcome::Late => self.late += 1,
            TaskOutcome::Failed => self.failed += 1,
        }
    }
}

/// Ranked URLs plus counters for one channel
#[derive(Debug, Clone, Default)]
pub struct ChannelRun {
    pub ranked_urls: Vec<String>,
    pub stats: ChannelStats,
}

/// Schedules probes for one channel at a time under a shared gate
#[derive(Clone)]
pub struct ChannelProber {
    gate: ProbeGate,
    probe: Arc<dyn UrlProbe>,
    collect_count: usize,
}

impl ChannelProber {
    pub fn new(gate: ProbeGate, probe: Arc<dyn UrlProbe>, collect_count: usize) -> Self {
        Self {
            gate,
            probe,
            collect_count: collect_count.max(1),
        }
    }

    /// Probe `urls` and return at most `collect_count` of them, fastest first.
    pub async fn run_channel(&self, urls: &[String]) -> Vec<String> {
        self.probe_channel(urls).await.ranked_urls
    }

    /// Like [`run_channel`](Self::run_channel) but also reports counters.
    ///
    /// Waits for every spawned task before ranking.
    pub async fn probe_channel(&self, urls: &[String]) -> ChannelRun {
        let collection = ChannelCollection::new(self.collect_count);
        let mut tasks = JoinSet::new();

        for url in urls {
            let gate = self.gate.clone();
            let probe = Arc::clone(&self.probe);
            let collection = collection.clone();
            let url = url.clone();

            tasks.spawn(async move {
                let _permit = match gate.acquire().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        warn!("Probe gate unavailable: {}", e);
                        return TaskOutcome::Skipped;
                    }
                };

                if collection.is_full().await {
                    return TaskOutcome::Skipped;
                }

                let Some(result) = probe.probe(&url).await else {
                    return TaskOutcome::Failed;
                };
                // Authoritative capacity check; the pre-check above can race
                if collection.try_admit(result).await {
                    TaskOutcome::Admitted
                } else {
                    TaskOutcome::Late
                }
            });
        }

        let mut stats = ChannelStats::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => stats.record(outcome),
                Err(e) => {
                    warn!("Probe task ended abnormally: {}", e);
                    stats.record(TaskOutcome::Failed);
                }
            }
        }

        let ranked_urls = rank(collection.snapshot().await);
        debug!(
            "Channel probe finished: {} candidates, {} probed, {} kept, \
             {} skipped, {} late, {} failed",
            urls.len(),
            stats.probed(),
            stats.admitted,
            stats.skipped,
            stats.late,
            stats.failed
        );
        if ranked_urls.is_empty() && !urls.is_empty() {
            info!("No usable streams among {} candidates", urls.len());
        }

        ChannelRun { ranked_urls, stats }
    }
}

/// Order results by speed, fastest first; equal speeds keep insertion order.
pub fn rank(mut results: Vec<ProbeResult>) -> Vec<String> {
    results.sort_by(|a, b| b.speed_mbps.total_cmp(&a.speed_mbps));
    results.into_iter().map(|r| r.url).collect()
}
