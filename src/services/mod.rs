//! Service layer: probing, scheduling, ranking and report assembly
//!
//! - [`stream_prober`]: measures a single URL through an external inspector
//! - [`probe_gate`]: run-wide concurrency ceiling for probes
//! - [`channel_prober`]: per-channel scheduling, bounded collection and ranking
//! - [`report`]: result file rendering
//! - [`speed_test`]: wires the above into one batch run

pub mod channel_prober;
pub mod probe_gate;
pub mod report;
pub mod stream_prober;

pub use channel_prober::{ChannelCollection, ChannelProber, ChannelRun, ChannelStats, rank};
pub use probe_gate::ProbeGate;
pub use speed_test::{RunSummary, SpeedTestRunner};
pub use stream_prober::{
    FfmpegInspector, Inspection, MediaInspector, ProbeResult, StreamProber, UrlProbe,
};
