use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stream_ranker::{config::Config, services::SpeedTestRunner};

#[derive(Parser)]
#[command(name = "stream-ranker")]
#[command(version)]
#[command(about = "Probes live stream candidates per channel and keeps the fastest ones")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Channel template (overrides config file)
    #[arg(short, long, value_name = "PATH")]
    template: Option<PathBuf>,

    /// Result file (overrides config file)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Candidate feed URL (overrides config file)
    #[arg(short = 'u', long, value_name = "URL")]
    feed_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("stream_ranker={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting stream-ranker v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config.display());

    if let Some(template) = cli.template {
        config.source.template_path = template;
    }
    if let Some(output) = cli.output {
        config.output.result_path = output;
    }
    if let Some(feed_url) = cli.feed_url {
        config.source.feed_url = feed_url;
    }

    info!(
        "Probing with {} concurrent probes, {}s window, keeping {} per channel, minimum {}",
        config.probe.max_concurrent_probes,
        config.probe.duration_seconds,
        config.probe.collect_count,
        config.probe.min_resolution
    );

    let runner = SpeedTestRunner::from_config(config)?;
    let summary = runner.run().await?;

    info!(
        "Report written to {} ({} lines)",
        runner.config().output.result_path.display(),
        summary.report_lines
    );

    Ok(())
}
