use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::sync::mpsc;

use tmr_sensor_aggregator::aggregation::{AggregationController, RandomSynthesizer, SignalSynthesizer};
use tmr_sensor_aggregator::core::{logging, Config};
use tmr_sensor_aggregator::publishing::{LineTransport, TwinPublisher};
use tmr_sensor_aggregator::streaming::{spawn_line_reader, AggregatorMetrics, SensorFeed};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize logging
    logging::init_logging(&config.monitoring.log_level)?;

    tracing::info!("🚀 TMR sensor aggregator starting...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Mode: {}", config.aggregation.mode);
    tracing::info!(
        "Sources: A={} B={} → {}",
        config.sources.topic_a,
        config.sources.topic_b,
        config.publish.twin_topic
    );

    let spread = config.aggregation.synthetic_spread;
    let synthesizer: Box<dyn SignalSynthesizer> = match config.aggregation.synthetic_seed {
        Some(seed) => {
            tracing::info!("Synthetic signal seeded with {}", seed);
            Box::new(RandomSynthesizer::seeded(seed, spread))
        }
        None => Box::new(RandomSynthesizer::from_entropy(spread)),
    };

    let transport = Arc::new(LineTransport::new(tokio::io::stdout()));
    let publisher = TwinPublisher::new(
        transport,
        config.publish.twin_topic.clone(),
        config.publish.ack_timeout(),
    );

    let metrics = Arc::new(AggregatorMetrics::new());
    let controller = AggregationController::new(publisher, synthesizer)
        .with_mode(config.aggregation.mode)
        .require_all_sources(config.aggregation.require_all_sources)
        .with_metrics(metrics.clone());

    let feed = SensorFeed::new(
        Arc::new(controller),
        config.sources.topic_a.clone(),
        config.sources.topic_b.clone(),
    );

    let (message_tx, message_rx) = mpsc::unbounded_channel();
    let reader = spawn_line_reader(BufReader::new(tokio::io::stdin()), message_tx);

    // Periodic metrics report
    let report_metrics = metrics.clone();
    let interval_secs = config.monitoring.report_interval_secs.max(1);
    let reporter = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        interval.tick().await;
        loop {
            interval.tick().await;
            report_metrics.print_report();
        }
    });

    feed.run(message_rx).await;

    reader.await.context("Input reader task failed")?;
    reporter.abort();
    metrics.print_report();

    tracing::info!("👋 TMR sensor aggregator stopped");
    Ok(())
}
