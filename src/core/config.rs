use anyhow::{anyhow, ensure, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::aggregation::{AggregationMode, DEFAULT_SPREAD};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub sources: SourceConfig,
    pub publish: PublishConfig,
    pub aggregation: AggregationConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub topic_a: String,
    pub topic_b: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishConfig {
    pub twin_topic: String,
    pub ack_timeout_ms: u64,
}

impl PublishConfig {
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregationConfig {
    pub mode: AggregationMode,
    pub synthetic_spread: f32,
    pub synthetic_seed: Option<u64>,
    pub require_all_sources: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: String,
    pub report_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Unparseable numbers
    /// and flags fall back to their defaults; an unknown mode or an unusable
    /// spread is an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = match lookup("AGGREGATOR_MODE") {
            Some(raw) => raw.parse::<AggregationMode>().map_err(|e| anyhow!(e))?,
            None => AggregationMode::Voting,
        };

        let synthetic_spread = lookup("SYNTHETIC_SPREAD")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SPREAD);
        ensure!(
            synthetic_spread.is_finite() && synthetic_spread > 0.0,
            "SYNTHETIC_SPREAD must be a positive number, got {}",
            synthetic_spread
        );

        let config = Config {
            sources: SourceConfig {
                topic_a: lookup("SENSOR_TOPIC_A").unwrap_or_else(|| "sensors/livingroom1".to_string()),
                topic_b: lookup("SENSOR_TOPIC_B").unwrap_or_else(|| "sensors/livingroom2".to_string()),
            },
            publish: PublishConfig {
                twin_topic: lookup("TWIN_UPDATE_TOPIC")
                    .unwrap_or_else(|| "$hw/events/device/hudtemp-aggregated/twin/update".to_string()),
                ack_timeout_ms: lookup("PUBLISH_ACK_TIMEOUT_MS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5000),
            },
            aggregation: AggregationConfig {
                mode,
                synthetic_spread,
                synthetic_seed: lookup("SYNTHETIC_SEED").and_then(|v| v.parse().ok()),
                require_all_sources: lookup("REQUIRE_ALL_SOURCES")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(true),
            },
            monitoring: MonitoringConfig {
                log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                report_interval_secs: lookup("METRICS_REPORT_INTERVAL_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60),
            },
        };

        ensure!(
            config.sources.topic_a != config.sources.topic_b,
            "SENSOR_TOPIC_A and SENSOR_TOPIC_B must differ (both are '{}')",
            config.sources.topic_a
        );

        Ok(config)
    }
}
