use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::store::ReadingStore;
use super::synthesizer::SignalSynthesizer;
use super::voter::{vote, ConsensusResult};
use super::{Measurement, SourceId, Triple};
use crate::core::error::AggregationResult;
use crate::publishing::TwinPublisher;
use crate::streaming::AggregatorMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// Two-of-three vote over A, B and a synthetic third reading.
    Voting,
    /// Republish every accepted reading unchanged.
    PassThrough,
}

impl FromStr for AggregationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "voting" | "tmr" => Ok(AggregationMode::Voting),
            "passthrough" | "pass-through" | "relay" => Ok(AggregationMode::PassThrough),
            other => Err(format!("unknown aggregation mode '{}'", other)),
        }
    }
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationMode::Voting => write!(f, "voting"),
            AggregationMode::PassThrough => write!(f, "passthrough"),
        }
    }
}

/// What a single delivery led to.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Byte-identical to the last payload from that source.
    Duplicate,
    /// The other source has not reported yet.
    AwaitingSources,
    NoConsensus(ConsensusResult),
    Published {
        measurement: Measurement,
        event_id: String,
    },
}

struct State {
    store: ReadingStore,
    synthesizer: Box<dyn SignalSynthesizer>,
}

pub struct AggregationController {
    state: Mutex<State>,
    publisher: TwinPublisher,
    mode: AggregationMode,
    require_all_sources: bool,
    metrics: Arc<AggregatorMetrics>,
}

impl AggregationController {
    pub fn new(publisher: TwinPublisher, synthesizer: Box<dyn SignalSynthesizer>) -> Self {
        Self {
            state: Mutex::new(State {
                store: ReadingStore::new(),
                synthesizer,
            }),
            publisher,
            mode: AggregationMode::Voting,
            require_all_sources: true,
            metrics: Arc::new(AggregatorMetrics::new()),
        }
    }

    pub fn with_mode(mut self, mode: AggregationMode) -> Self {
        self.mode = mode;
        self
    }

    /// When disabled, voting starts with the first delivery and a source
    /// that never reported counts as a zero reading.
    pub fn require_all_sources(mut self, required: bool) -> Self {
        self.require_all_sources = required;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<AggregatorMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn mode(&self) -> AggregationMode {
        self.mode
    }

    pub fn metrics(&self) -> Arc<AggregatorMetrics> {
        self.metrics.clone()
    }

    pub async fn snapshot(&self) -> (Measurement, Measurement) {
        self.state.lock().await.store.snapshot()
    }

    pub async fn observed_a(&self, raw: &[u8]) -> AggregationResult<Outcome> {
        self.observe(SourceId::A, raw).await
    }

    pub async fn observed_b(&self, raw: &[u8]) -> AggregationResult<Outcome> {
        self.observe(SourceId::B, raw).await
    }

    /// Handles one delivery from a real sensor.
    ///
    /// The store lock is held from the update through the publish, so
    /// deliveries are aggregated one at a time and every vote sees a
    /// consistent A/B pair.
    pub async fn observe(&self, source: SourceId, raw: &[u8]) -> AggregationResult<Outcome> {
        self.metrics.increment_deliveries();
        let mut state = self.state.lock().await;

        let update = match state.store.update(source, raw) {
            Ok(update) => update,
            Err(e) => {
                self.metrics.increment_decode_failures();
                warn!("⚠️  {}", e);
                return Err(e.into());
            }
        };

        if !update.changed {
            self.metrics.increment_duplicates();
            debug!("Duplicate delivery from source {} ignored", source);
            return Ok(Outcome::Duplicate);
        }
        debug!("📥 Source {} reported {}", source, update.measurement);

        let agreed = match self.mode {
            AggregationMode::PassThrough => update.measurement,
            AggregationMode::Voting => {
                if self.require_all_sources && !state.store.all_reported() {
                    self.metrics.increment_awaiting_sources();
                    debug!("Waiting for both sources before voting");
                    return Ok(Outcome::AwaitingSources);
                }

                let (a, b) = state.store.snapshot();
                let synthetic = state.synthesizer.synthesize(a, b);

                match vote(&Triple::new(a, b, synthetic)) {
                    ConsensusResult::Agreed(m) => {
                        self.metrics.increment_consensus_reached();
                        m
                    }
                    result => {
                        self.metrics.increment_consensus_failed();
                        debug!(
                            "🗳️  No consensus on {:?} (A={}, B={}, synthetic={})",
                            result.split_quantities(),
                            a,
                            b,
                            synthetic
                        );
                        return Ok(Outcome::NoConsensus(result));
                    }
                }
            }
        };

        match self.publisher.publish(agreed).await {
            Ok(event_id) => {
                self.metrics.increment_published();
                info!("✅ Published {} to {}", agreed, self.publisher.topic());
                Ok(Outcome::Published {
                    measurement: agreed,
                    event_id,
                })
            }
            Err(e) => {
                self.metrics.increment_publish_failures();
                Err(e.into())
            }
        }
    }
}
