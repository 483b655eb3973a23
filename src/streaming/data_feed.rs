use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::aggregation::{AggregationController, Outcome, SourceId};
use crate::core::error::{AggregationError, AggregationResult};

/// One delivery from the subscribe side of the transport.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub receive_time: Instant,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            receive_time: Instant::now(),
        }
    }

    /// Parses a `topic payload` line. The payload is everything after the
    /// first space, so JSON with spaces survives intact.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (topic, payload) = line.split_once(' ')?;
        if topic.is_empty() {
            return None;
        }
        Some(Self::new(topic, payload.trim_start()))
    }

    pub fn latency_ms(&self) -> u128 {
        self.receive_time.elapsed().as_millis()
    }
}

/// Routes deliveries from the two source topics into the controller, one
/// at a time.
pub struct SensorFeed {
    routes: HashMap<String, SourceId>,
    controller: Arc<AggregationController>,
}

impl SensorFeed {
    pub fn new(
        controller: Arc<AggregationController>,
        topic_a: impl Into<String>,
        topic_b: impl Into<String>,
    ) -> Self {
        let mut routes = HashMap::new();
        routes.insert(topic_a.into(), SourceId::A);
        routes.insert(topic_b.into(), SourceId::B);
        Self { routes, controller }
    }

    pub fn source_for(&self, topic: &str) -> Option<SourceId> {
        self.routes.get(topic).copied()
    }

    /// Returns `None` for a topic that is not one of the two sources.
    pub async fn dispatch(&self, msg: &InboundMessage) -> Option<AggregationResult<Outcome>> {
        let Some(source) = self.source_for(&msg.topic) else {
            self.controller.metrics().increment_unknown_topics();
            debug!("Unknown topic: {}", msg.topic);
            return None;
        };
        Some(self.controller.observe(source, &msg.payload).await)
    }

    /// Consumes deliveries until the sender side is dropped. Per-delivery
    /// errors are logged and never stop the loop.
    pub async fn run(&self, mut message_rx: mpsc::UnboundedReceiver<InboundMessage>) {
        info!("🚀 Sensor feed listening on {} topics", self.routes.len());

        while let Some(msg) = message_rx.recv().await {
            match self.dispatch(&msg).await {
                Some(Ok(Outcome::Published { event_id, .. })) => {
                    debug!("Delivery on {} published as {} ({}ms)", msg.topic, event_id, msg.latency_ms());
                }
                Some(Ok(_)) | None => {}
                Some(Err(AggregationError::Decode(_))) => {
                    // already reported by the controller
                }
                Some(Err(e)) => {
                    error!("❌ Aggregation failed for {}: {}", msg.topic, e);
                }
            }
        }

        info!("🔌 Sensor feed closed");
    }
}

/// Reads `topic payload` lines and forwards them until EOF or until the
/// receiver goes away.
pub fn spawn_line_reader<R>(reader: R, message_tx: mpsc::UnboundedSender<InboundMessage>) -> JoinHandle<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let Some(msg) = InboundMessage::parse_line(&line) else {
                        warn!("⚠️  Skipping malformed line: {}", line);
                        continue;
                    };
                    if message_tx.send(msg).is_err() {
                        warn!("Failed to forward delivery, receiver dropped");
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    error!("❌ Input read error: {}", e);
                    break;
                }
            }
        }
    })
}
