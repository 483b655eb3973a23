use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use super::transport::Transport;
use super::twin::{BaseMessage, DeviceTwinUpdate};
use crate::aggregation::Measurement;
use crate::core::error::PublishError;

/// Sends agreed readings as device-twin updates. One attempt per call; any
/// retry policy belongs to the transport.
pub struct TwinPublisher {
    transport: Arc<dyn Transport>,
    topic: String,
    ack_timeout: Duration,
}

impl TwinPublisher {
    pub fn new(transport: Arc<dyn Transport>, topic: impl Into<String>, ack_timeout: Duration) -> Self {
        Self {
            transport,
            topic: topic.into(),
            ack_timeout,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the event id of the document that was handed over.
    pub async fn publish(&self, measurement: Measurement) -> Result<String, PublishError> {
        let event_id = Uuid::new_v4().to_string();
        let update = DeviceTwinUpdate::actual(
            measurement,
            BaseMessage {
                event_id: Some(event_id.clone()),
                timestamp: Some(Utc::now().timestamp_millis()),
            },
        );
        let body = update.to_vec()?;

        tokio::time::timeout(self.ack_timeout, self.transport.publish(&self.topic, body))
            .await
            .map_err(|_| PublishError::Timeout {
                timeout_ms: timeout_millis(self.ack_timeout),
            })??;

        debug!("📤 Twin update {} sent to {}: {}", event_id, self.topic, measurement);
        Ok(event_id)
    }
}

fn timeout_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}
