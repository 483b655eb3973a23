//! Error types for the aggregation pipeline.
//!
//! Data errors (`DecodeError`) and delivery errors (`PublishError`) are kept
//! apart: the first means a sensor sent something unusable, the second means
//! the transport collaborator could not take our document.

use std::fmt;
use thiserror::Error;

use crate::aggregation::SourceId;

/// An inbound payload that is not a well-formed measurement.
#[derive(Debug, Error)]
#[error("Failed to decode payload from source {source_id}: {reason}")]
pub struct DecodeError {
    pub source_id: SourceId,
    pub reason: String,
}

impl DecodeError {
    pub fn new(source_id: SourceId, err: serde_json::Error) -> Self {
        Self {
            source_id,
            reason: err.to_string(),
        }
    }

    /// A payload that parsed but carries a value no sensor can report.
    pub fn out_of_range(source_id: SourceId, field: impl fmt::Display, value: f32) -> Self {
        Self {
            source_id,
            reason: format!("{} out of range: {}", field, value),
        }
    }
}

/// Failure reported by the transport collaborator.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport closed")]
    Closed,

    #[error("Delivery rejected: {0}")]
    Rejected(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("No delivery confirmation within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Errors a single delivery can surface. None of them stop the aggregator.
#[derive(Debug, Error)]
pub enum AggregationError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

pub type AggregationResult<T> = Result<T, AggregationError>;
