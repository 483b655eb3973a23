pub mod data_feed;
pub mod metrics;

pub use data_feed::{spawn_line_reader, InboundMessage, SensorFeed};
pub use metrics::AggregatorMetrics;
