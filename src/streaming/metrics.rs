use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

#[derive(Debug)]
pub struct AggregatorMetrics {
    deliveries_received: AtomicU64,
    duplicates_suppressed: AtomicU64,
    decode_failures: AtomicU64,
    unknown_topics: AtomicU64,
    awaiting_sources: AtomicU64,
    consensus_reached: AtomicU64,
    consensus_failed: AtomicU64,
    published: AtomicU64,
    publish_failures: AtomicU64,
    start_time: Instant,
}

impl AggregatorMetrics {
    pub fn new() -> Self {
        Self {
            deliveries_received: AtomicU64::new(0),
            duplicates_suppressed: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            unknown_topics: AtomicU64::new(0),
            awaiting_sources: AtomicU64::new(0),
            consensus_reached: AtomicU64::new(0),
            consensus_failed: AtomicU64::new(0),
            published: AtomicU64::new(0),
            publish_failures: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn increment_deliveries(&self) {
        self.deliveries_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_duplicates(&self) {
        self.duplicates_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_decode_failures(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_unknown_topics(&self) {
        self.unknown_topics.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_awaiting_sources(&self) {
        self.awaiting_sources.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_consensus_reached(&self) {
        self.consensus_reached.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_consensus_failed(&self) {
        self.consensus_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_publish_failures(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_deliveries(&self) -> u64 {
        self.deliveries_received.load(Ordering::Relaxed)
    }

    pub fn get_duplicates(&self) -> u64 {
        self.duplicates_suppressed.load(Ordering::Relaxed)
    }

    pub fn get_decode_failures(&self) -> u64 {
        self.decode_failures.load(Ordering::Relaxed)
    }

    pub fn get_unknown_topics(&self) -> u64 {
        self.unknown_topics.load(Ordering::Relaxed)
    }

    pub fn get_awaiting_sources(&self) -> u64 {
        self.awaiting_sources.load(Ordering::Relaxed)
    }

    pub fn get_consensus_reached(&self) -> u64 {
        self.consensus_reached.load(Ordering::Relaxed)
    }

    pub fn get_consensus_failed(&self) -> u64 {
        self.consensus_failed.load(Ordering::Relaxed)
    }

    pub fn get_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn get_publish_failures(&self) -> u64 {
        self.publish_failures.load(Ordering::Relaxed)
    }

    pub fn get_uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Share of voting attempts that reached consensus.
    pub fn get_consensus_rate(&self) -> f64 {
        let reached = self.get_consensus_reached();
        let attempts = reached + self.get_consensus_failed();
        if attempts == 0 {
            0.0
        } else {
            reached as f64 / attempts as f64
        }
    }

    pub fn get_decode_error_rate(&self) -> f64 {
        let received = self.get_deliveries();
        if received == 0 {
            0.0
        } else {
            self.get_decode_failures() as f64 / received as f64
        }
    }

    pub fn get_snapshot(&self) -> HashMap<String, serde_json::Value> {
        let mut snapshot = HashMap::new();

        snapshot.insert("deliveries_received".to_string(), serde_json::json!(self.get_deliveries()));
        snapshot.insert("duplicates_suppressed".to_string(), serde_json::json!(self.get_duplicates()));
        snapshot.insert("decode_failures".to_string(), serde_json::json!(self.get_decode_failures()));
        snapshot.insert("unknown_topics".to_string(), serde_json::json!(self.get_unknown_topics()));
        snapshot.insert("awaiting_sources".to_string(), serde_json::json!(self.get_awaiting_sources()));
        snapshot.insert("consensus_reached".to_string(), serde_json::json!(self.get_consensus_reached()));
        snapshot.insert("consensus_failed".to_string(), serde_json::json!(self.get_consensus_failed()));
        snapshot.insert("published".to_string(), serde_json::json!(self.get_published()));
        snapshot.insert("publish_failures".to_string(), serde_json::json!(self.get_publish_failures()));
        snapshot.insert("consensus_rate".to_string(), serde_json::json!(self.get_consensus_rate()));
        snapshot.insert("uptime_secs".to_string(), serde_json::json!(self.get_uptime_secs()));

        snapshot
    }

    pub fn print_report(&self) {
        tracing::info!(
            "
╔══════════════════════════════════════════════════════════════════════╗
║                  TMR AGGREGATOR METRICS                              ║
╚══════════════════════════════════════════════════════════════════════╝

📥 Deliveries:
   • Received:           {}
   • Duplicates:         {}
   • Decode failures:    {} ({:.2}%)
   • Unknown topics:     {}

🗳️  Voting:
   • Awaiting sources:   {}
   • Consensus reached:  {}
   • Consensus failed:   {}
   • Consensus rate:     {:.2}%

📤 Publishing:
   • Published:          {}
   • Failures:           {}

🔧 Uptime:               {} seconds
━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
",
            self.get_deliveries(),
            self.get_duplicates(),
            self.get_decode_failures(),
            self.get_decode_error_rate() * 100.0,
            self.get_unknown_topics(),
            self.get_awaiting_sources(),
            self.get_consensus_reached(),
            self.get_consensus_failed(),
            self.get_consensus_rate() * 100.0,
            self.get_published(),
            self.get_publish_failures(),
            self.get_uptime_secs(),
        );
    }
}

impl Default for AggregatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}
