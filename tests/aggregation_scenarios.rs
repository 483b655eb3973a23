use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tmr_sensor_aggregator::aggregation::{
    AggregationController, AggregationMode, FixedSynthesizer, Measurement, Outcome, RandomSynthesizer,
    SignalSynthesizer, SourceId, DEFAULT_SPREAD,
};
use tmr_sensor_aggregator::core::TransportError;
use tmr_sensor_aggregator::publishing::{Transport, TwinPublisher};
use tmr_sensor_aggregator::streaming::{InboundMessage, SensorFeed};

const TWIN_TOPIC: &str = "$hw/events/device/hudtemp-aggregated/twin/update";

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingTransport {
    fn sent(&self) -> Vec<(String, serde_json::Value)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        let value = serde_json::from_slice(&payload).map_err(|e| TransportError::Rejected(e.to_string()))?;
        self.sent.lock().unwrap().push((topic.to_string(), value));
        Ok(())
    }
}

fn setup(synthesizer: Box<dyn SignalSynthesizer>) -> (Arc<RecordingTransport>, AggregationController) {
    let transport = Arc::new(RecordingTransport::default());
    let publisher = TwinPublisher::new(transport.clone(), TWIN_TOPIC, Duration::from_secs(1));
    (transport, AggregationController::new(publisher, synthesizer))
}

fn payload(temperature: f32, humidity: f32) -> Vec<u8> {
    format!(
        r#"{{"temperature": {}, "humidity": {}, "battery": 88, "average": 1}}"#,
        temperature, humidity
    )
    .into_bytes()
}

fn twin_values(doc: &serde_json::Value) -> (String, String) {
    (
        doc["twin"]["temperature"]["actual"]["value"].as_str().unwrap().to_string(),
        doc["twin"]["humidity"]["actual"]["value"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_scenario_close_pair_with_outlier_publishes_pair_average() {
    let (transport, controller) = setup(Box::new(FixedSynthesizer(Measurement::new(25.0, 40.0))));

    controller.observed_a(&payload(20.0, 50.0)).await.unwrap();
    controller.observed_b(&payload(20.2, 49.8)).await.unwrap();

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, TWIN_TOPIC);
    assert_eq!(twin_values(&sent[0].1), ("20.10".to_string(), "49.90".to_string()));
    assert_eq!(sent[0].1["twin"]["temperature"]["metadata"]["type"], "Updated");
}

#[tokio::test]
async fn test_scenario_evenly_spaced_temperatures_publish_nothing() {
    let (transport, controller) = setup(Box::new(FixedSynthesizer(Measurement::new(50.0, 50.0))));

    controller.observed_a(&payload(10.0, 50.0)).await.unwrap();
    let outcome = controller.observed_b(&payload(30.0, 50.0)).await.unwrap();

    assert!(matches!(outcome, Outcome::NoConsensus(_)));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_scenario_single_source_never_publishes() {
    let (transport, controller) = setup(Box::new(RandomSynthesizer::seeded(5, DEFAULT_SPREAD)));

    for i in 0..10 {
        let outcome = controller.observed_a(&payload(21.0 + i as f32, 45.0)).await.unwrap();
        assert_eq!(outcome, Outcome::AwaitingSources);
    }
    assert!(transport.sent().is_empty());
    assert_eq!(controller.snapshot().await.1, Measurement::default());

    // Once B reports, identical A and B readings always agree
    controller.observed_b(&payload(21.0, 45.0)).await.unwrap();
    controller.observed_a(&payload(21.0, 45.0)).await.unwrap();
    let last = transport.sent().pop().unwrap();
    assert_eq!(twin_values(&last.1), ("21.00".to_string(), "45.00".to_string()));
}

#[tokio::test]
async fn test_redelivery_aggregates_once() {
    let (transport, controller) = setup(Box::new(FixedSynthesizer(Measurement::new(25.0, 40.0))));

    controller.observed_a(&payload(20.0, 50.0)).await.unwrap();
    for _ in 0..5 {
        controller.observed_b(&payload(20.2, 49.8)).await.unwrap();
    }

    assert_eq!(transport.sent().len(), 1);
    assert_eq!(controller.metrics().get_duplicates(), 4);
}

#[tokio::test]
async fn test_out_of_range_reading_never_reaches_the_twin() {
    let (transport, controller) = setup(Box::new(RandomSynthesizer::seeded(8, DEFAULT_SPREAD)));

    controller.observed_a(&payload(20.0, 50.0)).await.unwrap();
    controller.observed_b(br#"{"temperature": 20.2, "humidity": 1e39}"#).await.unwrap_err();
    controller.observed_b(br#"{"temperature": 20.2, "humidity": 49.8, "battery": 97.5}"#).await.unwrap();

    for (_, doc) in transport.sent() {
        let (temperature, humidity) = twin_values(&doc);
        assert!(temperature.parse::<f32>().unwrap().is_finite());
        assert!(humidity.parse::<f32>().unwrap().is_finite());
    }
    assert_eq!(controller.snapshot().await.1, Measurement::new(20.2, 49.8));
    assert_eq!(controller.metrics().get_decode_failures(), 1);
}

#[tokio::test]
async fn test_fixed_seed_is_deterministic() {
    async fn published(seed: u64) -> Vec<(String, String)> {
        let (transport, controller) = setup(Box::new(RandomSynthesizer::seeded(seed, DEFAULT_SPREAD)));
        for i in 0..30 {
            let t = 18.0 + (i % 7) as f32 * 0.3;
            controller.observed_a(&payload(t, 40.0 + i as f32)).await.unwrap();
            controller.observed_b(&payload(t + 0.4, 41.0 + i as f32)).await.unwrap();
        }
        transport.sent().iter().map(|(_, doc)| twin_values(doc)).collect()
    }

    assert_eq!(published(99).await, published(99).await);
}

#[tokio::test]
async fn test_passthrough_mode_relays_without_voting() {
    let (transport, controller) = setup(Box::new(FixedSynthesizer(Measurement::new(99.0, 99.0))));
    let controller = controller.with_mode(AggregationMode::PassThrough);

    controller.observed_a(&payload(20.0, 50.0)).await.unwrap();
    controller.observed_b(&payload(30.0, 60.0)).await.unwrap();

    let values: Vec<_> = transport.sent().iter().map(|(_, doc)| twin_values(doc)).collect();
    assert_eq!(
        values,
        vec![
            ("20.00".to_string(), "50.00".to_string()),
            ("30.00".to_string(), "60.00".to_string()),
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deliveries_are_serialized() {
    let (transport, controller) = setup(Box::new(RandomSynthesizer::seeded(17, DEFAULT_SPREAD)));
    let controller = Arc::new(controller);

    let mut handles = Vec::new();
    for i in 0..100 {
        let controller = controller.clone();
        let source = if i % 2 == 0 { SourceId::A } else { SourceId::B };
        handles.push(tokio::spawn(async move {
            let raw = payload(20.0 + (i % 5) as f32 * 0.1, 50.0 + (i % 3) as f32 * 0.1);
            controller.observe(source, &raw).await.unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let metrics = controller.metrics();
    assert_eq!(metrics.get_deliveries(), 100);
    assert_eq!(
        metrics.get_duplicates()
            + metrics.get_awaiting_sources()
            + metrics.get_consensus_reached()
            + metrics.get_consensus_failed(),
        100
    );
    assert_eq!(metrics.get_published(), metrics.get_consensus_reached());
    assert_eq!(transport.sent().len() as u64, metrics.get_published());
}

#[tokio::test]
async fn test_feed_routes_topics_to_sources() {
    let (transport, controller) = setup(Box::new(FixedSynthesizer(Measurement::new(25.0, 40.0))));
    let feed = SensorFeed::new(Arc::new(controller), "sensors/livingroom1", "sensors/livingroom2");

    let lines = [
        r#"sensors/livingroom1 {"temperature": 20.0, "humidity": 50.0}"#,
        r#"sensors/kitchen {"temperature": 80.0, "humidity": 10.0}"#,
        r#"sensors/livingroom2 {"temperature": 20.2, "humidity": 49.8}"#,
    ];
    for line in lines {
        let msg = InboundMessage::parse_line(line).unwrap();
        let _ = feed.dispatch(&msg).await;
    }

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(twin_values(&sent[0].1), ("20.10".to_string(), "49.90".to_string()));
}
