pub mod controller;
pub mod store;
pub mod synthesizer;
pub mod voter;

pub use controller::{AggregationController, AggregationMode, Outcome};
pub use store::{ReadingStore, StoreUpdate};
pub use synthesizer::{FixedSynthesizer, RandomSynthesizer, SignalSynthesizer, DEFAULT_SPREAD};
pub use voter::{vote, vote_quantity, ConsensusResult, Quantity, QuantityVote};

use std::fmt;

/// A temperature/humidity pair from one source, physical or synthetic.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Measurement {
    pub temperature: f32,
    pub humidity: f32,
}

impl Measurement {
    pub fn new(temperature: f32, humidity: f32) -> Self {
        Self {
            temperature,
            humidity,
        }
    }

    pub fn get(&self, quantity: Quantity) -> f32 {
        match quantity {
            Quantity::Temperature => self.temperature,
            Quantity::Humidity => self.humidity,
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}°C / {:.2}%", self.temperature, self.humidity)
    }
}

/// The two externally delivered sensors. The synthetic third reading is never
/// stored, so it has no slot here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    A,
    B,
}

impl SourceId {
    pub const ALL: [SourceId; 2] = [SourceId::A, SourceId::B];

    pub(crate) fn slot(self) -> usize {
        match self {
            SourceId::A => 0,
            SourceId::B => 1,
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::A => write!(f, "A"),
            SourceId::B => write!(f, "B"),
        }
    }
}

/// Readings in voting order: `a`, `b`, then `synthetic`. Index 0/1/2 in
/// vote sets and average sets follows this order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triple {
    pub a: Measurement,
    pub b: Measurement,
    pub synthetic: Measurement,
}

impl Triple {
    pub fn new(a: Measurement, b: Measurement, synthetic: Measurement) -> Self {
        Self { a, b, synthetic }
    }

    pub fn values(&self, quantity: Quantity) -> [f32; 3] {
        [
            self.a.get(quantity),
            self.b.get(quantity),
            self.synthetic.get(quantity),
        ]
    }
}
