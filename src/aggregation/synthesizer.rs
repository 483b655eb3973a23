//! Third-signal synthesis.
//!
//! Two physical sensors cannot out-vote each other, so a third estimate is
//! drawn uniformly from a band around their midpoint. It behaves like a
//! third sensor with the same tolerance but independent noise.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::Measurement;

/// Half-width of the synthetic band, in sensor units.
pub const DEFAULT_SPREAD: f32 = 5.0;

pub trait SignalSynthesizer: Send {
    fn synthesize(&mut self, a: Measurement, b: Measurement) -> Measurement;
}

/// Uniform draw in `[avg - spread, avg + spread)` per quantity.
pub struct RandomSynthesizer<R = StdRng> {
    rng: R,
    spread: f32,
}

impl RandomSynthesizer<StdRng> {
    pub fn seeded(seed: u64, spread: f32) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), spread)
    }

    pub fn from_entropy(spread: f32) -> Self {
        Self::with_rng(StdRng::from_entropy(), spread)
    }
}

impl<R: Rng> RandomSynthesizer<R> {
    pub fn with_rng(rng: R, spread: f32) -> Self {
        Self { rng, spread }
    }

    pub fn spread(&self) -> f32 {
        self.spread
    }

    fn around(&mut self, a: f32, b: f32) -> f32 {
        let min = (a + b) / 2.0 - self.spread;
        // gen::<f32>() is in [0, 1), so the upper bound stays open
        min + self.rng.gen::<f32>() * (2.0 * self.spread)
    }
}

impl<R: Rng + Send> SignalSynthesizer for RandomSynthesizer<R> {
    fn synthesize(&mut self, a: Measurement, b: Measurement) -> Measurement {
        let temperature = self.around(a.temperature, b.temperature);
        let humidity = self.around(a.humidity, b.humidity);
        Measurement::new(temperature, humidity)
    }
}

/// Always yields the same reading. Used to pin the third vote in tests and
/// replay tooling.
#[derive(Debug, Clone, Copy)]
pub struct FixedSynthesizer(pub Measurement);

impl SignalSynthesizer for FixedSynthesizer {
    fn synthesize(&mut self, _a: Measurement, _b: Measurement) -> Measurement {
        self.0
    }
}
