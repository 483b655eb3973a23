//! Two-of-three majority voting.
//!
//! For each quantity the three readings produce three pairwise averages, one
//! leaving out each reading. Every reading votes for the average nearest to
//! it. When two readings pick the same average they agree, and that average
//! is the consensus value. A single faulty reading pulls only the averages
//! that include it, so the two healthy readings still meet on theirs.

use std::fmt;

use super::{Measurement, Triple};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Temperature,
    Humidity,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Temperature => write!(f, "temperature"),
            Quantity::Humidity => write!(f, "humidity"),
        }
    }
}

/// Voting detail for one quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantityVote {
    pub quantity: Quantity,
    /// `[avg(a, b), avg(a, synthetic), avg(b, synthetic)]`
    pub averages: [f32; 3],
    /// Index into `averages` chosen by a, b and synthetic respectively.
    pub votes: [usize; 3],
    pub consensus: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsensusResult {
    Agreed(Measurement),
    NoConsensus {
        temperature: QuantityVote,
        humidity: QuantityVote,
    },
}

impl ConsensusResult {
    pub fn agreed(&self) -> Option<Measurement> {
        match self {
            ConsensusResult::Agreed(m) => Some(*m),
            ConsensusResult::NoConsensus { .. } => None,
        }
    }

    /// Quantities that failed to reach agreement.
    pub fn split_quantities(&self) -> Vec<Quantity> {
        match self {
            ConsensusResult::Agreed(_) => Vec::new(),
            ConsensusResult::NoConsensus {
                temperature,
                humidity,
            } => [temperature, humidity]
                .iter()
                .filter(|v| v.consensus.is_none())
                .map(|v| v.quantity)
                .collect(),
        }
    }
}

pub fn pairwise_averages(values: [f32; 3]) -> [f32; 3] {
    [
        (values[0] + values[1]) / 2.0,
        (values[0] + values[2]) / 2.0,
        (values[1] + values[2]) / 2.0,
    ]
}

/// Index of the average closest to `reading`. Ties go to the lowest index.
fn nearest(reading: f32, averages: &[f32; 3]) -> usize {
    let mut vote = 0;
    for (i, avg) in averages.iter().enumerate() {
        if (reading - avg).abs() < (reading - averages[vote]).abs() {
            vote = i;
        }
    }
    vote
}

/// The vote shared by at least two readings, if any.
fn shared_vote(votes: [usize; 3]) -> Option<usize> {
    if votes[0] == votes[1] || votes[0] == votes[2] {
        Some(votes[0])
    } else if votes[1] == votes[2] {
        Some(votes[1])
    } else {
        None
    }
}

/// Votes one quantity. A non-finite reading or average never agrees: its
/// distances are all infinite or NaN, so the nearest-average scan cannot
/// tell the candidates apart.
pub fn vote_quantity(quantity: Quantity, values: [f32; 3]) -> QuantityVote {
    let averages = pairwise_averages(values);
    let votes = [
        nearest(values[0], &averages),
        nearest(values[1], &averages),
        nearest(values[2], &averages),
    ];
    let consensus = if values.iter().chain(averages.iter()).all(|v| v.is_finite()) {
        shared_vote(votes).map(|i| averages[i])
    } else {
        None
    };

    QuantityVote {
        quantity,
        averages,
        votes,
        consensus,
    }
}

/// Votes temperature and humidity independently. Agreement is all or
/// nothing: a split on either quantity yields `NoConsensus`.
pub fn vote(triple: &Triple) -> ConsensusResult {
    let temperature = vote_quantity(Quantity::Temperature, triple.values(Quantity::Temperature));
    let humidity = vote_quantity(Quantity::Humidity, triple.values(Quantity::Humidity));

    match (temperature.consensus, humidity.consensus) {
        (Some(t), Some(h)) => ConsensusResult::Agreed(Measurement::new(t, h)),
        _ => ConsensusResult::NoConsensus {
            temperature,
            humidity,
        },
    }
}
