//! Fault-masking aggregator for a pair of temperature/humidity sensors.
//!
//! Each delivery from sensor A or B updates a latest-value store; the pair
//! plus a synthesized third reading goes through a two-of-three vote, and an
//! agreed reading is republished as a device-twin update.

pub mod aggregation;
pub mod core;
pub mod publishing;
pub mod streaming;
