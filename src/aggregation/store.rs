use serde::Deserialize;

use super::{Measurement, Quantity, SourceId};
use crate::core::error::DecodeError;

/// Inbound sensor document. Other keys some firmware builds send
/// (`battery`, `average`) are ignored whatever their type.
#[derive(Debug, Clone, Deserialize)]
pub struct SensorPayload {
    pub temperature: f32,
    pub humidity: f32,
}

impl From<SensorPayload> for Measurement {
    fn from(payload: SensorPayload) -> Self {
        Measurement::new(payload.temperature, payload.humidity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreUpdate {
    pub measurement: Measurement,
    pub changed: bool,
}

#[derive(Debug, Default)]
struct Slot {
    raw: Option<Vec<u8>>,
    measurement: Measurement,
}

/// Latest raw payload and decoded measurement per real source.
#[derive(Debug, Default)]
pub struct ReadingStore {
    slots: [Slot; 2],
}

impl ReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a delivery for `source`.
    ///
    /// A payload byte-identical to the stored one is not decoded again and
    /// comes back with `changed == false`. Numbers too large for an `f32`
    /// decode as infinity and are rejected like a malformed payload. On a
    /// decode error the slot keeps both its previous payload and its
    /// previous measurement.
    pub fn update(&mut self, source: SourceId, raw: &[u8]) -> Result<StoreUpdate, DecodeError> {
        let slot = &mut self.slots[source.slot()];

        if slot.raw.as_deref() == Some(raw) {
            return Ok(StoreUpdate {
                measurement: slot.measurement,
                changed: false,
            });
        }

        let payload: SensorPayload =
            serde_json::from_slice(raw).map_err(|e| DecodeError::new(source, e))?;

        let measurement = Measurement::from(payload);
        for quantity in [Quantity::Temperature, Quantity::Humidity] {
            let value = measurement.get(quantity);
            if !value.is_finite() {
                return Err(DecodeError::out_of_range(source, quantity, value));
            }
        }

        slot.raw = Some(raw.to_vec());
        slot.measurement = measurement;

        Ok(StoreUpdate {
            measurement: slot.measurement,
            changed: true,
        })
    }

    pub fn get(&self, source: SourceId) -> Measurement {
        self.slots[source.slot()].measurement
    }

    /// Current (A, B) pair; a source that never reported reads as zero.
    pub fn snapshot(&self) -> (Measurement, Measurement) {
        (self.get(SourceId::A), self.get(SourceId::B))
    }

    pub fn has_reported(&self, source: SourceId) -> bool {
        self.slots[source.slot()].raw.is_some()
    }

    pub fn all_reported(&self) -> bool {
        SourceId::ALL.iter().all(|s| self.has_reported(*s))
    }
}
