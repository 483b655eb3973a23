//! Device-twin update document.
//!
//! Only the fields this service fills are modelled; everything else in the
//! schema is optional and left out of the serialized form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregation::Measurement;

pub const UPDATED: &str = "Updated";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwinValue {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeMetadata {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsgTwin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<TwinValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TypeMetadata>,
}

impl MsgTwin {
    pub fn actual(value: String) -> Self {
        Self {
            actual: Some(TwinValue { value }),
            metadata: Some(TypeMetadata {
                kind: UPDATED.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceTwinUpdate {
    #[serde(flatten)]
    pub base: BaseMessage,
    pub twin: BTreeMap<String, MsgTwin>,
}

impl DeviceTwinUpdate {
    /// Reports both properties as actual values with two fractional digits.
    pub fn actual(measurement: Measurement, base: BaseMessage) -> Self {
        let mut twin = BTreeMap::new();
        twin.insert(
            "temperature".to_string(),
            MsgTwin::actual(format_value(measurement.temperature)),
        );
        twin.insert(
            "humidity".to_string(),
            MsgTwin::actual(format_value(measurement.humidity)),
        );
        Self { base, twin }
    }

    pub fn to_vec(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

pub fn format_value(value: f32) -> String {
    format!("{:.2}", value)
}
