//! Synthetic readings and the publish envelope
//!
//! A [`Reading`] is one measurement snapshot in the exact key spelling and
//! field order the ingest pipeline expects. Serialized field order follows
//! struct declaration order, so the struct layouts here are part of the wire
//! format.

use crate::constants::{ranges, wire};
use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A metric value that renders the way JavaScript numbers do
///
/// Integral values serialize without a fractional part (`12`, not `12.0`),
/// everything else as a plain float.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Integer(i64),
    Float(f64),
}

impl MetricValue {
    /// Wraps a float, demoting integral values to the integer variant
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() && value.fract() == 0.0 {
            MetricValue::Integer(value as i64)
        } else {
            MetricValue::Float(value)
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Integer(value) => *value as f64,
            MetricValue::Float(value) => *value,
        }
    }

    #[must_use]
    pub fn is_integer(&self) -> bool {
        matches!(self, MetricValue::Integer(_))
    }
}

/// One measured quantity with its display metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadField {
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub unit: String,
    pub value: MetricValue,
}

/// The fixed metric set of this sensor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadFields {
    pub temperature: PayloadField,
    pub distance: PayloadField,
}

/// Reading metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(rename = "deploymentType")]
    pub deployment_type: String,
}

/// One synthetic measurement snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub app_name: String,
    /// ISO-8601 UTC timestamp with millisecond precision
    pub time: String,
    pub metadata: Metadata,
    pub payload_fields: PayloadFields,
}

impl Reading {
    /// Generates a reading from the thread-local RNG and the current time
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng(), Utc::now())
    }

    /// Generates a reading from an explicit RNG and timestamp
    ///
    /// Temperature is uniform in [60, 80) degrees Fahrenheit truncated to
    /// two decimals; distance is a whole number of centimeters in [0, 30).
    #[must_use]
    pub fn generate_with(rng: &mut impl Rng, time: DateTime<Utc>) -> Self {
        let temperature =
            truncate_centi(rng.gen_range(ranges::TEMPERATURE_MIN..ranges::TEMPERATURE_MAX));
        let distance = rng.gen_range(0..ranges::DISTANCE_MAX);

        Self {
            app_name: wire::APP_NAME.to_string(),
            time: time.to_rfc3339_opts(SecondsFormat::Millis, true),
            metadata: Metadata {
                deployment_type: wire::DEPLOYMENT_TYPE.to_string(),
            },
            payload_fields: PayloadFields {
                temperature: PayloadField {
                    display_name: wire::TEMPERATURE_DISPLAY_NAME.to_string(),
                    unit: wire::TEMPERATURE_UNIT.to_string(),
                    value: MetricValue::from_f64(temperature),
                },
                distance: PayloadField {
                    display_name: wire::DISTANCE_DISPLAY_NAME.to_string(),
                    unit: wire::DISTANCE_UNIT.to_string(),
                    value: MetricValue::Integer(distance),
                },
            },
        }
    }
}

/// The outer JSON object sent to the broker
///
/// Built fresh for every firing; `token` serializes as `null` until the
/// identity provider has issued one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub app_name: String,
    pub token: Option<String>,
    pub data: Reading,
}

impl Envelope {
    #[must_use]
    pub fn new(token: Option<String>, data: Reading) -> Self {
        Self {
            app_name: wire::APP_NAME.to_string(),
            token,
            data,
        }
    }
}

/// Truncates to two decimals, toward zero for the positive ranges used here
fn truncate_centi(value: f64) -> f64 {
    (value * 100.0).floor() / 100.0
}
