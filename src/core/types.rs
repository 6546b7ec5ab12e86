//! Core data types shared by the scheduler, freshness check and aggregation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Identity of a subscriber (one per chat).
///
/// At most one recurring poll task may be active per subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriberId(pub i64);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single oximeter sample as reported by the sensor API.
///
/// The timestamp comes from the sensor's own clock and is naive (no offset);
/// the wire format is `%Y-%m-%dT%H:%M:%S`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Timestamp of the reading (sensor clock)
    #[serde(rename = "date")]
    pub timestamp: NaiveDateTime,
    /// Heart rate in beats per minute
    pub bpm: i64,
    /// Blood-oxygen saturation in percent
    pub spo2: i64,
}

/// The metrics a sample carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// Heart rate (beats per minute)
    Bpm,
    /// Blood-oxygen saturation (percent)
    Spo2,
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Bpm => write!(f, "bpm"),
            Metric::Spo2 => write!(f, "spo2"),
        }
    }
}

/// One timestamped metric value, the input unit of aggregation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Timestamp of the underlying sample
    pub timestamp: NaiveDateTime,
    /// Which metric this value belongs to
    pub metric: Metric,
    /// Raw metric value
    pub value: i64,
}

impl Reading {
    pub fn new(timestamp: NaiveDateTime, metric: Metric, value: i64) -> Self {
        Self {
            timestamp,
            metric,
            value,
        }
    }
}

impl Sample {
    /// Split a sample into one reading per metric.
    pub fn readings(&self) -> [Reading; 2] {
        [
            Reading::new(self.timestamp, Metric::Bpm, self.bpm),
            Reading::new(self.timestamp, Metric::Spo2, self.spo2),
        ]
    }
}
