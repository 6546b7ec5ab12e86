//! Freshness classification for the latest sensor sample.
//!
//! The polling loop compares the sample's own timestamp against the local
//! clock, so the check is isolated here as a pure function that takes the
//! evaluation time explicitly. Clock skew between the bot and the sensor is
//! treated as staleness, never as an error.

use crate::core::types::Sample;
use chrono::{Duration, NaiveDateTime};

/// Outcome of classifying a sample's age.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Freshness {
    /// The sample is recent enough to report to the subscriber.
    Fresh(Sample),
    /// The sample is too old, or its timestamp is not strictly in the past.
    Stale,
}

/// Classify a sample as fresh or stale at the given evaluation time.
///
/// A sample is fresh iff `0 < age <= max_age`. The lower bound is strict: a
/// sample whose timestamp equals or postdates the evaluation time indicates
/// clock skew rather than a confirmed live reading, and is classified stale.
pub fn evaluate(sample: &Sample, evaluated_at: NaiveDateTime, max_age: Duration) -> Freshness {
    let age = evaluated_at.signed_duration_since(sample.timestamp);

    if age > Duration::zero() && age <= max_age {
        Freshness::Fresh(*sample)
    } else {
        Freshness::Stale
    }
}
