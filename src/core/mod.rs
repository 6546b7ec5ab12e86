//! Core logic of the oximeter bot.
//!
//! This module contains:
//! - The shared data types (samples, readings, subscriber identity)
//! - Freshness classification of the latest sample
//! - Granularity-driven date selectors and bucket labels
//! - Time-bucketed aggregation into chartable series

pub mod aggregate;
pub mod freshness;
pub mod granularity;
pub mod types;

// Re-export commonly used types
pub use aggregate::{aggregate, Series};
pub use freshness::{evaluate, Freshness};
pub use granularity::{DateSelector, Granularity, SelectorError};
pub use types::{Metric, Reading, Sample, SubscriberId};
