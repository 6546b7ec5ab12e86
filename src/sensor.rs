//! HTTP client for the oximeter sensor API.
//!
//! Two endpoints back the bot's core flows: the latest sample, polled each
//! tick of a live subscription, and a ranged historical query used before
//! aggregation. An empty historical window is reported by the API as 404 and
//! surfaced here as a distinct `NotFound` outcome rather than a failure.

use crate::core::{DateSelector, Sample};
use std::time::Duration;

/// Client for the sensor API.
pub struct SensorClient {
    base_url: String,
    client: reqwest::Client,
}

/// Sensor client error types.
#[derive(Debug)]
pub enum SensorError {
    /// Network/HTTP error
    Network(String),
    /// Response body could not be decoded
    Decode(String),
    /// No samples exist for the requested window
    NotFound,
    /// Server returned an error response
    Server { status: u16, message: String },
}

impl std::fmt::Display for SensorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorError::Network(msg) => write!(f, "Sensor network error: {msg}"),
            SensorError::Decode(msg) => write!(f, "Sensor decode error: {msg}"),
            SensorError::NotFound => write!(f, "No sensor data for the requested window"),
            SensorError::Server { status, message } => {
                write!(f, "Sensor server error ({status}): {message}")
            }
        }
    }
}

impl std::error::Error for SensorError {}

impl SensorClient {
    /// Create a new sensor client.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// URL of the latest-sample endpoint.
    pub fn latest_url(&self) -> String {
        format!("{}/sensor/last/", self.base_url)
    }

    /// URL of the ranged query for a date selector.
    pub fn range_url(&self, selector: &DateSelector) -> String {
        match *selector {
            DateSelector::Day { day, month, year } => format!(
                "{}/sensor/?year={year}&month={month}&day={day}",
                self.base_url
            ),
            DateSelector::Month { month, year } => {
                format!("{}/sensor/?year={year}&month={month}", self.base_url)
            }
            DateSelector::Year { year } => format!("{}/sensor/?year={year}", self.base_url),
        }
    }

    /// Fetch the latest sample reported by the sensor.
    pub async fn latest_sample(&self) -> Result<Sample, SensorError> {
        let response = self
            .client
            .get(self.latest_url())
            .send()
            .await
            .map_err(|e| SensorError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SensorError::Server {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Sample>()
            .await
            .map_err(|e| SensorError::Decode(e.to_string()))
    }

    /// Fetch all samples in the window described by the selector.
    ///
    /// Returns `NotFound` when the API reports an empty window (404).
    pub async fn samples_for(&self, selector: &DateSelector) -> Result<Vec<Sample>, SensorError> {
        let response = self
            .client
            .get(self.range_url(selector))
            .send()
            .await
            .map_err(|e| SensorError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SensorError::NotFound);
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SensorError::Server {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Vec<Sample>>()
            .await
            .map_err(|e| SensorError::Decode(e.to_string()))
    }
}
