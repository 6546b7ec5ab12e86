//! Client for the external chart rendering service.
//!
//! The aggregated series are posted as a Chart.js line-chart configuration to
//! a QuickChart-compatible endpoint, which replies with PNG bytes. The
//! renderer is purely a sink; nothing it returns feeds back into the core
//! beyond the image itself.

use crate::core::Series;
use std::time::Duration;

/// Client for the chart renderer.
pub struct ChartClient {
    base_url: String,
    client: reqwest::Client,
}

/// Chart renderer error types.
#[derive(Debug)]
pub enum ChartError {
    /// Network/HTTP error
    Network(String),
    /// Server returned an error response
    Server { status: u16, message: String },
}

impl std::fmt::Display for ChartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartError::Network(msg) => write!(f, "Chart network error: {msg}"),
            ChartError::Server { status, message } => {
                write!(f, "Chart server error ({status}): {message}")
            }
        }
    }
}

impl std::error::Error for ChartError {}

impl ChartClient {
    /// Create a new chart client.
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

    /// URL of the render endpoint.
    pub fn render_url(&self) -> String {
        format!("{}/chart", self.base_url)
    }

    /// Build the Chart.js configuration for a set of series.
    ///
    /// The x-axis labels come from the first series; the aggregation step
    /// guarantees all series share that label ordering, so the datasets align
    /// positionally.
    pub fn line_chart_config(title: &str, series: &[Series]) -> serde_json::Value {
        let labels = series.first().map(|s| s.labels()).unwrap_or_default();

        let datasets: Vec<serde_json::Value> = series
            .iter()
            .map(|s| {
                serde_json::json!({
                    "label": s.metric.to_string(),
                    "data": s.values(),
                    "fill": false,
                })
            })
            .collect();

        serde_json::json!({
            "type": "line",
            "data": {
                "labels": labels,
                "datasets": datasets,
            },
            "options": {
                "title": {
                    "display": true,
                    "text": title,
                },
            },
        })
    }

    /// Render the series as a PNG line chart.
    pub async fn render_line_chart(
        &self,
        title: &str,
        series: &[Series],
    ) -> Result<Vec<u8>, ChartError> {
        let payload = serde_json::json!({
            "chart": Self::line_chart_config(title, series),
            "format": "png",
            "width": 800,
            "height": 400,
            "backgroundColor": "white",
        });

        let response = self
            .client
            .post(self.render_url())
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| ChartError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ChartError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ChartError::Network(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Metric;

    #[test]
    fn test_render_url() {
        let client = ChartClient::new("https://quickchart.io", Duration::from_secs(10));
        assert_eq!(client.render_url(), "https://quickchart.io/chart");
    }

    #[test]
    fn test_line_chart_config_aligns_datasets() {
        let series = vec![
            Series {
                metric: Metric::Bpm,
                points: vec![("10:00:00".to_string(), 72), ("10:00:05".to_string(), 80)],
            },
            Series {
                metric: Metric::Spo2,
                points: vec![("10:00:00".to_string(), 97), ("10:00:05".to_string(), 98)],
            },
        ];

        let config = ChartClient::line_chart_config("21/02/2023", &series);

        assert_eq!(config["type"], "line");
        assert_eq!(config["data"]["labels"][0], "10:00:00");
        assert_eq!(config["data"]["datasets"][0]["label"], "bpm");
        assert_eq!(config["data"]["datasets"][1]["label"], "spo2");
        assert_eq!(config["data"]["datasets"][0]["data"][1], 80);
        assert_eq!(config["options"]["title"]["text"], "21/02/2023");
    }

    #[test]
    fn test_line_chart_config_empty_series() {
        let config = ChartClient::line_chart_config("empty", &[]);
        assert_eq!(config["data"]["labels"], serde_json::json!([]));
        assert_eq!(config["data"]["datasets"], serde_json::json!([]));
    }
}
