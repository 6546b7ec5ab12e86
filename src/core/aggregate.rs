//! Time-bucketed aggregation of raw readings into chartable series.
//!
//! Readings are grouped by the bucket label derived from the requested
//! granularity and each bucket is reduced to the integer average of its
//! values. Labels keep their first-occurrence order from the input stream;
//! they are never re-sorted, and buckets with no readings never appear.

use crate::core::granularity::Granularity;
use crate::core::types::{Metric, Reading};
use std::collections::HashMap;

/// An ordered label/value sequence for one metric, ready for plotting.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// The metric this series charts
    pub metric: Metric,
    /// (bucket label, averaged value) pairs in first-occurrence order
    pub points: Vec<(String, i64)>,
}

impl Series {
    /// Bucket labels in order.
    pub fn labels(&self) -> Vec<&str> {
        self.points.iter().map(|(label, _)| label.as_str()).collect()
    }

    /// Averaged values in label order.
    pub fn values(&self) -> Vec<i64> {
        self.points.iter().map(|(_, value)| *value).collect()
    }
}

/// Aggregate readings into one series per metric.
///
/// The caller is expected to have filtered `readings` to the requested date
/// window; this function only truncates timestamps to bucket labels. Both
/// metrics of a sample carry the same timestamp, so the series share one
/// label ordering and the charted points align positionally.
///
/// An empty input returns an empty vector. The bot short-circuits on the
/// sensor's not-found signal before aggregating, so this path is a safety
/// net rather than a user flow.
pub fn aggregate(readings: &[Reading], granularity: Granularity) -> Vec<Series> {
    let mut metric_order: Vec<Metric> = Vec::new();
    let mut label_order: HashMap<Metric, Vec<String>> = HashMap::new();
    let mut buckets: HashMap<Metric, HashMap<String, Vec<i64>>> = HashMap::new();

    for reading in readings {
        let label = granularity.bucket_label(reading.timestamp);

        if !buckets.contains_key(&reading.metric) {
            metric_order.push(reading.metric);
        }
        let labels = label_order.entry(reading.metric).or_default();
        let values = buckets.entry(reading.metric).or_default();

        if !values.contains_key(&label) {
            labels.push(label.clone());
        }
        values.entry(label).or_default().push(reading.value);
    }

    metric_order
        .into_iter()
        .map(|metric| {
            // Both maps were populated together above.
            let labels = label_order.remove(&metric).unwrap_or_default();
            let mut values = buckets.remove(&metric).unwrap_or_default();

            let points = labels
                .into_iter()
                .map(|label| {
                    let bucket = values.remove(&label).unwrap_or_default();
                    let average = bucket.iter().sum::<i64>() / bucket.len().max(1) as i64;
                    (label, average)
                })
                .collect();

            Series { metric, points }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_day_aggregation_averages_same_second() {
        let readings = vec![
            Reading::new(ts(2023, 2, 21, 10, 0, 0), Metric::Bpm, 70),
            Reading::new(ts(2023, 2, 21, 10, 0, 0), Metric::Bpm, 74),
            Reading::new(ts(2023, 2, 21, 10, 0, 5), Metric::Bpm, 80),
        ];

        let series = aggregate(&readings, Granularity::Day);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].metric, Metric::Bpm);
        assert_eq!(
            series[0].points,
            vec![("10:00:00".to_string(), 72), ("10:00:05".to_string(), 80)]
        );
    }

    #[test]
    fn test_integer_average_floors() {
        let readings = vec![
            Reading::new(ts(2023, 2, 21, 10, 0, 0), Metric::Spo2, 97),
            Reading::new(ts(2023, 2, 21, 10, 0, 0), Metric::Spo2, 98),
        ];

        let series = aggregate(&readings, Granularity::Day);
        // (97 + 98) / 2 = 97 under floor division.
        assert_eq!(series[0].points, vec![("10:00:00".to_string(), 97)]);
    }

    #[test]
    fn test_single_reading_passes_through() {
        let readings = vec![Reading::new(ts(2023, 2, 21, 10, 0, 0), Metric::Bpm, 65)];

        let series = aggregate(&readings, Granularity::Day);
        assert_eq!(series[0].points, vec![("10:00:00".to_string(), 65)]);
    }

    #[test]
    fn test_month_aggregation_groups_by_day() {
        let readings = vec![
            Reading::new(ts(2023, 2, 1, 9, 0, 0), Metric::Bpm, 60),
            Reading::new(ts(2023, 2, 1, 21, 0, 0), Metric::Bpm, 80),
            Reading::new(ts(2023, 2, 15, 12, 0, 0), Metric::Bpm, 75),
        ];

        let series = aggregate(&readings, Granularity::Month);
        assert_eq!(
            series[0].points,
            vec![
                ("01/02/2023".to_string(), 70),
                ("15/02/2023".to_string(), 75)
            ]
        );
    }

    #[test]
    fn test_year_aggregation_groups_by_month() {
        let readings = vec![
            Reading::new(ts(2023, 1, 10, 9, 0, 0), Metric::Spo2, 96),
            Reading::new(ts(2023, 1, 20, 9, 0, 0), Metric::Spo2, 98),
            Reading::new(ts(2023, 6, 5, 9, 0, 0), Metric::Spo2, 99),
        ];

        let series = aggregate(&readings, Granularity::Year);
        assert_eq!(
            series[0].points,
            vec![("01/2023".to_string(), 97), ("06/2023".to_string(), 99)]
        );
    }

    #[test]
    fn test_two_metrics_share_label_ordering() {
        let sample_times = [ts(2023, 2, 21, 10, 0, 0), ts(2023, 2, 21, 10, 0, 5)];
        let mut readings = Vec::new();
        for (i, t) in sample_times.iter().enumerate() {
            readings.push(Reading::new(*t, Metric::Bpm, 70 + i as i64));
            readings.push(Reading::new(*t, Metric::Spo2, 97));
        }

        let series = aggregate(&readings, Granularity::Day);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].metric, Metric::Bpm);
        assert_eq!(series[1].metric, Metric::Spo2);
        assert_eq!(series[0].labels(), series[1].labels());
    }

    #[test]
    fn test_day_labels_collapse_across_calendar_days() {
        // Day granularity keeps only time-of-day: readings from different
        // calendar days with the same clock time land in one bucket. The
        // caller must pre-filter to a single day.
        let readings = vec![
            Reading::new(ts(2023, 2, 21, 10, 0, 0), Metric::Bpm, 60),
            Reading::new(ts(2023, 2, 22, 10, 0, 0), Metric::Bpm, 80),
        ];

        let series = aggregate(&readings, Granularity::Day);
        assert_eq!(series[0].points, vec![("10:00:00".to_string(), 70)]);
    }

    #[test]
    fn test_empty_input_yields_no_series() {
        assert!(aggregate(&[], Granularity::Day).is_empty());
    }
}
