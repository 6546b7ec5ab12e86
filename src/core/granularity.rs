//! Chart granularity and the date selector that accompanies it.
//!
//! Each granularity owns its timestamp truncation rule (the bucket label) and
//! the shape of the date argument the user must supply, so adding a new
//! resolution is one new variant rather than edits scattered across parsing,
//! fetching and labeling.

use chrono::{NaiveDate, NaiveDateTime};

/// Requested chart resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// One bucket per second of the requested day
    Day,
    /// One bucket per day of the requested month
    Month,
    /// One bucket per month of the requested year
    Year,
}

impl Granularity {
    /// Derive the bucket label for a timestamp under this granularity.
    ///
    /// Day keeps only the time-of-day component, so two readings with the same
    /// time on different calendar days share a bucket. Correctness relies on
    /// the caller having filtered the readings to a single day first.
    pub fn bucket_label(&self, timestamp: NaiveDateTime) -> String {
        match self {
            Granularity::Day => timestamp.format("%H:%M:%S").to_string(),
            Granularity::Month => timestamp.format("%d/%m/%Y").to_string(),
            Granularity::Year => timestamp.format("%m/%Y").to_string(),
        }
    }
}

/// A partially-specified calendar date selecting a historical window.
///
/// The required fields depend on the granularity: a day view needs the full
/// date, a month view needs month and year, a year view only the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSelector {
    Day { day: u32, month: u32, year: i32 },
    Month { month: u32, year: i32 },
    Year { year: i32 },
}

impl DateSelector {
    /// The granularity this selector belongs to.
    pub fn granularity(&self) -> Granularity {
        match self {
            DateSelector::Day { .. } => Granularity::Day,
            DateSelector::Month { .. } => Granularity::Month,
            DateSelector::Year { .. } => Granularity::Year,
        }
    }

    /// Parse a selector from a granularity keyword and a date argument.
    ///
    /// Accepted shapes: `day DD/MM/YYYY`, `month MM/YYYY`, `year YYYY`.
    /// Calendar validity is checked here so malformed selectors never reach
    /// the aggregation or fetch paths.
    pub fn parse(kind: &str, date: &str) -> Result<Self, SelectorError> {
        match kind.to_lowercase().as_str() {
            "day" => {
                let (day, month, year) = match date.split('/').collect::<Vec<_>>()[..] {
                    [d, m, y] => (parse_field(d)?, parse_field(m)?, parse_field(y)?),
                    _ => return Err(SelectorError::BadDate(date.to_string())),
                };
                // Rejects day 31 in a 30-day month, Feb 30, etc.
                if NaiveDate::from_ymd_opt(year, month as u32, day as u32).is_none() {
                    return Err(SelectorError::BadDate(date.to_string()));
                }
                Ok(DateSelector::Day {
                    day: day as u32,
                    month: month as u32,
                    year,
                })
            }
            "month" => {
                let (month, year) = match date.split('/').collect::<Vec<_>>()[..] {
                    [m, y] => (parse_field(m)?, parse_field(y)?),
                    _ => return Err(SelectorError::BadDate(date.to_string())),
                };
                if !(1..=12).contains(&month) {
                    return Err(SelectorError::BadDate(date.to_string()));
                }
                Ok(DateSelector::Month {
                    month: month as u32,
                    year,
                })
            }
            "year" => {
                let year = parse_field(date)?;
                Ok(DateSelector::Year { year })
            }
            other => Err(SelectorError::BadGranularity(other.to_string())),
        }
    }
}

fn parse_field(s: &str) -> Result<i32, SelectorError> {
    s.parse::<i32>()
        .map_err(|_| SelectorError::BadDate(s.to_string()))
}

impl std::fmt::Display for DateSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateSelector::Day { day, month, year } => {
                write!(f, "{day:02}/{month:02}/{year:04}")
            }
            DateSelector::Month { month, year } => write!(f, "{month:02}/{year:04}"),
            DateSelector::Year { year } => write!(f, "{year:04}"),
        }
    }
}

/// A malformed granularity or date argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    BadGranularity(String),
    BadDate(String),
}

impl std::fmt::Display for SelectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectorError::BadGranularity(s) => {
                write!(f, "unknown granularity '{s}' (expected day, month or year)")
            }
            SelectorError::BadDate(s) => write!(f, "invalid date '{s}'"),
        }
    }
}

impl std::error::Error for SelectorError {}
