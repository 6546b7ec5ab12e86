//! Command dispatch and the bot's main loop.
//!
//! Inbound chat commands map to three core entry points: start polling, stop
//! polling, and request a chart. Date arguments are parsed and validated here,
//! so malformed selectors never reach the fetch or aggregation paths. Every
//! failure path ends in a descriptive chat message; nothing that goes wrong
//! inside a poll tick can silently terminate the subscriber's schedule.

use crate::chart::ChartClient;
use crate::config::Config;
use crate::core::{aggregate, evaluate, DateSelector, Freshness, Reading, Sample, SubscriberId};
use crate::scheduler::Scheduler;
use crate::sensor::{SensorClient, SensorError};
use crate::telegram::TelegramClient;
use crate::HELP_TEXT;
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;

/// Reply to `/start`.
const GREETING: &str = "Hello! Send /help to see the available commands.";

/// Reply to an unrecognized command.
const UNKNOWN_COMMAND: &str = "Unknown command! Send /help to see the available commands.";

/// Reply to `/stop` when no poll task was active.
const NOT_MONITORING: &str = "No monitoring was active.";

/// Notice sent when the latest sample is stale.
const STALE_NOTICE: &str = "No recent data has been received from the oximeter!";

/// Reply when the historical window has no samples.
const NO_DATA: &str = "No readings were found for the requested period.";

/// Reply when fetching or rendering a chart fails.
const CHART_FAILED: &str = "Could not build the chart right now, please try again later.";

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `/start`: greeting
    Start,
    /// `/help`: command list
    Help,
    /// `/monitor`: begin receiving live readings
    Monitor,
    /// `/stop`: stop receiving live readings
    Stop,
    /// `/chart <day|month|year> <date>`: historical chart
    Chart(DateSelector),
}

/// Why a message did not produce a command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    /// The message is not a command at all; ignored silently.
    NotACommand,
    /// The command name is not recognized.
    Unknown,
    /// `/chart` was given a malformed granularity or date.
    InvalidSelector(String),
}

impl Command {
    /// Parse a chat message into a command.
    pub fn parse(text: &str) -> Result<Command, CommandError> {
        let mut parts = text.split_whitespace();
        let name = match parts.next() {
            Some(word) if word.starts_with('/') => word,
            _ => return Err(CommandError::NotACommand),
        };

        match name {
            "/start" => Ok(Command::Start),
            "/help" => Ok(Command::Help),
            "/monitor" => Ok(Command::Monitor),
            "/stop" => Ok(Command::Stop),
            "/chart" => {
                let (kind, date) = match (parts.next(), parts.next()) {
                    (Some(kind), Some(date)) => (kind, date),
                    _ => {
                        return Err(CommandError::InvalidSelector(
                            "usage: /chart day DD/MM/YYYY | month MM/YYYY | year YYYY".to_string(),
                        ))
                    }
                };
                DateSelector::parse(kind, date)
                    .map(Command::Chart)
                    .map_err(|e| CommandError::InvalidSelector(e.to_string()))
            }
            _ => Err(CommandError::Unknown),
        }
    }
}

/// The bot: external clients plus the subscription scheduler.
pub struct Bot {
    telegram: Arc<TelegramClient>,
    sensor: Arc<SensorClient>,
    chart: ChartClient,
    scheduler: Scheduler,
    poll_interval: Duration,
    max_sample_age: chrono::Duration,
}

impl Bot {
    /// Create a bot from configuration and a resolved token.
    pub fn new(config: &Config, token: &str) -> Self {
        Self {
            telegram: Arc::new(TelegramClient::new(token)),
            sensor: Arc::new(SensorClient::new(
                config.sensor_base_url.clone(),
                config.request_timeout,
            )),
            chart: ChartClient::new(config.chart_base_url.clone(), config.request_timeout),
            scheduler: Scheduler::new(),
            poll_interval: config.poll_interval,
            max_sample_age: chrono::Duration::seconds(config.max_sample_age.as_secs() as i64),
        }
    }

    /// Number of chats currently being monitored.
    pub fn active_subscriptions(&self) -> usize {
        self.scheduler.active_count()
    }

    /// Run the long-polling update loop until the future is dropped.
    pub async fn run(&self) -> anyhow::Result<()> {
        let mut offset = 0i64;

        loop {
            match self.telegram.get_updates(offset).await {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);

                        let Some(message) = update.message else { continue };
                        let Some(text) = message.text else { continue };
                        self.handle_message(SubscriberId(message.chat.id), &text)
                            .await;
                    }
                }
                Err(e) => {
                    tracing::warn!("getUpdates failed: {e}");
                    tokio::time::sleep(Duration::from_secs(3)).await;
                }
            }
        }
    }

    /// Dispatch one inbound message.
    pub async fn handle_message(&self, chat: SubscriberId, text: &str) {
        tracing::debug!(subscriber = %chat, "received message: {text}");

        match Command::parse(text) {
            Ok(Command::Start) => self.reply(chat, GREETING).await,
            Ok(Command::Help) => self.reply(chat, HELP_TEXT).await,
            Ok(Command::Monitor) => self.start_monitoring(chat),
            Ok(Command::Stop) => {
                if !self.scheduler.stop(chat) {
                    self.reply(chat, NOT_MONITORING).await;
                }
            }
            Ok(Command::Chart(selector)) => self.send_chart(chat, selector).await,
            Err(CommandError::NotACommand) => {}
            Err(CommandError::Unknown) => self.reply(chat, UNKNOWN_COMMAND).await,
            Err(CommandError::InvalidSelector(msg)) => self.reply(chat, &msg).await,
        }
    }

    /// Start (or restart) the recurring live poll for a chat.
    fn start_monitoring(&self, chat: SubscriberId) {
        let sensor = Arc::clone(&self.sensor);
        let telegram = Arc::clone(&self.telegram);
        let max_age = self.max_sample_age;

        self.scheduler.start(chat, self.poll_interval, move |id| {
            let sensor = Arc::clone(&sensor);
            let telegram = Arc::clone(&telegram);
            async move {
                let sample = sensor.latest_sample().await?;
                let now = Local::now().naive_local();

                let text = match evaluate(&sample, now, max_age) {
                    Freshness::Fresh(sample) => live_reading_text(&sample),
                    Freshness::Stale => STALE_NOTICE.to_string(),
                };

                telegram.send_message(id, &text).await?;
                Ok(())
            }
        });
    }

    /// Fetch, aggregate and deliver a historical chart.
    async fn send_chart(&self, chat: SubscriberId, selector: DateSelector) {
        let samples = match self.sensor.samples_for(&selector).await {
            Ok(samples) if !samples.is_empty() => samples,
            Ok(_) | Err(SensorError::NotFound) => {
                self.reply(chat, NO_DATA).await;
                return;
            }
            Err(e) => {
                tracing::warn!(subscriber = %chat, "historical fetch failed: {e}");
                self.reply(chat, CHART_FAILED).await;
                return;
            }
        };

        let readings: Vec<Reading> = samples.iter().flat_map(Sample::readings).collect();
        let series = aggregate(&readings, selector.granularity());

        let title = selector.to_string();
        match self.chart.render_line_chart(&title, &series).await {
            Ok(png) => {
                if let Err(e) = self.telegram.send_photo(chat, png, &title).await {
                    tracing::warn!(subscriber = %chat, "sendPhoto failed: {e}");
                }
            }
            Err(e) => {
                tracing::warn!(subscriber = %chat, "chart rendering failed: {e}");
                self.reply(chat, CHART_FAILED).await;
            }
        }
    }

    async fn reply(&self, chat: SubscriberId, text: &str) {
        if let Err(e) = self.telegram.send_message(chat, text).await {
            tracing::warn!(subscriber = %chat, "sendMessage failed: {e}");
        }
    }
}

/// Format a fresh sample as the live-reading payload.
fn live_reading_text(sample: &Sample) -> String {
    format!("\u{2764}\u{fe0f} {} bpm\n\u{1fac1} {}% SpO2", sample.bpm, sample.spo2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("/start"), Ok(Command::Start));
        assert_eq!(Command::parse("/help"), Ok(Command::Help));
        assert_eq!(Command::parse("/monitor"), Ok(Command::Monitor));
        assert_eq!(Command::parse("/stop"), Ok(Command::Stop));
    }

    #[test]
    fn test_parse_chart_command() {
        assert_eq!(
            Command::parse("/chart day 21/02/2023"),
            Ok(Command::Chart(DateSelector::Day {
                day: 21,
                month: 2,
                year: 2023
            }))
        );
        assert_eq!(
            Command::parse("/chart year 2023"),
            Ok(Command::Chart(DateSelector::Year { year: 2023 }))
        );
    }

    #[test]
    fn test_parse_rejects_malformed_chart_arguments() {
        assert!(matches!(
            Command::parse("/chart"),
            Err(CommandError::InvalidSelector(_))
        ));
        assert!(matches!(
            Command::parse("/chart day"),
            Err(CommandError::InvalidSelector(_))
        ));
        assert!(matches!(
            Command::parse("/chart day 30/02/2023"),
            Err(CommandError::InvalidSelector(_))
        ));
        assert!(matches!(
            Command::parse("/chart week 2023"),
            Err(CommandError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_parse_unknown_and_non_commands() {
        assert_eq!(Command::parse("/dance"), Err(CommandError::Unknown));
        assert_eq!(Command::parse("hello there"), Err(CommandError::NotACommand));
        assert_eq!(Command::parse(""), Err(CommandError::NotACommand));
    }

    #[test]
    fn test_live_reading_text() {
        let sample = Sample {
            timestamp: NaiveDate::from_ymd_opt(2023, 2, 21)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            bpm: 72,
            spo2: 98,
        };

        let text = live_reading_text(&sample);
        assert!(text.contains("72 bpm"));
        assert!(text.contains("98% SpO2"));
    }
}
