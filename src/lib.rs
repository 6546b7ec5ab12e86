//! Oximeter Bot - chat-bot front end for a remote pulse-oximeter.
//!
//! Subscribers can receive periodic live readings (heart rate, blood-oxygen
//! saturation) and request historical charts over day, month or year windows.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Oximeter Bot                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐    ┌───────────┐    ┌────────────┐            │
//! │  │ Scheduler │───▶│  Sensor   │───▶│ Freshness  │──▶ chat    │
//! │  │ (per chat)│    │  fetch    │    │ evaluate   │            │
//! │  └───────────┘    └───────────┘    └────────────┘            │
//! │                                                              │
//! │  ┌───────────┐    ┌───────────┐    ┌────────────┐            │
//! │  │  /chart   │───▶│ Aggregate │───▶│   Chart    │──▶ chat    │
//! │  │  command  │    │ (buckets) │    │  renderer  │            │
//! │  └───────────┘    └───────────┘    └────────────┘            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use oximeter_bot::{bot::Bot, config::Config};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let token = config.resolve_token().expect("BOT_TOKEN not set");
//!
//! let bot = Bot::new(&config, &token);
//! bot.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod bot;
pub mod chart;
pub mod config;
pub mod core;
pub mod scheduler;
pub mod sensor;
pub mod telegram;

// Re-export key types at crate root for convenience
pub use bot::{Bot, Command, CommandError};
pub use chart::{ChartClient, ChartError};
pub use config::{Config, ConfigError};
pub use core::{
    aggregate, evaluate, DateSelector, Freshness, Granularity, Metric, Reading, Sample,
    SelectorError, Series, SubscriberId,
};
pub use scheduler::Scheduler;
pub use sensor::{SensorClient, SensorError};
pub use telegram::{TelegramClient, TelegramError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reply to the `/help` command.
pub const HELP_TEXT: &str = "\
Available commands:
/start - start a conversation with the bot
/help - show this message
/monitor - start receiving oximeter readings
/stop - stop receiving oximeter readings
/chart day DD/MM/YYYY - chart one day of readings
/chart month MM/YYYY - chart one month of readings
/chart year YYYY - chart one year of readings";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_text_lists_all_commands() {
        for command in ["/start", "/help", "/monitor", "/stop", "/chart"] {
            assert!(HELP_TEXT.contains(command), "missing {command}");
        }
    }
}
