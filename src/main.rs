//! Oximeter Bot CLI
//!
//! Chat-bot front end for a remote pulse-oximeter.

use clap::{Parser, Subcommand};
use oximeter_bot::{
    bot::Bot,
    config::Config,
    sensor::SensorClient,
    VERSION,
};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "oximeter-bot")]
#[command(version = VERSION)]
#[command(about = "Chat-bot front end for a remote pulse-oximeter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot
    Run {
        /// Base URL of the sensor API (overrides config)
        #[arg(long)]
        sensor_url: Option<String>,

        /// Base URL of the chart renderer (overrides config)
        #[arg(long)]
        chart_url: Option<String>,

        /// Poll interval in seconds for live monitoring
        #[arg(long)]
        interval: Option<u64>,

        /// Maximum sample age in seconds still reported as live
        #[arg(long)]
        max_age: Option<u64>,

        /// Bot token (overrides BOT_TOKEN and config)
        #[arg(long)]
        token: Option<String>,
    },

    /// Check connectivity to the sensor API
    Check,

    /// Show configuration
    Config,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            sensor_url,
            chart_url,
            interval,
            max_age,
            token,
        } => {
            cmd_run(sensor_url, chart_url, interval, max_age, token).await;
        }
        Commands::Check => {
            cmd_check().await;
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

async fn cmd_run(
    sensor_url: Option<String>,
    chart_url: Option<String>,
    interval: Option<u64>,
    max_age: Option<u64>,
    token: Option<String>,
) {
    println!("Oximeter Bot v{VERSION}");
    println!();

    let mut config = Config::load().unwrap_or_default();
    if let Some(url) = sensor_url {
        config.sensor_base_url = url;
    }
    if let Some(url) = chart_url {
        config.chart_base_url = url;
    }
    if let Some(secs) = interval {
        config.poll_interval = Duration::from_secs(secs);
    }
    if let Some(secs) = max_age {
        config.max_sample_age = Duration::from_secs(secs);
    }

    let token = match token.or_else(|| config.resolve_token()) {
        Some(token) => token,
        None => {
            eprintln!("Error: no bot token configured.");
            eprintln!();
            eprintln!("Set the BOT_TOKEN environment variable, pass --token,");
            eprintln!("or add \"bot_token\" to {:?}", Config::config_path());
            std::process::exit(1);
        }
    };

    println!("Starting bot...");
    println!("  Sensor API: {}", config.sensor_base_url);
    println!("  Chart renderer: {}", config.chart_base_url);
    println!("  Poll interval: {}s", config.poll_interval.as_secs());
    println!("  Max sample age: {}s", config.max_sample_age.as_secs());
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let bot = Bot::new(&config, &token);

    tokio::select! {
        result = bot.run() => {
            if let Err(e) = result {
                eprintln!("Bot stopped with error: {e:#}");
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!();
            println!(
                "Stopping bot ({} active subscription(s))...",
                bot.active_subscriptions()
            );
        }
    }
}

async fn cmd_check() {
    let config = Config::load().unwrap_or_default();
    let sensor = SensorClient::new(config.sensor_base_url.clone(), config.request_timeout);

    println!("Checking sensor API at {}...", config.sensor_base_url);

    match sensor.latest_sample().await {
        Ok(sample) => {
            println!("Sensor connection: OK");
            println!(
                "  Latest sample: {} bpm, {}% SpO2 at {}",
                sample.bpm, sample.spo2, sample.timestamp
            );
        }
        Err(e) => {
            eprintln!("Sensor connection failed: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}
