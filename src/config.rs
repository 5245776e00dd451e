//! Configuration and CLI argument handling

use std::{collections::HashSet, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand};

use crate::state::Timer;

/// CLI argument parsing structure
#[derive(Parser)]
#[command(name = "cooldown-board")]
#[command(about = "Named cooldown timers synchronized through a shared state endpoint")]
#[command(version)]
pub struct Config {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the state endpoint
    Serve(ServeArgs),
    /// Run a board against a state endpoint
    Client(ClientArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Port to bind the server to
    #[arg(short, long, default_value = "5000")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Mirror the shared state to this JSON file
    #[arg(long)]
    pub state_file: Option<PathBuf>,
}

#[derive(Args)]
pub struct ClientArgs {
    /// Base URL of the state endpoint
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    pub server: String,

    /// A timer as NAME=SECONDS; repeat for each button
    #[arg(short, long = "timer", value_name = "NAME=SECONDS", required = true)]
    pub timers: Vec<TimerSpec>,

    /// File holding the theme preference
    #[arg(long, default_value = "cooldown-board-prefs.json")]
    pub prefs: PathBuf,

    /// How often to pull the shared state, in milliseconds
    #[arg(long, default_value = "3000")]
    pub poll_ms: u64,

    /// Countdown refresh cadence, in milliseconds
    #[arg(long, default_value = "100")]
    pub tick_ms: u64,

    /// How long an exit-time send may take, in milliseconds
    #[arg(long, default_value = "500")]
    pub beacon_timeout_ms: u64,
}

/// One configured button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSpec {
    pub name: String,
    pub cooldown_secs: u64,
}

impl FromStr for TimerSpec {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (name, secs) = raw
            .rsplit_once('=')
            .ok_or_else(|| format!("expected NAME=SECONDS, got {raw:?}"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("timer name is empty in {raw:?}"));
        }
        let cooldown_secs = secs
            .trim()
            .parse()
            .map_err(|e| format!("invalid cooldown in {raw:?}: {e}"))?;
        Ok(Self {
            name: name.to_string(),
            cooldown_secs,
        })
    }
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

impl ServeArgs {
    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl ClientArgs {
    /// Build the board's timers, rejecting duplicate names.
    pub fn build_timers(&self) -> Result<Vec<Timer>, String> {
        let mut seen = HashSet::new();
        self.timers
            .iter()
            .map(|spec| {
                if seen.insert(spec.name.as_str()) {
                    Ok(Timer::new(spec.name.clone(), spec.cooldown_secs))
                } else {
                    Err(format!("timer {:?} is configured twice", spec.name))
                }
            })
            .collect()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(1))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn beacon_timeout(&self) -> Duration {
        Duration::from_millis(self.beacon_timeout_ms)
    }
}
