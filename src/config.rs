//! Runtime settings, read from flags with environment fallbacks.

use crate::error::{Result, StonksError};
use clap::Args;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
const MAX_LISTINGS_LIMIT: usize = 5000;
const DASHBOARD_LOG_FILE: &str = "easystonks.log";

#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Base URL of the EasyStonks backend
    #[arg(long, env = "EASYSTONKS_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Number of listings pulled for the rankings
    #[arg(long, env = "EASYSTONKS_LISTINGS_LIMIT", default_value_t = 200)]
    pub listings_limit: usize,

    /// Seconds between listings refreshes
    #[arg(long, default_value_t = 120)]
    pub listings_interval_secs: u64,

    /// Seconds between alert checks
    #[arg(long, default_value_t = 60)]
    pub alerts_interval_secs: u64,

    /// Seconds before the same triggered alert notifies again
    #[arg(long, default_value_t = 120)]
    pub cooldown_secs: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 20)]
    pub timeout_secs: u64,

    /// Start with alert sounds off
    #[arg(long)]
    pub mute: bool,

    /// Where the dashboard keeps its small local state
    #[arg(long, env = "EASYSTONKS_STATE_FILE", value_name = "FILE")]
    pub state_file: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, env = "EASYSTONKS_LOG_FILE", value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl Default for ConfigArgs {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            listings_limit: 200,
            listings_interval_secs: 120,
            alerts_interval_secs: 60,
            cooldown_secs: 120,
            timeout_secs: 20,
            mute: false,
            state_file: None,
            log_file: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub listings_limit: usize,
    pub listings_interval: Duration,
    pub alerts_interval: Duration,
    pub cooldown: Duration,
    pub request_timeout: Duration,
    pub sound: bool,
    pub state_file: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn from_args(args: ConfigArgs) -> Result<Self> {
        let config = Self {
            api_base: args.api_base.trim().trim_end_matches('/').to_string(),
            listings_limit: args.listings_limit,
            listings_interval: Duration::from_secs(args.listings_interval_secs),
            alerts_interval: Duration::from_secs(args.alerts_interval_secs),
            cooldown: Duration::from_secs(args.cooldown_secs),
            request_timeout: Duration::from_secs(args.timeout_secs),
            sound: !args.mute,
            state_file: args.state_file.unwrap_or_else(default_state_file),
            log_file: args.log_file,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api_base)
            .map_err(|e| StonksError::Config(format!("invalid api base '{}': {}", self.api_base, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(StonksError::Config(format!(
                "api base must be http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.listings_interval.is_zero() || self.alerts_interval.is_zero() {
            return Err(StonksError::Config("refresh intervals must be positive".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(StonksError::Config("request timeout must be positive".into()));
        }
        if !(1..=MAX_LISTINGS_LIMIT).contains(&self.listings_limit) {
            return Err(StonksError::Config(format!(
                "listings limit must be between 1 and {}",
                MAX_LISTINGS_LIMIT
            )));
        }
        Ok(())
    }

    /// Where logs go. The dashboard owns the terminal, so without
    /// `--log-file` it logs next to the state file; headless commands
    /// keep stderr (`None`).
    pub fn log_target(&self, interactive: bool) -> Option<PathBuf> {
        match &self.log_file {
            Some(path) => Some(path.clone()),
            None if interactive => Some(self.state_file.with_file_name(DASHBOARD_LOG_FILE)),
            None => None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            listings_limit: 200,
            listings_interval: Duration::from_secs(120),
            alerts_interval: Duration::from_secs(60),
            cooldown: Duration::from_secs(120),
            request_timeout: Duration::from_secs(20),
            sound: true,
            state_file: default_state_file(),
            log_file: None,
        }
    }
}

fn default_state_file() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(".easystonks").join("state.json"),
        _ => PathBuf::from(".easystonks-state.json"),
    }
}
