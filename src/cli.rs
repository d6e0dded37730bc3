//! Command-line interface definition using clap.
//!
//! This module defines:
//! - [`Args`] - CLI argument structure (for use with clap)
//! - [`PolicyArg`] - Rate-limit policy as a CLI value
//!
//! Credentials come from `TELEGRAM_API_ID`, `TELEGRAM_API_HASH` and
//! `TELEGRAM_PHONE` (the binary loads a `.env` file first) and can be
//! overridden with flags. [`Args::to_config`] turns the parsed arguments
//! into the [`HarvestConfig`] handed to the orchestrator.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::{Credentials, HarvestConfig, RateLimitPolicy};
use crate::core::RunContext;
use crate::error::{HarvestError, Result};

/// Harvest recent Telegram channel history and photos into a
/// date-partitioned directory layout.
#[derive(Parser, Debug, Clone)]
#[command(name = "tgharvest")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    tgharvest --config channels.json
    tgharvest -c Chemed123 -c tikvahpharma --limit 50
    tgharvest --config channels.json --export-root exports --date 2024-01-15
    RUST_LOG=debug tgharvest -c lobelia4cosmetics --log-file scraper.log")]
pub struct Args {
    /// Channel to harvest (repeatable, appended after --config channels)
    #[arg(short, long = "channel", value_name = "CHANNEL")]
    pub channels: Vec<String>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding one Telegram Desktop export per channel
    #[arg(long, value_name = "DIR", default_value = "exports")]
    pub export_root: PathBuf,

    /// Root of the output layout [default: data/raw]
    #[arg(long, value_name = "DIR")]
    pub data_root: Option<PathBuf>,

    /// Maximum messages retrieved per channel [default: 100]
    #[arg(short = 'n', long, value_name = "N")]
    pub limit: Option<usize>,

    /// Run date token (YYYY-MM-DD) [default: today]
    #[arg(long, value_name = "DATE")]
    pub date: Option<String>,

    /// What to do with a channel after a rate-limit wait
    #[arg(long, value_enum, value_name = "POLICY")]
    pub rate_limit_policy: Option<PolicyArg>,

    /// Also write logs to this file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Telegram application id
    #[arg(long, env = "TELEGRAM_API_ID", value_name = "ID")]
    pub api_id: Option<i32>,

    /// Telegram application hash
    #[arg(long, env = "TELEGRAM_API_HASH", value_name = "HASH", hide_env_values = true)]
    pub api_hash: Option<String>,

    /// Phone number of the harvesting account
    #[arg(long, env = "TELEGRAM_PHONE", value_name = "PHONE", hide_env_values = true)]
    pub phone: Option<String>,
}

impl Args {
    /// Credentials, if all three parts were given.
    pub fn credentials(&self) -> Option<Credentials> {
        match (self.api_id, &self.api_hash, &self.phone) {
            (Some(id), Some(hash), Some(phone)) => Some(Credentials::new(id, hash, phone)),
            _ => None,
        }
    }

    /// Builds the run configuration: config file first, then flags on top.
    pub fn to_config(&self) -> Result<HarvestConfig> {
        let mut config = match &self.config {
            Some(path) => HarvestConfig::from_json_file(path)?,
            None => HarvestConfig::default(),
        };

        config = config.with_channels(self.channels.iter().cloned());
        if let Some(limit) = self.limit {
            config = config.with_message_limit(limit);
        }
        if let Some(root) = &self.data_root {
            config = config.with_data_root(root);
        }
        if let Some(policy) = self.rate_limit_policy {
            config = config.with_rate_limit_policy(policy.into());
        }
        if let Some(credentials) = self.credentials() {
            config = config.with_credentials(credentials);
        }

        if config.channels.is_empty() {
            return Err(HarvestError::config(
                "no channels given; use --channel or --config",
            ));
        }
        Ok(config)
    }

    /// The run's date token, from `--date` or today.
    pub fn run_context(&self) -> Result<RunContext> {
        match &self.date {
            Some(token) => RunContext::parse(token),
            None => Ok(RunContext::today()),
        }
    }
}

/// Rate-limit policy options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum PolicyArg {
    /// Give the channel up after the wait (default)
    #[default]
    Abandon,

    /// Run the channel once more after the wait
    #[value(alias = "retry")]
    RetryOnce,
}

impl From<PolicyArg> for RateLimitPolicy {
    fn from(policy: PolicyArg) -> RateLimitPolicy {
        match policy {
            PolicyArg::Abandon => RateLimitPolicy::Abandon,
            PolicyArg::RetryOnce => RateLimitPolicy::RetryOnce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["tgharvest"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_repeatable_channels() {
        let args = parse(&["-c", "Chemed123", "--channel", "tikvahpharma"]);
        assert_eq!(args.channels, vec!["Chemed123", "tikvahpharma"]);

        let config = args.to_config().unwrap();
        assert_eq!(config.channels, vec!["Chemed123", "tikvahpharma"]);
        assert_eq!(config.message_limit, 100);
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"channels": ["Chemed123"], "message_limit": 10, "data_root": "from/file"}}"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let args = parse(&["--config", path, "-c", "medicalethiopia", "-n", "5", "--rate-limit-policy", "retry"]);
        let config = args.to_config().unwrap();

        assert_eq!(config.channels, vec!["Chemed123", "medicalethiopia"]);
        assert_eq!(config.message_limit, 5);
        assert_eq!(config.data_root, PathBuf::from("from/file"));
        assert_eq!(config.rate_limit_policy, RateLimitPolicy::RetryOnce);
    }

    #[test]
    fn test_no_channels_is_config_error() {
        let args = parse(&[]);
        assert!(args.to_config().unwrap_err().is_config());
    }

    #[test]
    fn test_partial_credentials_are_ignored() {
        let args = parse(&["-c", "x", "--api-id", "123", "--api-hash", "abc", "--phone", "+251"]);
        assert!(args.credentials().is_some());

        let mut args = args;
        args.phone = None;
        assert!(args.credentials().is_none());
    }

    #[test]
    fn test_run_context() {
        assert_eq!(parse(&["--date", "2024-01-15"]).run_context().unwrap().token(), "2024-01-15");
        assert!(parse(&["--date", "yesterday"]).run_context().is_err());
    }
}
