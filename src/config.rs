//! Process Configuration
//!
//! Settings come from `PALINDROME_*` environment variables and can be overridden
//! by command-line flags. Everything has a default, so an empty environment yields
//! a working configuration.

use crate::pipeline::PipelineConfig;
use crate::publish::resolver::DEFAULT_PLC_DIRECTORY;
use crate::publish::xrpc::DEFAULT_BSKY_SERVICE;

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const ENV_PRIMARY_CAPACITY: &str = "PALINDROME_PRIMARY_CAPACITY";
pub const ENV_OVERFLOW_CAPACITY: &str = "PALINDROME_OVERFLOW_CAPACITY";
pub const ENV_WORKERS: &str = "PALINDROME_WORKERS";
pub const ENV_DRAIN_INTERVAL_MS: &str = "PALINDROME_DRAIN_INTERVAL_MS";
pub const ENV_MIN_LENGTH: &str = "PALINDROME_MIN_LENGTH";
pub const ENV_MAX_REPEAT_RUN: &str = "PALINDROME_MAX_REPEAT_RUN";
pub const ENV_DICTIONARY: &str = "PALINDROME_DICTIONARY";
pub const ENV_BIND: &str = "PALINDROME_BIND";
pub const ENV_PLC_URL: &str = "PALINDROME_PLC_URL";
pub const ENV_OFFLINE: &str = "PALINDROME_OFFLINE";
pub const ENV_STATS_INTERVAL_SECS: &str = "PALINDROME_STATS_INTERVAL_SECS";
pub const ENV_PLC_TIMEOUT_MS: &str = "PALINDROME_PLC_TIMEOUT_MS";
pub const ENV_BSKY_SERVICE: &str = "PALINDROME_BSKY_SERVICE";
pub const ENV_BSKY_HANDLE: &str = "PALINDROME_BSKY_HANDLE";
pub const ENV_BSKY_APP_PASSWORD: &str = "PALINDROME_BSKY_APP_PASSWORD";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}: {reason}")]
    Parse {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("Missing value for flag {0}")]
    MissingValue(String),

    #[error("Unknown flag {0}")]
    UnknownFlag(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Read events from stdin and publish palindromes.
    Serve,
    /// Run the throughput benchmark and exit.
    Bench,
}

/// Login for the account that posts replies.
#[derive(Clone, PartialEq, Eq)]
pub struct BskyCredentials {
    pub identifier: String,
    pub password: String,
}

impl fmt::Debug for BskyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BskyCredentials")
            .field("identifier", &self.identifier)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub mode: RunMode,
    pub pipeline: PipelineConfig,
    pub dictionary_path: PathBuf,
    /// Address for `/health` and `/stats`; `None` disables the HTTP listener.
    pub bind_addr: Option<SocketAddr>,
    pub plc_url: String,
    pub plc_timeout_ms: u64,
    pub bsky_service: String,
    /// Replies are only posted when set; otherwise they are logged.
    pub bsky_credentials: Option<BskyCredentials>,
    /// Skip network handle lookups and posting; replies are logged.
    pub offline: bool,
    pub stats_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Serve,
            pipeline: PipelineConfig::default(),
            dictionary_path: PathBuf::from("words.txt"),
            bind_addr: Some(SocketAddr::from(([0, 0, 0, 0], 8080))),
            plc_url: DEFAULT_PLC_DIRECTORY.to_string(),
            plc_timeout_ms: 3000,
            bsky_service: DEFAULT_BSKY_SERVICE.to_string(),
            bsky_credentials: None,
            offline: false,
            stats_interval_secs: 5,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let pipeline = &mut config.pipeline;

        if let Some(v) = parse_key(&lookup, ENV_PRIMARY_CAPACITY)? {
            pipeline.primary_capacity = v;
        }
        if let Some(v) = parse_key(&lookup, ENV_OVERFLOW_CAPACITY)? {
            pipeline.overflow_capacity = v;
        }
        if let Some(v) = parse_key(&lookup, ENV_WORKERS)? {
            pipeline.workers = v;
        }
        if let Some(v) = parse_key(&lookup, ENV_DRAIN_INTERVAL_MS)? {
            pipeline.drain_interval_ms = v;
        }
        if let Some(v) = parse_key(&lookup, ENV_MIN_LENGTH)? {
            pipeline.classifier.min_phrase_length = v;
        }
        if let Some(v) = parse_key::<usize, _>(&lookup, ENV_MAX_REPEAT_RUN)? {
            // Zero turns the rule off
            pipeline.classifier.max_repeat_run = if v == 0 { None } else { Some(v) };
        }
        if let Some(v) = lookup(ENV_DICTIONARY).filter(|v| !v.trim().is_empty()) {
            config.dictionary_path = PathBuf::from(v.trim());
        }
        if let Some(v) = lookup(ENV_BIND) {
            config.bind_addr = parse_bind(ENV_BIND, &v)?;
        }
        if let Some(v) = lookup(ENV_PLC_URL).filter(|v| !v.trim().is_empty()) {
            config.plc_url = v.trim().to_string();
        }
        if let Some(v) = parse_key(&lookup, ENV_PLC_TIMEOUT_MS)? {
            config.plc_timeout_ms = v;
        }
        if let Some(v) = lookup(ENV_BSKY_SERVICE).filter(|v| !v.trim().is_empty()) {
            config.bsky_service = v.trim().to_string();
        }
        let handle = lookup(ENV_BSKY_HANDLE).filter(|v| !v.trim().is_empty());
        let password = lookup(ENV_BSKY_APP_PASSWORD).filter(|v| !v.is_empty());
        config.bsky_credentials = match (handle, password) {
            (Some(identifier), Some(password)) => Some(BskyCredentials {
                identifier: identifier.trim().to_string(),
                password,
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid {
                    key: "bsky_credentials",
                    reason: format!(
                        "{} and {} must be set together",
                        ENV_BSKY_HANDLE, ENV_BSKY_APP_PASSWORD
                    ),
                })
            }
        };
        if let Some(v) = lookup(ENV_OFFLINE) {
            config.offline = parse_bool(ENV_OFFLINE, &v)?;
        }
        if let Some(v) = parse_key(&lookup, ENV_STATS_INTERVAL_SECS)? {
            config.stats_interval_secs = v;
        }

        Ok(config)
    }

    /// Applies command-line flags on top of the current values.
    ///
    /// `args` excludes the program name.
    pub fn apply_args(&mut self, args: &[String]) -> Result<(), ConfigError> {
        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            match flag {
                "--bench" => {
                    self.mode = RunMode::Bench;
                    i += 1;
                }
                "--offline" => {
                    self.offline = true;
                    i += 1;
                }
                "--dictionary" => {
                    self.dictionary_path = PathBuf::from(flag_value(args, i)?);
                    i += 2;
                }
                "--bind" => {
                    self.bind_addr = parse_bind(flag, flag_value(args, i)?)?;
                    i += 2;
                }
                "--workers" => {
                    self.pipeline.workers = parse_value(flag, flag_value(args, i)?)?;
                    i += 2;
                }
                "--primary" => {
                    self.pipeline.primary_capacity = parse_value(flag, flag_value(args, i)?)?;
                    i += 2;
                }
                "--overflow" => {
                    self.pipeline.overflow_capacity = parse_value(flag, flag_value(args, i)?)?;
                    i += 2;
                }
                other => return Err(ConfigError::UnknownFlag(other.to_string())),
            }
        }
        Ok(())
    }

    pub fn plc_timeout(&self) -> Duration {
        Duration::from_millis(self.plc_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pipeline.validate()?;
        if self.plc_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "plc_timeout_ms",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.stats_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "stats_interval_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn flag_value<'a>(args: &'a [String], i: usize) -> Result<&'a str, ConfigError> {
    args.get(i + 1)
        .map(|s| s.as_str())
        .ok_or_else(|| ConfigError::MissingValue(args[i].clone()))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::Parse {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_key<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => parse_value(key, &value).map(Some),
        _ => Ok(None),
    }
}

/// `off`, `none` or an empty value disable the listener.
fn parse_bind(key: &str, value: &str) -> Result<Option<SocketAddr>, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "off" | "none" => Ok(None),
        _ => parse_value(key, value).map(Some),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Parse {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
