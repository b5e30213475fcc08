use crate::errors::Error;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_FMP_BASE_URL: &str = "https://financialmodelingprep.com/api/v3";

pub const DEFAULT_SERVER_PORT: u16 = 8080;

pub const DEFAULT_BATCH_SIZE: usize = 8;

pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(200);

pub const DEFAULT_ENVIRONMENT: &str = "Standalone";

/// How the bulk fetcher walks a universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    pub batch_size: usize,
    pub batch_delay: Duration,
}

impl Default for BatchSettings {
    fn default() -> Self {
        BatchSettings {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub fmp_api_key: String,
    pub fmp_base_url: String,
    pub server_port: u16,
    pub batch: BatchSettings,
    pub universes_file: Option<PathBuf>,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fmp_api_key = lookup("FMP_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                Error::ConfigurationError("FMP_API_KEY must be set in environment".to_string())
            })?;

        let fmp_base_url = lookup("FMP_BASE_URL").unwrap_or(DEFAULT_FMP_BASE_URL.to_string());

        let server_port = parse_or(&lookup, "SERVER_PORT", DEFAULT_SERVER_PORT)?;

        let batch_size = parse_or(&lookup, "BATCH_SIZE", DEFAULT_BATCH_SIZE)?;
        if batch_size == 0 {
            return Err(Error::ConfigurationError(
                "BATCH_SIZE must be greater than zero".to_string(),
            ));
        }

        let batch_delay_milliseconds = parse_or(
            &lookup,
            "BATCH_DELAY_MS",
            DEFAULT_BATCH_DELAY.as_millis() as u64,
        )?;

        Ok(Config {
            fmp_api_key,
            fmp_base_url,
            server_port,
            batch: BatchSettings {
                batch_size,
                batch_delay: Duration::from_millis(batch_delay_milliseconds),
            },
            universes_file: lookup("UNIVERSES_FILE").map(PathBuf::from),
            environment: lookup("DEPLOYMENT_ENVIRONMENT").unwrap_or(DEFAULT_ENVIRONMENT.to_string()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, Error>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| Error::ConfigurationError(format!("Invalid {}: {}", name, e))),
        None => Ok(default),
    }
}
