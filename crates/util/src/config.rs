use std::{env, fmt};

use super::database_url;

pub const DEFAULT_SEED_POSITIONS: usize = 30;
pub const DEFAULT_SEED_CANDIDATES: usize = 1000;

/// Application runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }

    /// Returns the canonical name used for logging/metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// Bounds of the artificial delay applied to every record operation, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatencyRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl LatencyRange {
    /// Parses `"<ms>"` or `"<min>-<max>"`.
    fn parse(value: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidLatency(value.to_string());
        let parse_ms = |part: &str| part.trim().parse::<u64>().map_err(|_| invalid());

        let (min_ms, max_ms) = match value.split_once('-') {
            Some((min, max)) => (parse_ms(min)?, parse_ms(max)?),
            None => {
                let fixed = parse_ms(value)?;
                (fixed, fixed)
            }
        };

        if min_ms > max_ms {
            return Err(invalid());
        }
        Ok(Self { min_ms, max_ms })
    }

    pub fn is_disabled(self) -> bool {
        self.max_ms == 0
    }
}

/// Size of the dataset generated when the store is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedConfig {
    pub positions: usize,
    pub candidates: usize,
    pub rng_seed: Option<u64>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            positions: DEFAULT_SEED_POSITIONS,
            candidates: DEFAULT_SEED_CANDIDATES,
            rng_seed: None,
        }
    }
}

/// Runtime configuration resolved from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub environment: Environment,
    pub latency: LatencyRange,
    pub reset_on_start: bool,
    pub seed: SeedConfig,
}

impl AppConfig {
    /// Constructs the configuration by reading and validating environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_value = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let environment = Environment::from_str(&env_value)?;

        let latency = match env::var("APP_SIMULATED_LATENCY_MS") {
            Ok(value) => LatencyRange::parse(&value)?,
            Err(_) => LatencyRange::default(),
        };

        let reset_on_start = match env::var("APP_RESET_ON_START") {
            Ok(value) => parse_flag("APP_RESET_ON_START", &value)?,
            Err(_) => false,
        };

        let defaults = SeedConfig::default();
        let seed = SeedConfig {
            positions: parse_number("APP_SEED_POSITIONS")?.unwrap_or(defaults.positions),
            candidates: parse_number("APP_SEED_CANDIDATES")?.unwrap_or(defaults.candidates),
            rng_seed: parse_number("APP_SEED_RNG")?,
        };

        Ok(Self {
            database_url: database_url(),
            environment,
            latency,
            reset_on_start,
            seed,
        })
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: value.to_string(),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        Err(_) => Ok(None),
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    InvalidEnvironment(String),
    InvalidLatency(String),
    InvalidFlag { name: &'static str, value: String },
    InvalidNumber { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnvironment(value) => write!(
                f,
                "APP_ENV must be one of 'development', 'production', or 'test' (got {value})"
            ),
            Self::InvalidLatency(value) => write!(
                f,
                "APP_SIMULATED_LATENCY_MS must be '<ms>' or '<min>-<max>' (got {value})"
            ),
            Self::InvalidFlag { name, value } => {
                write!(f, "{name} must be true or false (got {value})")
            }
            Self::InvalidNumber { name, value } => {
                write!(f, "{name} must be a non-negative integer (got {value})")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
