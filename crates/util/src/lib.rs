pub mod config;

use std::env;

pub use config::{AppConfig, ConfigError, Environment, LatencyRange, SeedConfig};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://ats.db";

/// Loads environment variables from `.env` when available.
///
/// Missing files are ignored so the function is safe in production builds
/// where dotenv files are not deployed.
pub fn load_env_file() {
    let _ = dotenvy::dotenv();
}

/// Returns the connection string of the local record store.
///
/// The value is resolved from the `APP_DATABASE_URL` environment variable and
/// falls back to [`DEFAULT_DATABASE_URL`] when the variable is not set.
pub fn database_url() -> String {
    env::var("APP_DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{LazyLock, Mutex};

    pub static ENV_GUARD: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
}
