mod telemetry;

use tracing::{debug, info};

use ats_core::ApplicationStatus;
use ats_service::{DatasetSummary, Latency, Records, SeedOptions};
use ats_storage::Database;
use ats_util::{load_env_file, AppConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    let metrics = telemetry::init_metrics()?;

    info!(stage = "app", database = %config.database_url, env = %config.environment.as_str(), "opening record store");
    let database = Database::connect(&config.database_url).await?;
    database.run_migrations().await?;

    let latency = Latency::from_millis(config.latency.min_ms, config.latency.max_ms);
    let records = Records::new(database, latency);

    let options = SeedOptions {
        positions: config.seed.positions,
        candidates: config.seed.candidates,
        rng_seed: config.seed.rng_seed,
    };
    let seeded = if config.reset_on_start {
        records.reset(&options).await?
    } else {
        records.initialize(&options).await?
    };
    if seeded.is_some() {
        info!(stage = "app", reset = config.reset_on_start, "initial dataset written");
    }

    let summary = records.summary().await?;
    log_summary(&summary);

    debug!(stage = "app", metrics = %telemetry::render_metrics(&metrics), "metrics snapshot");
    Ok(())
}

fn log_summary(summary: &DatasetSummary) {
    info!(
        stage = "app",
        positions = summary.positions,
        active_positions = summary.active_positions,
        candidates = summary.candidates,
        applications = summary.applications,
        pending = summary.count(ApplicationStatus::Pending),
        reviewed = summary.count(ApplicationStatus::Reviewed),
        shortlisted = summary.count(ApplicationStatus::Shortlisted),
        rejected = summary.count(ApplicationStatus::Rejected),
        hired = summary.count(ApplicationStatus::Hired),
        "record store ready"
    );
}
