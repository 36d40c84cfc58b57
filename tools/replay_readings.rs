//! Reading Replay Tool
//!
//! Generates machine readings and runs them through the prediction service,
//! appending every verdict to the configured prediction log. Useful for
//! smoke-testing a freshly exported model.
//!
//! Usage: replay_readings [count] [stress_rate] [config_path]

use machine_guard::config::{AppConfig, DEFAULT_CONFIG_PATH};
use machine_guard::metrics::ServiceMetrics;
use machine_guard::{MachineReading, PredictionService};
use rand::Rng;
use std::sync::Arc;
use tracing::{info, warn};

/// Reading generator for replay runs
struct ReadingGenerator {
    rng: rand::rngs::ThreadRng,
}

impl ReadingGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// A machine running comfortably inside its envelope
    fn generate_nominal(&mut self) -> MachineReading {
        let air = self.rng.gen_range(295.0..305.0);
        MachineReading::new(
            round1(air),
            round1(air + self.rng.gen_range(9.0..11.0)),
            self.rng.gen_range(1300..1800),
            round1(self.rng.gen_range(25.0..50.0)),
            self.rng.gen_range(0..150),
            self.rng.gen_range(0..=2),
        )
    }

    /// Hot, overloaded or heavily worn: the kind of reading that precedes a failure
    fn generate_stressed(&mut self) -> MachineReading {
        let air = self.rng.gen_range(300.0..305.0);
        MachineReading::new(
            round1(air),
            round1(air + self.rng.gen_range(7.5..8.6)),
            self.rng.gen_range(1200..1380),
            round1(self.rng.gen_range(55.0..77.0)),
            self.rng.gen_range(190..250),
            self.rng.gen_range(0..=1),
        )
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("replay_readings=info".parse()?)
                .add_directive("machine_guard=warn".parse()?),
        )
        .init();

    info!("Starting Reading Replay");

    let args: Vec<String> = std::env::args().collect();
    let count: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(20);
    let stress_rate: f64 = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.2_f64)
        .clamp(0.0, 1.0);
    let config_path = args.get(3).map(|s| s.as_str()).unwrap_or(DEFAULT_CONFIG_PATH);

    let config = AppConfig::load_from_path(config_path)?;
    info!(
        count = count,
        stress_rate = stress_rate,
        model = %config.model.path,
        log = %config.prediction_log.path,
        "Configuration loaded"
    );

    let service = match PredictionService::from_config(&config, Arc::new(ServiceMetrics::new())) {
        Ok(service) => service,
        Err(e) => {
            warn!(error = %format!("{:#}", e), "Model unavailable. Running in dry-run mode.");
            return run_dry_mode(count, stress_rate);
        }
    };

    let mut generator = ReadingGenerator::new();
    let mut rng = rand::thread_rng();
    let mut required = 0;
    let mut not_logged = 0;

    for i in 0..count {
        let reading = if rng.gen_bool(stress_rate) {
            generator.generate_stressed()
        } else {
            generator.generate_nominal()
        };

        let outcome = service.predict_and_log(&reading)?;
        if outcome.verdict.is_required() {
            required += 1;
        }
        if outcome.serial_no().is_none() {
            not_logged += 1;
        }

        if (i + 1) % 10 == 0 {
            info!(
                "Replayed {}/{} readings ({} maintenance required)",
                i + 1,
                count,
                required
            );
        }
    }

    info!(
        "Completed! Replayed {} readings ({} maintenance required, {} not logged)",
        count, required, not_logged
    );
    service.metrics().print_summary();

    Ok(())
}

fn run_dry_mode(count: u64, stress_rate: f64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no model, nothing logged)");

    let mut generator = ReadingGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let reading = if rng.gen_bool(stress_rate) {
            generator.generate_stressed()
        } else {
            generator.generate_nominal()
        };

        if let Err(e) = reading.validate() {
            warn!(error = %e, "Generated reading is out of domain");
        }

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample reading {}:\n{}", i + 1, serde_json::to_string_pretty(&reading)?);
        }
    }

    Ok(())
}
