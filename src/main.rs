//! neo-risk entrypoint: fetch (or replay) close approaches, classify, and
//! write the snapshot. Runs once, or on a refresh interval until Ctrl+C.

use neo_risk::{
    config::PipelineConfig,
    dataset::{write_snapshot, Assembler},
    fetch::{self, CatalogClient, FetchOutcome},
    logging::{BatchReport, StructuredLogger},
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

static STOP: AtomicBool = AtomicBool::new(false);

fn run_one_cycle(
    config: &PipelineConfig,
    client: &CatalogClient,
    assembler: &Assembler,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let outcome = match &config.fetch.replay_path {
        Some(path) => fetch::replay(path),
        None => {
            let capture = config.capture_path();
            client.fetch(config.fetch.save_capture.then_some(capture.as_path()))
        }
    };
    let raw = match outcome {
        FetchOutcome::Records(raw) => raw,
        FetchOutcome::NoNewData { reason } => {
            info!(%reason, "no new data; keeping previous snapshot");
            return Ok(());
        }
    };

    let dataset = match assembler.assemble(&raw, chrono::Utc::now()) {
        Ok(d) => d,
        Err(e) => {
            warn!(error = %e, "no usable data in batch; keeping previous snapshot");
            return Ok(());
        }
    };

    let path = config.output_path();
    write_snapshot(&path, &dataset, config.output.format, config.output.metadata_sidecar)?;

    let path_str = path.display().to_string();
    let report = BatchReport::new(&dataset, Some(&path_str));
    StructuredLogger::emit_json(&report, &mut std::io::stdout());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("NEO_RISK_CONFIG_PATH")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("config.json"));
    let (config, config_error) = match PipelineConfig::load(&config_path) {
        Ok(c) => (c, None),
        Err(e) => (PipelineConfig::default(), Some(e)),
    };

    StructuredLogger::init(config.log.json, &config.log.level);
    if let Some(e) = config_error {
        warn!(path = %config_path.display(), error = %e, "config unusable; running with defaults");
    }

    info!(data_dir = ?config.data_dir, "neo-risk starting");
    std::fs::create_dir_all(&config.data_dir)?;

    let assembler = Assembler::from_config(&config)?;
    let client = CatalogClient::new(config.fetch.clone())?;

    let interval_secs = config.refresh_interval_secs;
    if interval_secs == 0 {
        run_one_cycle(&config, &client, &assembler)?;
        info!("neo-risk run complete");
        return Ok(());
    }

    info!(interval_secs, "refresh mode (Ctrl+C to stop)");
    let _ = ctrlc::set_handler(|| STOP.store(true, Ordering::Relaxed));
    let mut cycle: u64 = 0;
    while !STOP.load(Ordering::Relaxed) {
        cycle += 1;
        if let Err(e) = run_one_cycle(&config, &client, &assembler) {
            warn!(cycle, error = %e, "cycle failed");
        }
        for _ in 0..interval_secs {
            if STOP.load(Ordering::Relaxed) {
                break;
            }
            std::thread::sleep(Duration::from_secs(1));
        }
    }
    info!("neo-risk stopping");
    Ok(())
}
