use std::time::Duration;

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use super::{build_aggregator, build_runtime};
use crate::core::{MonitorConfig, PersistenceLoop};

/// Run the persistence loop until Ctrl+C.
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let mut config = MonitorConfig::load()?;
    if let Some(&secs) = matches.get_one::<u64>("interval") {
        config.auto_save_interval_secs = secs;
    }
    if let Some(path) = matches.get_one::<String>("file") {
        config.metrics_file_path = path.into();
    }

    config
        .ensure_log_dir()
        .context("Cannot prepare the metrics log location")?;

    let runtime = build_runtime()?;
    runtime.block_on(async {
        let persistence = PersistenceLoop::from_config(build_aggregator(&config), &config);

        let (stop_tx, mut stop_rx) = tokio::sync::mpsc::unbounded_channel::<()>();
        ctrlc::set_handler(move || {
            println!();
            println!("{}", "Stopping monitor...".yellow().bold());
            let _ = stop_tx.send(());
        })
        .map_err(|e| anyhow::anyhow!("Failed to set Ctrl+C handler: {}", e))?;

        println!(
            "{} {} every {}s",
            "Recording metrics to".cyan().bold(),
            config.metrics_file_path.display(),
            persistence.interval().as_secs()
        );
        println!("{}", "Press Ctrl+C to stop".dimmed());

        persistence.start();
        stop_rx.recv().await;
        persistence.stop().await;

        println!(
            "{} ({} samples)",
            "Monitor stopped.".green(),
            persistence.iterations()
        );
        Ok::<(), anyhow::Error>(())
    })?;

    // Blocking sources still inside a sample are not waited for.
    runtime.shutdown_timeout(Duration::from_secs(1));
    Ok(())
}
