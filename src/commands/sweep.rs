use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use crate::core::analyzer::{Issue, LiveSweep};
use crate::core::MonitorConfig;
use crate::ui::print_issues;

/// Scan live threads, process memory or disks.
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = MonitorConfig::load()?;
    let sweep = LiveSweep::system(config.sweep_thresholds());

    let (target, sub_matches) = match matches.subcommand() {
        Some(pair) => pair,
        None => {
            println!("Use 'perfscope sweep --help' for more information.");
            return Ok(());
        }
    };

    let issues: Vec<Issue> = match target {
        "threads" => sweep.blocking_threads(),
        "memory" => sweep.memory_leak_suspects(),
        "disk" => {
            if !sub_matches.get_flag("json") {
                println!(
                    "{}",
                    format!(
                        "Sampling disk I/O for {:.1}s...",
                        sweep.thresholds().disk_io_sample_window.as_secs_f64()
                    )
                    .dimmed()
                );
            }
            sweep.disk_issues()
        }
        other => anyhow::bail!("Unknown sweep target: {}", other),
    };

    if sub_matches.get_flag("json") {
        let json = serde_json::to_string_pretty(&issues).context("Failed to serialize issues")?;
        println!("{}", json);
    } else {
        print_issues(&issues);
    }
    Ok(())
}
