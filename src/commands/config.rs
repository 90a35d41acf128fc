use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use crate::core::MonitorConfig;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("show", _)) => show(),
        Some(("path", _)) => path(),
        Some(("init", sub_matches)) => init(sub_matches.get_flag("force")),
        _ => {
            println!("Use 'perfscope config --help' for more information.");
            Ok(())
        }
    }
}

/// Effective configuration, environment overrides included.
fn show() -> Result<()> {
    let config = MonitorConfig::load()?;
    let json = serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
    println!("{}", json);
    Ok(())
}

fn path() -> Result<()> {
    println!("{}", MonitorConfig::get_config_path()?.display());
    Ok(())
}

/// Write a config file with default values.
fn init(force: bool) -> Result<()> {
    let path = MonitorConfig::get_config_path()?;
    if path.exists() && !force {
        println!(
            "{} {}",
            "Config already exists:".yellow(),
            path.display()
        );
        println!("{}", "Use --force to overwrite it with defaults.".dimmed());
        return Ok(());
    }

    MonitorConfig::default().save_to(&path)?;
    println!("{} {}", "✓ Config written to".green(), path.display());
    Ok(())
}
