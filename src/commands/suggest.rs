use anyhow::{Context, Result};
use clap::ArgMatches;

use super::analyze::analyzer_from;
use crate::core::analyzer::{Issue, LiveSweep};
use crate::core::suggestions::suggest_optimizations;
use crate::core::MonitorConfig;
use crate::ui::print_suggestions;

/// Suggestions for the issues in the log, plus live high-CPU threads.
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = MonitorConfig::load()?;

    let mut issues: Vec<Issue> = analyzer_from(matches, &config).analyze().collect();
    if !matches.get_flag("no-live") {
        issues.extend(LiveSweep::system(config.sweep_thresholds()).blocking_threads());
    }

    let suggestions = suggest_optimizations(&issues);
    if matches.get_flag("json") {
        let json = serde_json::to_string_pretty(&suggestions)
            .context("Failed to serialize suggestions")?;
        println!("{}", json);
    } else {
        print_suggestions(&suggestions);
    }
    Ok(())
}
