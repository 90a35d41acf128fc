use anyhow::{Context, Result};
use clap::ArgMatches;

use crate::core::analyzer::{Analyzer, Issue};
use crate::core::MonitorConfig;

pub(crate) fn analyzer_from(matches: &ArgMatches, config: &MonitorConfig) -> Analyzer {
    let path = matches
        .get_one::<String>("file")
        .map(Into::into)
        .unwrap_or_else(|| config.metrics_file_path.clone());
    Analyzer::new(path, config.thresholds())
}

/// Scan the metrics log and report every issue.
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = MonitorConfig::load()?;
    let analyzer = analyzer_from(matches, &config);

    if matches.get_flag("json") {
        let issues: Vec<Issue> = analyzer.analyze().collect();
        let json = serde_json::to_string_pretty(&issues).context("Failed to serialize issues")?;
        println!("{}", json);
    } else {
        analyzer.generate_report();
    }
    Ok(())
}
