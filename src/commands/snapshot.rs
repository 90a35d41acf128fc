use anyhow::{Context, Result};
use clap::ArgMatches;

use super::{build_aggregator, build_runtime};
use crate::core::{MetricCache, MonitorConfig};
use crate::ui::print_snapshot_overview;

/// Collect one snapshot through the cache and print it.
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = MonitorConfig::load()?;
    let summary = matches.get_flag("summary");

    let runtime = build_runtime()?;
    let snapshot = runtime.block_on(async {
        let cache = MetricCache::new(build_aggregator(&config), config.cache_ttl());
        cache.get_or_refresh().await
    });

    if summary {
        print_snapshot_overview(&snapshot);
    } else {
        let json = serde_json::to_string_pretty(snapshot.as_ref())
            .context("Failed to serialize snapshot")?;
        println!("{}", json);
    }
    Ok(())
}
