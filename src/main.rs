use anyhow::Result;
use clap::{Arg, ArgAction, Command};

use perfscope::commands;

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .help("Print raw JSON instead of formatted output")
        .action(ArgAction::SetTrue)
}

fn file_arg() -> Arg {
    Arg::new("file")
        .short('f')
        .long("file")
        .value_name("PATH")
        .help("Metrics log to use instead of the configured one")
}

fn main() -> Result<()> {
    perfscope::init_logging();

    let matches = Command::new("perfscope")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Local performance monitor: collects, records and diagnoses system metrics")
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('v')
                .short_alias('V')
                .long("version")
                .help("Print version information")
                .action(ArgAction::SetTrue),
        )
        .subcommand(Command::new("version").about("Shows version information"))
        .subcommand(
            Command::new("snapshot")
                .about("Collect one snapshot of every subsystem")
                .arg(
                    Arg::new("summary")
                        .short('s')
                        .long("summary")
                        .help("Print a short overview instead of the full JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("run")
                .about("Record snapshots to the metrics log until Ctrl+C")
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("SECONDS")
                        .help("Auto-save interval (the analysis backoff is added to it)")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                )
                .arg(file_arg()),
        )
        .subcommand(
            Command::new("analyze")
                .about("Scan the metrics log for performance issues")
                .arg(file_arg())
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("sweep")
                .about("Inspect live system state (use 'perfscope sweep --help' for targets)")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    Command::new("threads")
                        .about("Threads with high cumulative CPU time")
                        .arg(json_flag()),
                )
                .subcommand(
                    Command::new("memory")
                        .about("Processes with high resident memory")
                        .arg(json_flag()),
                )
                .subcommand(
                    Command::new("disk")
                        .about("Nearly full partitions and disks with heavy I/O")
                        .arg(json_flag()),
                ),
        )
        .subcommand(
            Command::new("suggest")
                .about("Optimization suggestions for detected issues")
                .arg(file_arg())
                .arg(json_flag())
                .arg(
                    Arg::new("no-live")
                        .long("no-live")
                        .help("Only use the metrics log, skip the live thread sweep")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Manage configuration (use 'perfscope config --help' for subcommands)")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("show").about("Show the effective configuration"))
                .subcommand(Command::new("path").about("Show the config file location"))
                .subcommand(
                    Command::new("init")
                        .about("Write a config file with default values")
                        .arg(
                            Arg::new("force")
                                .long("force")
                                .help("Overwrite an existing config file")
                                .action(ArgAction::SetTrue),
                        ),
                ),
        )
        .get_matches();

    if matches.get_flag("version") {
        return commands::version::execute();
    }

    match matches.subcommand() {
        Some(("version", _)) => commands::version::execute()?,
        Some(("snapshot", sub_matches)) => commands::snapshot::execute(sub_matches)?,
        Some(("run", sub_matches)) => commands::run::execute(sub_matches)?,
        Some(("analyze", sub_matches)) => commands::analyze::execute(sub_matches)?,
        Some(("sweep", sub_matches)) => commands::sweep::execute(sub_matches)?,
        Some(("suggest", sub_matches)) => commands::suggest::execute(sub_matches)?,
        Some(("config", sub_matches)) => commands::config::execute(sub_matches)?,
        _ => {
            println!("Welcome to perfscope!");
            println!("Use 'perfscope --help' for more information.");
        }
    }

    Ok(())
}
