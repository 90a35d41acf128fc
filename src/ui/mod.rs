// UI and formatting module

pub mod report;

pub use report::{issue_line, print_issues, print_snapshot_overview, print_suggestions};
