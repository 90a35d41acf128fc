//! Optimization suggestions derived from issues.

use serde::Serialize;

use crate::core::analyzer::{Issue, IssueDetail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub status: SuggestionStatus,
    pub message: String,
    pub issue_type: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_message: Option<String>,
}

/// One suggestion per issue. Only high-CPU processes and threads have
/// remedies; every other kind is reported back as unhandled.
pub fn suggest_optimizations(issues: &[Issue]) -> Vec<Suggestion> {
    issues.iter().map(suggest).collect()
}

fn suggest(issue: &Issue) -> Suggestion {
    let kind = issue.kind();
    let (status, message, original_message) = match &issue.detail {
        IssueDetail::CpuProcess { process_name, pid, .. } => {
            let pid = pid.map_or_else(|| "Unknown".to_string(), |pid| pid.to_string());
            (
                SuggestionStatus::Success,
                format!(
                    "Optimization suggestion: Investigate high CPU usage by process '{}' (PID: {}). \
                     Consider checking for inefficient loops, stuck threads, or runaway processes.",
                    process_name, pid
                ),
                Some(issue.message.clone()),
            )
        }
        IssueDetail::HighCpuThread {
            thread_name,
            process_name,
            ..
        } => (
            SuggestionStatus::Success,
            format!(
                "Optimization suggestion: Detected locked thread '{}'. \
                 Safely abort or debug the issue causing thread in process '{}'.",
                thread_name, process_name
            ),
            Some(issue.message.clone()),
        ),
        _ => (
            SuggestionStatus::Error,
            format!("Unhandled issue type: {}", kind),
            None,
        ),
    };

    Suggestion {
        status,
        message,
        issue_type: kind.to_string(),
        timestamp: issue.timestamp.clone(),
        original_message,
    }
}
