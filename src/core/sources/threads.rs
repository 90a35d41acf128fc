use serde::Serialize;
use serde_json::{Map, Value};

use super::{round2, to_object, MetricSource};
use crate::error::Result;
use crate::platform::threads::process_threads;

/// Blocking state is unknowable for threads of another process.
const UNKNOWN: &str = "Unknown";

#[derive(Debug, Serialize)]
struct ThreadDetail {
    process_name: String,
    pid: u32,
    thread_name: String,
    ident: u32,
    is_alive: &'static str,
    is_blocking: &'static str,
    stack_summary: Vec<String>,
    user_time: f64,
    system_time: f64,
    total_cpu_time: f64,
    source: &'static str,
}

#[derive(Debug, Serialize)]
struct ThreadPayload {
    collected_at: String,
    external_process_count: usize,
    thread_count: usize,
    thread_details: Vec<ThreadDetail>,
}

/// Threads of up to `max_processes` external processes (`thread_metrics`).
pub struct ThreadSource {
    max_processes: usize,
}

impl ThreadSource {
    pub fn new(max_processes: usize) -> Self {
        Self { max_processes }
    }
}

impl MetricSource for ThreadSource {
    fn name(&self) -> &'static str {
        "thread_metrics"
    }

    fn produce_snapshot(&self) -> Result<Map<String, Value>> {
        let own_pid = std::process::id();
        let mut external_process_count = 0;
        let mut thread_details = Vec::new();

        for entry in process_threads(Some(self.max_processes), Some(own_pid)) {
            let process = match entry {
                Ok(process) => process,
                Err(e) => {
                    log::debug!("Skipping process in thread_metrics: {}", e);
                    continue;
                }
            };
            external_process_count += 1;

            for thread in process.threads {
                thread_details.push(ThreadDetail {
                    process_name: process.process_name.clone(),
                    pid: process.pid,
                    thread_name: format!("TID-{}", thread.tid),
                    ident: thread.tid,
                    is_alive: UNKNOWN,
                    is_blocking: UNKNOWN,
                    stack_summary: vec!["Unavailable for external process".to_string()],
                    user_time: round2(thread.user_time),
                    system_time: round2(thread.system_time),
                    total_cpu_time: round2(thread.total_cpu_time()),
                    source: "external",
                });
            }
        }

        let payload = ThreadPayload {
            collected_at: chrono::Local::now().to_rfc3339(),
            external_process_count,
            thread_count: thread_details.len(),
            thread_details,
        };

        to_object(self.name(), &payload)
    }
}
