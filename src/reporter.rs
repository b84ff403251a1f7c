use crate::types::{AnnouncementEvent, RunSummary};

/// Emit an announcement attempt as a single JSON line to stdout.
pub fn report_announcement(event: &AnnouncementEvent) {
    if let Ok(json) = serde_json::to_string(event) {
        println!("{json}");
    }
}

/// Emit the run summary as pretty-printed JSON to stdout.
pub fn report_run_summary(summary: &RunSummary) {
    if let Ok(json) = serde_json::to_string_pretty(summary) {
        println!("{json}");
    }
}
