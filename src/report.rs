//! Plain-text report of successfully completed tasks.

use std::path::Path;

use chrono::{DateTime, Local, Utc};

use crate::error::Result;
use crate::tracker::Task;

pub const REPORT_TITLE: &str = "SUCCESSFULLY COMPLETED TASKS REPORT";

/// Formats a timestamp the way `ctime` does, in local time.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%a %b %e %H:%M:%S %Y")
        .to_string()
}

/// Renders the report body. Read-only over `tasks`.
pub fn render_success_report(tasks: &[Task]) -> String {
    let mut out = format!("{REPORT_TITLE}\n\n");
    if tasks.is_empty() {
        out.push_str("(no tasks)\n");
        return out;
    }
    for task in tasks {
        out.push_str(&format!("ID: {}\nDescription: {}\n", task.id, task.description));
        if let Some(at) = &task.completed_at {
            out.push_str(&format!("Completed at: {}\n", format_timestamp(at)));
        }
        out.push('\n');
    }
    out
}

/// Writes the report to `path`, returning how many tasks it lists.
pub fn write_success_report(path: &Path, tasks: &[Task]) -> Result<usize> {
    std::fs::write(path, render_success_report(tasks))?;
    tracing::info!(path = %path.display(), tasks = tasks.len(), "success report written");
    Ok(tasks.len())
}
