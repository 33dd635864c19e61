//! Top-process listing from `/proc/[pid]/stat`.

use std::path::Path;

use serde_json::{Value, json};

use crate::collector::CollectorError;
use crate::collector::system::parser::parse_pid_stat;
use crate::collector::traits::FileSystem;
use crate::fmt::format_size;

/// Clock ticks per second (USER_HZ). Standard value for Linux.
const CLK_TCK: u64 = 100;

/// Page size used to convert RSS pages to bytes.
const PAGE_SIZE: u64 = 4096;

/// How many processes the report keeps.
const TOP_N: usize = 10;

/// Collects the top processes by accumulated CPU time.
///
/// Processes that vanish mid-scan are skipped, not errors — the listing is
/// best effort by nature.
pub(super) fn process_info<F: FileSystem>(
    fs: &F,
    proc_path: &str,
) -> Result<Value, CollectorError> {
    let entries = fs.read_dir(Path::new(proc_path))?;

    let mut processes = Vec::new();
    for entry in entries {
        let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.parse::<u32>().is_err() {
            continue;
        }

        let Ok(stat_content) = fs.read_to_string(&entry.join("stat")) else {
            continue;
        };
        let Ok(stat) = parse_pid_stat(&stat_content) else {
            continue;
        };

        // /proc/[pid]/comm is untruncated; stat's comm caps at 15 chars.
        let comm = fs
            .read_to_string(&entry.join("comm"))
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| stat.comm.clone());

        processes.push((stat, comm));
    }

    processes.sort_by(|(a, _), (b, _)| (b.utime + b.stime).cmp(&(a.utime + a.stime)));
    processes.truncate(TOP_N);

    let listing: Vec<Value> = processes
        .into_iter()
        .map(|(stat, name)| {
            json!({
                "pid": stat.pid,
                "name": name,
                "state": stat.state.to_string(),
                "cpu_time_secs": (stat.utime + stat.stime) / CLK_TCK,
                "memory": format_size(stat.rss_pages.max(0) as u64 * PAGE_SIZE),
            })
        })
        .collect();

    Ok(Value::Array(listing))
}
