//! Shared formatting helpers for report values.
//!
//! All pure formatting functions live here so collectors emit consistent
//! human-readable sizes and percentages.

/// Format byte count as a decimal-gigabyte string, e.g. `"15.23 GB"`.
///
/// Matches the granularity operators expect from memory totals.
pub fn format_gb(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
}

/// Format byte count as human-readable binary size.
///
/// `"512B"`, `"50.00KiB"`, `"100.25MiB"`, `"1.50GiB"`
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];
    let mut size = bytes as f64;
    for unit in UNITS {
        if size < 1024.0 || unit == "EiB" {
            if unit == "B" {
                return format!("{}{}", bytes, unit);
            }
            return format!("{:.2}{}", size, unit);
        }
        size /= 1024.0;
    }
    unreachable!()
}

/// Format a used/total ratio as a percentage string, e.g. `"42.3%"`.
///
/// Returns `"0.0%"` when total is zero.
pub fn format_percent(used: u64, total: u64) -> String {
    if total == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", used as f64 * 100.0 / total as f64)
}
