//! Uptime/load, current-user, and environment facets.

use std::path::Path;
use std::time::Duration;

use chrono::DateTime;
use serde_json::{Map, Value, json};

use crate::collector::CollectorError;
use crate::collector::system::parser::{parse_btime, parse_loadavg, parse_status_uids, resolve_username};
use crate::collector::traits::{CommandRunner, FileSystem};

/// Collects boot time (ISO-8601 UTC) and load averages.
pub(super) fn uptime_load<F: FileSystem>(fs: &F, proc_path: &str) -> Result<Value, CollectorError> {
    let stat = fs.read_to_string(&Path::new(proc_path).join("stat"))?;
    let btime = parse_btime(&stat)
        .ok_or_else(|| CollectorError::Parse("no btime in /proc/stat".into()))?;
    let boot_time = DateTime::from_timestamp(btime, 0)
        .ok_or_else(|| CollectorError::Parse(format!("btime out of range: {}", btime)))?;

    let mut result = Map::new();
    result.insert("boot_time".into(), boot_time.to_rfc3339().into());

    match fs
        .read_to_string(&Path::new(proc_path).join("loadavg"))
        .map_err(CollectorError::from)
        .and_then(|content| parse_loadavg(&content).map_err(|e| CollectorError::Parse(e.message)))
    {
        Ok((one, five, fifteen)) => {
            result.insert("load_average".into(), json!([one, five, fifteen]));
        }
        Err(e) => {
            tracing::warn!("load average unavailable: {}", e);
        }
    }

    Ok(Value::Object(result))
}

/// Collects the current user, admin status, and group membership.
///
/// UID comes from `/proc/self/status` and is resolved against `/etc/passwd`,
/// with `$USER` as the fallback; admin means effective UID 0.
pub(super) fn user_info<F: FileSystem, R: CommandRunner>(
    fs: &F,
    runner: &R,
    proc_path: &str,
    timeout: Duration,
) -> Result<Value, CollectorError> {
    let status = fs.read_to_string(&Path::new(proc_path).join("self/status"))?;
    let (uid, euid) = parse_status_uids(&status)
        .ok_or_else(|| CollectorError::Parse("no Uid line in /proc/self/status".into()))?;

    let user = fs
        .read_to_string(Path::new("/etc/passwd"))
        .ok()
        .and_then(|passwd| resolve_username(&passwd, uid))
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| uid.to_string());

    let groups: Vec<String> = match runner.run("id", &["-Gn"], None, timeout) {
        Ok(output) if output.success() => output
            .stdout
            .split_whitespace()
            .map(|g| g.to_string())
            .collect(),
        _ => Vec::new(),
    };

    Ok(json!({
        "user": user,
        "uid": uid,
        "is_admin": euid == 0,
        "groups": groups,
    }))
}

/// Collects the full process environment.
///
/// Values are reported verbatim; redaction is the operator's call.
pub(super) fn env_vars() -> Result<Value, CollectorError> {
    let mut result = Map::new();
    let mut vars: Vec<(String, String)> = std::env::vars().collect();
    vars.sort();
    for (key, value) in vars {
        result.insert(key, value.into());
    }
    Ok(Value::Object(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{MockFs, MockRunner};

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn uptime_load_reads_btime_and_loadavg() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/stat", "cpu  1 2 3 4\nbtime 1700000000\n");
        fs.add_file("/proc/loadavg", "0.15 0.10 0.05 1/150 1234\n");

        let info = uptime_load(&fs, "/proc").unwrap();
        assert_eq!(info["boot_time"], "2023-11-14T22:13:20+00:00");
        assert_eq!(info["load_average"][0], 0.15);
    }

    #[test]
    fn uptime_survives_missing_loadavg() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/stat", "btime 1700000000\n");

        let info = uptime_load(&fs, "/proc").unwrap();
        assert!(info.get("load_average").is_none());
        assert!(info.get("boot_time").is_some());
    }

    #[test]
    fn uptime_without_btime_is_error() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/stat", "cpu 1 2 3\n");
        assert!(uptime_load(&fs, "/proc").is_err());
    }

    #[test]
    fn user_info_resolves_name_and_groups() {
        let mut fs = MockFs::new();
        fs.add_file(
            "/proc/self/status",
            "Name:\tsysreport\nUid:\t1000\t1000\t1000\t1000\nGid:\t1000\t1000\t1000\t1000\n",
        );
        fs.add_file(
            "/etc/passwd",
            "root:x:0:0:root:/root:/bin/bash\nuser:x:1000:1000:User:/home/user:/bin/bash\n",
        );
        let mut runner = MockRunner::new();
        runner.succeed("id -Gn", "user sudo docker\n");

        let info = user_info(&fs, &runner, "/proc", TIMEOUT).unwrap();
        assert_eq!(info["user"], "user");
        assert_eq!(info["uid"], 1000);
        assert_eq!(info["is_admin"], false);
        assert_eq!(
            info["groups"],
            serde_json::json!(["user", "sudo", "docker"])
        );
    }

    #[test]
    fn user_info_root_is_admin() {
        let mut fs = MockFs::new();
        fs.add_file(
            "/proc/self/status",
            "Name:\tsysreport\nUid:\t0\t0\t0\t0\n",
        );
        fs.add_file("/etc/passwd", "root:x:0:0:root:/root:/bin/bash\n");
        let runner = MockRunner::new();

        let info = user_info(&fs, &runner, "/proc", TIMEOUT).unwrap();
        assert_eq!(info["user"], "root");
        assert_eq!(info["is_admin"], true);
        assert!(info["groups"].as_array().unwrap().is_empty());
    }

    #[test]
    fn env_vars_is_a_sorted_map() {
        // SAFETY: test-only env mutation, no concurrent readers of this var.
        unsafe { std::env::set_var("SYSREPORT_TEST_MARKER", "1") };
        let vars = env_vars().unwrap();
        assert_eq!(vars["SYSREPORT_TEST_MARKER"], "1");
    }
}
