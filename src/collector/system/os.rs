//! OS identity and motherboard facts.
//!
//! Primary source is `hostnamectl status` when systemd is present; kernel
//! files and `/etc/os-release` fill the gaps so the facet still works on
//! minimal hosts.

use std::path::Path;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::collector::system::parser::parse_colon_fields;
use crate::collector::system::parser::parse_os_release;
use crate::collector::traits::{CommandRunner, FileSystem};
use crate::collector::{CollectorError, CollectorResult};

const UNKNOWN: &str = "Unknown";

fn read_trimmed<F: FileSystem>(fs: &F, path: &str) -> Option<String> {
    fs.read_to_string(Path::new(path))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Collects OS identity: distribution, kernel, hostname, machine/boot ids.
pub(super) fn os_info<F: FileSystem, R: CommandRunner>(
    fs: &F,
    runner: &R,
    timeout: Duration,
) -> Result<Value, CollectorError> {
    let mut chassis = UNKNOWN.to_string();
    let mut distribution = UNKNOWN.to_string();
    let mut based_on = UNKNOWN.to_string();
    let mut build_id = UNKNOWN.to_string();
    let mut version = UNKNOWN.to_string();
    let mut machine_id = UNKNOWN.to_string();
    let mut boot_id = UNKNOWN.to_string();

    let mut kernel = read_trimmed(fs, "/proc/sys/kernel/osrelease").unwrap_or_else(|| UNKNOWN.into());
    let mut hostname =
        read_trimmed(fs, "/proc/sys/kernel/hostname").unwrap_or_else(|| UNKNOWN.into());
    let mut architecture = std::env::consts::ARCH.to_string();

    // hostnamectl knows chassis/machine-id/boot-id; absence is fine.
    if let Ok(output) = runner.run("hostnamectl", &["status"], None, timeout)
        && output.success()
    {
        let fields = parse_colon_fields(&output.stdout);
        let take = |key: &str, slot: &mut String| {
            if let Some(value) = fields.get(key) {
                *slot = value.clone();
            }
        };
        take("operating_system", &mut distribution);
        take("kernel", &mut kernel);
        take("architecture", &mut architecture);
        take("static_hostname", &mut hostname);
        take("chassis", &mut chassis);
        take("machine_id", &mut machine_id);
        take("boot_id", &mut boot_id);
    }

    if let Ok(content) = fs.read_to_string(Path::new("/etc/os-release")) {
        let fields = parse_os_release(&content);
        if distribution == UNKNOWN
            && let Some(name) = fields.get("NAME")
        {
            distribution = name.clone();
        }
        if let Some(v) = fields.get("VERSION_ID") {
            version = v.clone();
        }
        if let Some(like) = fields.get("ID_LIKE") {
            based_on = like.clone();
        }
        if let Some(build) = fields.get("BUILD_ID") {
            build_id = build.clone();
        }
    }

    if machine_id == UNKNOWN
        && let Some(id) = read_trimmed(fs, "/etc/machine-id")
    {
        machine_id = id;
    }
    if boot_id == UNKNOWN
        && let Some(id) = read_trimmed(fs, "/proc/sys/kernel/random/boot_id")
    {
        boot_id = id;
    }

    let mut result = CollectorResult::new();
    result.insert("chassis".into(), chassis.into());
    result.insert("name".into(), "Linux".into());
    result.insert("distribution".into(), distribution.into());
    result.insert("version".into(), version.into());
    result.insert("based_on".into(), based_on.into());
    result.insert("build_id".into(), build_id.into());
    result.insert("hostname".into(), hostname.into());
    result.insert("kernel".into(), kernel.into());
    result.insert("architecture".into(), architecture.into());
    result.insert("machine_id".into(), machine_id.into());
    result.insert("boot_id".into(), boot_id.into());
    Ok(Value::Object(result))
}

/// Collects motherboard/firmware facts from `hostnamectl` with DMI sysfs fallback.
pub(super) fn motherboard_info<F: FileSystem, R: CommandRunner>(
    fs: &F,
    runner: &R,
    timeout: Duration,
) -> Result<Value, CollectorError> {
    let mut vendor = UNKNOWN.to_string();
    let mut model = UNKNOWN.to_string();
    let mut firmware_version = UNKNOWN.to_string();
    let mut firmware_date = UNKNOWN.to_string();

    if let Ok(output) = runner.run("hostnamectl", &["status"], None, timeout)
        && output.success()
    {
        let fields = parse_colon_fields(&output.stdout);
        let take = |key: &str, slot: &mut String| {
            if let Some(value) = fields.get(key) {
                *slot = value.clone();
            }
        };
        take("hardware_vendor", &mut vendor);
        take("hardware_model", &mut model);
        take("firmware_version", &mut firmware_version);
        take("firmware_date", &mut firmware_date);
    }

    if vendor == UNKNOWN || model == UNKNOWN {
        if let Some(v) = read_trimmed(fs, "/sys/class/dmi/id/board_vendor") {
            vendor = v;
        }
        if let Some(m) = read_trimmed(fs, "/sys/class/dmi/id/board_name") {
            model = m;
        }
        if firmware_version == UNKNOWN
            && let Some(v) = read_trimmed(fs, "/sys/class/dmi/id/bios_version")
        {
            firmware_version = v;
        }
        if firmware_date == UNKNOWN
            && let Some(d) = read_trimmed(fs, "/sys/class/dmi/id/bios_date")
        {
            firmware_date = d;
        }
    }

    let mut result = Map::new();
    result.insert("hardware_vendor".into(), vendor.into());
    result.insert("hardware_model".into(), model.into());
    result.insert("firmware_version".into(), firmware_version.into());
    result.insert("firmware_date".into(), firmware_date.into());
    Ok(Value::Object(result))
}
