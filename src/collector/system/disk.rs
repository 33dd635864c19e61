//! Disk and filesystem facts from `lsblk --json` and `df -h`.

use std::time::Duration;

use serde_json::{Map, Value, json};

use crate::collector::CollectorError;
use crate::collector::system::parser::parse_df_output;
use crate::collector::traits::CommandRunner;

/// Collects block devices classified into system/removable/virtual disks,
/// with `df -h` usage joined onto partitions and listed per filesystem.
///
/// Only whole `disk` devices are reported (partitions arrive as children,
/// loop devices carry no hardware data), and snap mounts are dropped from
/// the filesystem list; they add dozens of rows and say nothing about the
/// machine.
pub(super) fn disk_usage<R: CommandRunner>(
    runner: &R,
    timeout: Duration,
) -> Result<Value, CollectorError> {
    let lsblk = runner.run(
        "lsblk",
        &["-o", "NAME,MAJ:MIN,RM,SIZE,RO,TYPE,MOUNTPOINTS", "--json"],
        None,
        timeout,
    )?;
    if !lsblk.success() {
        return Err(CollectorError::Execution(format!(
            "lsblk exited with status {}: {}",
            lsblk.status,
            lsblk.stderr.trim()
        )));
    }

    let parsed: Value = serde_json::from_str(&lsblk.stdout)
        .map_err(|e| CollectorError::Parse(format!("lsblk JSON: {}", e)))?;
    let devices = parsed["blockdevices"].as_array().cloned().unwrap_or_default();

    let mut system_disks = Vec::new();
    let mut removable_disks = Vec::new();
    let mut virtual_disks = Vec::new();

    for device in &devices {
        if device["type"] != "disk" {
            continue;
        }

        let name = device["name"].as_str().unwrap_or("Unknown").to_string();
        let mut partitions = Vec::new();
        if let Some(children) = device["children"].as_array() {
            for child in children {
                partitions.push(json!({
                    "name": child["name"].as_str().unwrap_or("Unknown"),
                    "size": child["size"].as_str().unwrap_or("Unknown"),
                    "mountpoints": child["mountpoints"].clone(),
                    "usage": "Unknown",
                }));
            }
        }

        let simplified = json!({
            "name": name,
            "size": device["size"].as_str().unwrap_or("Unknown"),
            "type": device["type"].as_str().unwrap_or("Unknown"),
            "partitions": partitions,
            "mountpoints": device["mountpoints"].clone(),
        });

        if device["rm"] == true {
            removable_disks.push(simplified);
        } else if name.starts_with("sd") || name.starts_with("nvme") || name.starts_with("hd") {
            system_disks.push(simplified);
        } else {
            virtual_disks.push(simplified);
        }
    }

    // df usage, joined onto matching partitions.
    let mut filesystems: Vec<Value> = Vec::new();
    if let Ok(df) = runner.run("df", &["-h"], None, timeout)
        && df.success()
    {
        let rows = parse_df_output(&df.stdout);
        for row in &rows {
            let device = row.get("filesystem").cloned().unwrap_or_default();
            let mounted_on = row.get("mounted_on").cloned().unwrap_or_default();
            if !device.starts_with("/dev/")
                || mounted_on.contains("/snap")
                || mounted_on.contains("/var/lib/snapd")
            {
                continue;
            }

            let mut fs_entry = Map::new();
            for key in ["filesystem", "size", "used", "avail", "use%", "mounted_on"] {
                if let Some(value) = row.get(key) {
                    fs_entry.insert(key.to_string(), value.clone().into());
                }
            }
            filesystems.push(Value::Object(fs_entry));

            for disks in [&mut system_disks, &mut removable_disks, &mut virtual_disks] {
                for disk in disks.iter_mut() {
                    let Some(partitions) = disk["partitions"].as_array_mut() else {
                        continue;
                    };
                    for partition in partitions {
                        let Some(name) = partition["name"].as_str() else {
                            continue;
                        };
                        if device.ends_with(name) {
                            partition["usage"] = json!({
                                "used": row.get("used").cloned().unwrap_or_else(|| "Unknown".into()),
                                "available": row.get("avail").cloned().unwrap_or_else(|| "Unknown".into()),
                                "percent": row.get("use%").cloned().unwrap_or_else(|| "Unknown".into()),
                            });
                        }
                    }
                }
            }
        }
    }

    Ok(json!({
        "system_disks": system_disks,
        "removable_disks": removable_disks,
        "virtual_disks": virtual_disks,
        "filesystems": filesystems,
    }))
}
