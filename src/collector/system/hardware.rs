//! CPU, GPU and memory facts.

use std::path::Path;
use std::time::Duration;

use serde_json::{Map, Value, json};

use crate::collector::system::parser::{
    parse_colon_fields, parse_cpuinfo, parse_lspci_gpus, parse_meminfo, parse_nvidia_smi,
};
use crate::collector::traits::{CommandRunner, FileSystem};
use crate::collector::CollectorError;
use crate::fmt::{format_gb, format_percent, format_size};

const UNKNOWN: &str = "Unknown";

/// Collects CPU topology and frequency facts from `lscpu`, falling back to
/// `/proc/cpuinfo` when `lscpu` is unavailable.
pub(super) fn cpu_info<F: FileSystem, R: CommandRunner>(
    fs: &F,
    runner: &R,
    timeout: Duration,
) -> Result<Value, CollectorError> {
    if let Ok(output) = runner.run("lscpu", &[], None, timeout)
        && output.success()
    {
        return Ok(cpu_info_from_lscpu(&output.stdout));
    }

    // No lscpu; /proc/cpuinfo gives model and core counts only.
    let content = fs.read_to_string(Path::new("/proc/cpuinfo"))?;
    let (model, physical, logical) = parse_cpuinfo(&content);

    Ok(json!({
        "model": model.unwrap_or_else(|| UNKNOWN.into()),
        "cores_physical": if physical > 0 { Value::from(physical) } else { Value::Null },
        "cores_logical": if logical > 0 { Value::from(logical) } else { Value::Null },
    }))
}

fn cpu_info_from_lscpu(stdout: &str) -> Value {
    let fields = parse_colon_fields(stdout);
    let get = |key: &str| fields.get(key).cloned();
    let get_int = |key: &str| fields.get(key).and_then(|v| v.parse::<u64>().ok());

    let sockets = get_int("socket(s)");
    let cores_per_socket = get_int("core(s)_per_socket");
    let cores_physical = match (sockets, cores_per_socket) {
        (Some(s), Some(c)) => Some(s * c),
        _ => None,
    };

    let mut cache = Map::new();
    for (key, value) in &fields {
        if key.starts_with("l1") || key.starts_with("l2") || key.starts_with("l3") {
            let level = key.split('_').next().unwrap_or(key).to_uppercase();
            cache.insert(level, value.clone().into());
        }
    }

    let frequency = |key: &str| match fields.get(key) {
        Some(mhz) => format!("{} MHz", mhz),
        None => UNKNOWN.to_string(),
    };

    json!({
        "model": get("model_name").unwrap_or_else(|| UNKNOWN.into()),
        "architecture": get("architecture").unwrap_or_else(|| UNKNOWN.into()),
        "vendor": get("vendor_id").unwrap_or_else(|| UNKNOWN.into()),
        "cores_physical": cores_physical,
        "cores_logical": get_int("cpu(s)"),
        "sockets": sockets,
        "threads_per_core": get_int("thread(s)_per_core"),
        "max_frequency": frequency("cpu_max_mhz"),
        "min_frequency": frequency("cpu_min_mhz"),
        "cache": Value::Object(cache),
        "virtualization": get("virtualization").unwrap_or_else(|| UNKNOWN.into()),
    })
}

/// Collects GPU facts from `nvidia-smi`, AMD sysfs, and `lspci` as fallback.
///
/// Dedicated NVIDIA/AMD devices sort before integrated ones. Returns `null`
/// when no GPU is detectable, matching the "no data" convention of the
/// other facets.
pub(super) fn gpu_info<F: FileSystem, R: CommandRunner>(
    fs: &F,
    runner: &R,
    timeout: Duration,
) -> Result<Value, CollectorError> {
    let mut gpus: Vec<Value> = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    if let Ok(output) = runner.run(
        "nvidia-smi",
        &[
            "--query-gpu=name,driver_version,memory.total,compute_mode",
            "--format=csv,noheader",
        ],
        None,
        timeout,
    ) && output.success()
    {
        for gpu in parse_nvidia_smi(&output.stdout) {
            seen.push(gpu.name.clone());
            gpus.push(json!({
                "name": gpu.name,
                "type": "NVIDIA",
                "driver_version": gpu.driver_version,
                "memory": gpu.memory,
                "compute_mode": gpu.compute_mode,
                "source": "nvidia-smi",
            }));
        }
    }

    gpus.extend(amd_gpus_from_sysfs(fs, &mut seen));

    if gpus.is_empty()
        && let Ok(output) = runner.run("lspci", &[], None, timeout)
        && output.success()
    {
        for gpu in parse_lspci_gpus(&output.stdout) {
            if seen.contains(&gpu.description) {
                continue;
            }
            let gpu_type = classify_gpu(&gpu.description);
            seen.push(gpu.description.clone());
            gpus.push(json!({
                "name": gpu.description,
                "type": gpu_type,
                "controller_type": gpu.controller_type,
                "pci_id": gpu.pci_id,
                "source": "lspci",
            }));
        }
    }

    // Dedicated GPUs first.
    gpus.sort_by_key(|gpu| match gpu["type"].as_str() {
        Some("NVIDIA") => 0,
        Some("AMD") => 1,
        _ => 2,
    });

    if gpus.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(Value::Array(gpus))
    }
}

fn classify_gpu(description: &str) -> &'static str {
    if description.contains("NVIDIA") {
        "NVIDIA"
    } else if description.contains("AMD") || description.contains("ATI") {
        "AMD"
    } else if description.contains("Intel") {
        "Intel"
    } else {
        "Unknown"
    }
}

/// Scans `/sys/class/drm` for AMD cards (vendor id 0x1002).
fn amd_gpus_from_sysfs<F: FileSystem>(fs: &F, seen: &mut Vec<String>) -> Vec<Value> {
    let mut gpus = Vec::new();
    let Ok(cards) = fs.read_dir(Path::new("/sys/class/drm")) else {
        return gpus;
    };

    for card in cards {
        let Some(name) = card.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        // card0, card1, ... but not card0-HDMI-A-1 connector entries.
        if !name.starts_with("card") || name.contains('-') {
            continue;
        }
        let device = card.join("device");
        let Ok(vendor) = fs.read_to_string(&device.join("vendor")) else {
            continue;
        };
        if vendor.trim() != "0x1002" {
            continue;
        }

        let gpu_name = fs
            .read_to_string(&device.join("product_name"))
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "AMD GPU".to_string());
        if seen.contains(&gpu_name) {
            continue;
        }

        let mut gpu = Map::new();
        gpu.insert("name".into(), gpu_name.clone().into());
        gpu.insert("type".into(), "AMD".into());
        gpu.insert("source".into(), "sysfs".into());
        gpu.insert(
            "device_path".into(),
            device.to_string_lossy().into_owned().into(),
        );
        if let Ok(vram) = fs.read_to_string(&device.join("mem_info_vram_total"))
            && let Ok(bytes) = vram.trim().parse::<u64>()
        {
            gpu.insert("memory".into(), format_size(bytes).into());
        }

        seen.push(gpu_name);
        gpus.push(Value::Object(gpu));
    }
    gpus
}

/// Collects memory and swap totals from `/proc/meminfo`.
pub(super) fn memory_info<F: FileSystem>(fs: &F) -> Result<Value, CollectorError> {
    let content = fs.read_to_string(Path::new("/proc/meminfo"))?;
    let fields = parse_meminfo(&content);

    let kb = |key: &str| fields.get(key).copied().unwrap_or(0);
    let total = kb("MemTotal") * 1024;
    let available = kb("MemAvailable") * 1024;
    let swap_total = kb("SwapTotal") * 1024;
    let swap_free = kb("SwapFree") * 1024;

    if total == 0 {
        return Err(CollectorError::Parse("meminfo missing MemTotal".into()));
    }

    Ok(json!({
        "total_memory": format_gb(total),
        "available": format_gb(available),
        "percent_used": format_percent(total.saturating_sub(available), total),
        "total_swap": format_gb(swap_total),
        "swap_used": format_percent(swap_total.saturating_sub(swap_free), swap_total),
    }))
}
