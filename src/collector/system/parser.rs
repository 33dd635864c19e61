//! Parsers for `/proc`, `/etc` and tool output consumed by the system collector.
//!
//! These are pure functions that parse text into structured data. They are
//! designed to be easily testable with string inputs.

use std::collections::HashMap;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parses `/etc/os-release` content into a key/value map.
///
/// Values may be double-quoted; quotes are stripped.
pub fn parse_os_release(content: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            fields.insert(
                key.trim().to_string(),
                value.trim().trim_matches('"').to_string(),
            );
        }
    }
    fields
}

/// Parses `key: value` tool output (`hostnamectl status`, `lscpu`).
///
/// Keys are normalized to lowercase with spaces replaced by underscores,
/// e.g. `"Static hostname"` becomes `"static_hostname"`.
pub fn parse_colon_fields(content: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for line in content.lines() {
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim().to_lowercase().replace(' ', "_");
            fields.insert(key, value.trim().to_string());
        }
    }
    fields
}

/// Parses `/proc/meminfo` into a map of field name to kB value.
pub fn parse_meminfo(content: &str) -> HashMap<String, u64> {
    let mut fields = HashMap::new();
    for line in content.lines() {
        if let Some((key, value)) = line.split_once(':')
            && let Some(kb) = value.split_whitespace().next().and_then(|v| v.parse().ok())
        {
            fields.insert(key.trim().to_string(), kb);
        }
    }
    fields
}

/// Parses `/proc/loadavg` into 1/5/15-minute averages.
pub fn parse_loadavg(content: &str) -> Result<(f64, f64, f64), ParseError> {
    let mut parts = content.split_whitespace();
    let mut next = || -> Result<f64, ParseError> {
        parts
            .next()
            .ok_or_else(|| ParseError::new("loadavg too short"))?
            .parse()
            .map_err(|_| ParseError::new("invalid loadavg value"))
    };
    Ok((next()?, next()?, next()?))
}

/// Extracts the boot time (`btime`, seconds since epoch) from `/proc/stat`.
pub fn parse_btime(content: &str) -> Option<i64> {
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("btime ") {
            return rest.trim().parse().ok();
        }
    }
    None
}

/// One interface row from `/proc/net/dev`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetDevStats {
    pub name: String,
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub rx_errors: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errors: u64,
}

/// Parses `/proc/net/dev` content, skipping the two header lines.
pub fn parse_net_dev(content: &str) -> Vec<NetDevStats> {
    let mut interfaces = Vec::new();
    for line in content.lines().skip(2) {
        let Some((name, rest)) = line.split_once(':') else {
            continue;
        };
        let fields: Vec<u64> = rest
            .split_whitespace()
            .map(|f| f.parse().unwrap_or(0))
            .collect();
        if fields.len() < 11 {
            continue;
        }
        interfaces.push(NetDevStats {
            name: name.trim().to_string(),
            rx_bytes: fields[0],
            rx_packets: fields[1],
            rx_errors: fields[2],
            tx_bytes: fields[8],
            tx_packets: fields[9],
            tx_errors: fields[10],
        });
    }
    interfaces
}

/// Minimal parsed form of `/proc/[pid]/stat`, enough to rank processes.
#[derive(Debug, Clone, Default)]
pub struct PidStat {
    pub pid: u32,
    pub comm: String,
    pub state: char,
    pub utime: u64,
    pub stime: u64,
    pub rss_pages: i64,
}

/// Parses `/proc/[pid]/stat` content.
///
/// The format is tricky because the comm field can contain spaces and
/// parentheses. Format: pid (comm) state ppid ...
pub fn parse_pid_stat(content: &str) -> Result<PidStat, ParseError> {
    let content = content.trim();

    let open_paren = content
        .find('(')
        .ok_or_else(|| ParseError::new("missing '(' in stat"))?;
    let close_paren = content
        .rfind(')')
        .ok_or_else(|| ParseError::new("missing ')' in stat"))?;
    if close_paren <= open_paren {
        return Err(ParseError::new("invalid parentheses in stat"));
    }

    let pid: u32 = content[..open_paren]
        .trim()
        .parse()
        .map_err(|_| ParseError::new("invalid pid"))?;
    let comm = content[open_paren + 1..close_paren].to_string();

    let fields: Vec<&str> = content[close_paren + 1..].split_whitespace().collect();
    if fields.len() < 22 {
        return Err(ParseError::new(format!(
            "not enough fields in stat: expected 22+, got {}",
            fields.len()
        )));
    }

    Ok(PidStat {
        pid,
        comm,
        state: fields[0].chars().next().unwrap_or('?'),
        // utime/stime are fields 14/15 of the full line, offset by the
        // three already consumed (pid, comm, state).
        utime: fields[11].parse().unwrap_or(0),
        stime: fields[12].parse().unwrap_or(0),
        rss_pages: fields[21].parse().unwrap_or(0),
    })
}

/// Extracts real and effective UID from `/proc/self/status`.
///
/// The `Uid:` line has format: real effective saved fs.
pub fn parse_status_uids(content: &str) -> Option<(u32, u32)> {
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("Uid:") {
            let mut parts = rest.split_whitespace();
            let uid = parts.next()?.parse().ok()?;
            let euid = parts.next()?.parse().ok()?;
            return Some((uid, euid));
        }
    }
    None
}

/// Resolves a UID to a username from `/etc/passwd` content.
pub fn resolve_username(passwd: &str, uid: u32) -> Option<String> {
    for line in passwd.lines() {
        let mut parts = line.split(':');
        let name = parts.next()?;
        let _password = parts.next()?;
        if parts.next()?.parse::<u32>().ok() == Some(uid) {
            return Some(name.to_string());
        }
    }
    None
}

/// Parses `df -h` output into one map per filesystem row.
///
/// Column names come from the header line, lowercased. The two-word
/// "Mounted on" header collapses into `mounted_on`, and a mount point
/// containing spaces is re-joined into that final column.
pub fn parse_df_output(content: &str) -> Vec<HashMap<String, String>> {
    let mut lines = content.lines();
    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let mut header: Vec<String> = header_line
        .split_whitespace()
        .map(|h| h.to_lowercase())
        .collect();
    if header.ends_with(&["mounted".to_string(), "on".to_string()]) {
        header.truncate(header.len() - 2);
        header.push("mounted_on".to_string());
    }
    if header.is_empty() {
        return Vec::new();
    }

    let mut rows = Vec::new();
    for line in lines {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < header.len() {
            continue;
        }
        let mut row = HashMap::new();
        for (i, name) in header.iter().enumerate() {
            if i == header.len() - 1 {
                row.insert(name.clone(), parts[i..].join(" "));
            } else {
                row.insert(name.clone(), parts[i].to_string());
            }
        }
        rows.push(row);
    }
    rows
}

/// Extracts model name and core counts from `/proc/cpuinfo`.
///
/// Physical cores are counted as distinct (physical id, core id) pairs;
/// logical cores as `processor` entries.
pub fn parse_cpuinfo(content: &str) -> (Option<String>, usize, usize) {
    let mut model = None;
    let mut logical = 0;
    let mut physical_pairs = std::collections::HashSet::new();
    let mut current_physical_id: Option<&str> = None;

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        match key {
            "processor" => {
                logical += 1;
                current_physical_id = None;
            }
            "model name" => {
                if model.is_none() {
                    model = Some(value.to_string());
                }
            }
            "physical id" => current_physical_id = Some(value),
            "core id" => {
                if let Some(physical_id) = current_physical_id {
                    physical_pairs.insert((physical_id.to_string(), value.to_string()));
                }
            }
            _ => {}
        }
    }

    (model, physical_pairs.len(), logical)
}

/// One GPU row from `nvidia-smi --query-gpu=... --format=csv,noheader`.
#[derive(Debug, Clone, PartialEq)]
pub struct NvidiaGpu {
    pub name: String,
    pub driver_version: String,
    pub memory: String,
    pub compute_mode: String,
}

/// Parses `nvidia-smi` CSV output (name, driver_version, memory.total, compute_mode).
pub fn parse_nvidia_smi(content: &str) -> Vec<NvidiaGpu> {
    let mut gpus = Vec::new();
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split(',').map(|p| p.trim()).collect();
        if parts.len() < 3 {
            continue;
        }
        gpus.push(NvidiaGpu {
            name: parts[0].to_string(),
            driver_version: parts[1].to_string(),
            memory: parts[2].to_string(),
            compute_mode: parts.get(3).unwrap_or(&"Unknown").to_string(),
        });
    }
    gpus
}

/// One display controller from `lspci` output.
#[derive(Debug, Clone, PartialEq)]
pub struct PciGpu {
    pub pci_id: String,
    pub controller_type: String,
    pub description: String,
}

/// Finds VGA/3D controllers in `lspci` output.
pub fn parse_lspci_gpus(content: &str) -> Vec<PciGpu> {
    const CONTROLLER_TYPES: [&str; 2] = ["VGA compatible controller", "3D controller"];

    let mut gpus = Vec::new();
    for line in content.lines() {
        for controller in CONTROLLER_TYPES {
            let Some(pos) = line.find(controller) else {
                continue;
            };
            let pci_id = line[..pos].trim().trim_end_matches(':').trim().to_string();
            let description = line[pos + controller.len()..]
                .trim_start_matches(':')
                .trim()
                .to_string();
            if description.is_empty() {
                continue;
            }
            gpus.push(PciGpu {
                pci_id,
                controller_type: controller.to_string(),
                description,
            });
        }
    }
    gpus
}
