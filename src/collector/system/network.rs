//! Network interface facts from `/proc/net/dev` and `ip -json addr`.

use std::path::Path;
use std::time::Duration;

use serde_json::{Map, Value, json};

use crate::collector::CollectorError;
use crate::collector::system::parser::parse_net_dev;
use crate::collector::traits::{CommandRunner, FileSystem};

/// Collects per-interface traffic counters, plus addresses when `ip` is
/// available. Interfaces are sorted by name so report order is stable.
pub(super) fn network_info<F: FileSystem, R: CommandRunner>(
    fs: &F,
    runner: &R,
    timeout: Duration,
) -> Result<Value, CollectorError> {
    let content = fs.read_to_string(Path::new("/proc/net/dev"))?;
    let mut interfaces = parse_net_dev(&content);
    interfaces.sort_by(|a, b| a.name.cmp(&b.name));

    let addresses = interface_addresses(runner, timeout);

    let mut result = Map::new();
    for iface in interfaces {
        let mut entry = Map::new();
        entry.insert(
            "addresses".into(),
            addresses
                .as_ref()
                .and_then(|map| map.get(&iface.name).cloned())
                .unwrap_or(Value::Array(Vec::new())),
        );
        entry.insert("rx_bytes".into(), iface.rx_bytes.into());
        entry.insert("rx_packets".into(), iface.rx_packets.into());
        entry.insert("rx_errors".into(), iface.rx_errors.into());
        entry.insert("tx_bytes".into(), iface.tx_bytes.into());
        entry.insert("tx_packets".into(), iface.tx_packets.into());
        entry.insert("tx_errors".into(), iface.tx_errors.into());
        result.insert(iface.name, Value::Object(entry));
    }
    Ok(Value::Object(result))
}

/// Returns a map from interface name to its address list, or `None` when
/// `ip` is missing or its output unusable. Counters still get reported.
fn interface_addresses<R: CommandRunner>(
    runner: &R,
    timeout: Duration,
) -> Option<Map<String, Value>> {
    let output = runner.run("ip", &["-json", "addr"], None, timeout).ok()?;
    if !output.success() {
        return None;
    }
    let parsed: Value = serde_json::from_str(&output.stdout).ok()?;

    let mut map = Map::new();
    for iface in parsed.as_array()? {
        // A malformed entry loses its own addresses, not everyone else's.
        let Some(name) = iface["ifname"].as_str().map(String::from) else {
            continue;
        };
        let mut addrs = Vec::new();
        if let Some(addr_info) = iface["addr_info"].as_array() {
            for addr in addr_info {
                addrs.push(json!({
                    "family": addr["family"].as_str().unwrap_or("unknown"),
                    "address": addr["local"].as_str().unwrap_or(""),
                    "prefix_len": addr["prefixlen"].clone(),
                    "broadcast": addr["broadcast"].as_str().unwrap_or(""),
                }));
            }
        }
        map.insert(name, Value::Array(addrs));
    }
    Some(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{MockFs, MockRunner};

    const TIMEOUT: Duration = Duration::from_secs(5);

    const NET_DEV: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
  eth0: 987654321   654321    5   10    0     0          0       100 123456789   456789    2    5    0     0       0          0
    lo: 12345678     9876    0    0    0     0          0         0 12345678     9876    0    0    0     0       0          0
";

    const IP_ADDR: &str = r#"[
  {"ifname": "lo", "addr_info": [{"family": "inet", "local": "127.0.0.1", "prefixlen": 8}]},
  {"ifname": "eth0", "addr_info": [
    {"family": "inet", "local": "192.168.1.10", "prefixlen": 24, "broadcast": "192.168.1.255"},
    {"family": "inet6", "local": "fe80::1", "prefixlen": 64}
  ]}
]"#;

    #[test]
    fn network_info_counters_and_addresses() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/net/dev", NET_DEV);
        let mut runner = MockRunner::new();
        runner.succeed("ip -json addr", IP_ADDR);

        let info = network_info(&fs, &runner, TIMEOUT).unwrap();
        let eth0 = &info["eth0"];
        assert_eq!(eth0["rx_bytes"], 987654321);
        assert_eq!(eth0["tx_errors"], 2);
        let addrs = eth0["addresses"].as_array().unwrap();
        assert_eq!(addrs.len(), 2);
        assert_eq!(addrs[0]["address"], "192.168.1.10");
        assert_eq!(addrs[0]["broadcast"], "192.168.1.255");

        // Interfaces sorted by name: eth0 before lo.
        let names: Vec<&String> = info.as_object().unwrap().keys().collect();
        assert_eq!(names, ["eth0", "lo"]);
    }

    #[test]
    fn network_info_without_ip_tool() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/net/dev", NET_DEV);
        let runner = MockRunner::new();

        let info = network_info(&fs, &runner, TIMEOUT).unwrap();
        assert_eq!(info["lo"]["rx_bytes"], 12345678);
        assert!(info["lo"]["addresses"].as_array().unwrap().is_empty());
    }

    #[test]
    fn malformed_address_entry_only_affects_itself() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/net/dev", NET_DEV);
        let mut runner = MockRunner::new();
        runner.succeed(
            "ip -json addr",
            r#"[
  {"addr_info": [{"family": "inet", "local": "10.0.0.1", "prefixlen": 8}]},
  {"ifname": "eth0", "addr_info": [{"family": "inet", "local": "192.168.1.10", "prefixlen": 24}]}
]"#,
        );

        let info = network_info(&fs, &runner, TIMEOUT).unwrap();
        let addrs = info["eth0"]["addresses"].as_array().unwrap();
        assert_eq!(addrs.len(), 1);
        assert_eq!(addrs[0]["address"], "192.168.1.10");
    }

    #[test]
    fn network_info_missing_proc_file() {
        let fs = MockFs::new();
        let runner = MockRunner::new();
        assert!(network_info(&fs, &runner, TIMEOUT).is_err());
    }
}
