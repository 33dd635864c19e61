//! System-facts collector: OS, hardware, disks, network, processes, git,
//! environment and user data, one facet per report key.
//!
//! Each facet is individually isolated: a failed probe becomes an
//! `{"error": ..., "type": ...}` value under its own key and the remaining
//! facets still collect. The collector as a whole only fails if the report
//! would otherwise be empty of meaning (it never does in practice — facet
//! helpers degrade to "Unknown" placeholders first).

mod disk;
mod git;
mod hardware;
mod host;
mod network;
mod os;
pub mod parser;
mod process;

use serde_json::Value;
use tracing::{debug, warn};

use crate::collector::traits::{CommandRunner, FileSystem};
use crate::collector::{Collector, CollectorConfig, CollectorError, CollectorResult};

/// Collector for host-level facts, identifier `"system"`.
pub struct SystemCollector<F, R> {
    fs: F,
    runner: R,
}

impl<F: FileSystem, R: CommandRunner> SystemCollector<F, R> {
    pub fn new(fs: F, runner: R) -> Self {
        Self { fs, runner }
    }
}

/// Inserts a facet value, or its error description if the probe failed.
fn insert_facet(result: &mut CollectorResult, name: &str, outcome: Result<Value, CollectorError>) {
    match outcome {
        Ok(value) => {
            debug!("system facet '{}' collected", name);
            result.insert(name.to_string(), value);
        }
        Err(e) => {
            warn!("system facet '{}' failed: {}", name, e);
            result.insert(name.to_string(), e.to_description());
        }
    }
}

impl<F: FileSystem, R: CommandRunner> Collector for SystemCollector<F, R> {
    fn id(&self) -> &'static str {
        "system"
    }

    fn collect(&self, config: &CollectorConfig) -> Result<CollectorResult, CollectorError> {
        let fs = &self.fs;
        let runner = &self.runner;
        let timeout = config.command_timeout;
        let proc_path = config.proc_path.as_str();

        let mut result = CollectorResult::new();
        insert_facet(&mut result, "os", os::os_info(fs, runner, timeout));
        insert_facet(
            &mut result,
            "motherboard_info",
            os::motherboard_info(fs, runner, timeout),
        );
        insert_facet(&mut result, "cpu_info", hardware::cpu_info(fs, runner, timeout));
        insert_facet(&mut result, "gpu_info", hardware::gpu_info(fs, runner, timeout));
        insert_facet(&mut result, "memory_info", hardware::memory_info(fs));
        insert_facet(&mut result, "disk_usage", disk::disk_usage(runner, timeout));
        insert_facet(
            &mut result,
            "network_info",
            network::network_info(fs, runner, timeout),
        );
        insert_facet(&mut result, "uptime", host::uptime_load(fs, proc_path));
        insert_facet(
            &mut result,
            "user",
            host::user_info(fs, runner, proc_path, timeout),
        );
        insert_facet(
            &mut result,
            "git",
            git::git_info(runner, &config.project_root, timeout),
        );
        insert_facet(&mut result, "environment", host::env_vars());
        insert_facet(&mut result, "processes", process::process_info(fs, proc_path));

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{MockFs, MockRunner};

    #[test]
    fn collect_produces_every_facet() {
        let collector = SystemCollector::new(MockFs::typical_host(), MockRunner::typical_host());
        let config = CollectorConfig::new("/project");

        let result = collector.collect(&config).unwrap();

        for facet in [
            "os",
            "motherboard_info",
            "cpu_info",
            "gpu_info",
            "memory_info",
            "disk_usage",
            "network_info",
            "uptime",
            "user",
            "git",
            "environment",
            "processes",
        ] {
            assert!(result.contains_key(facet), "missing facet: {}", facet);
        }

        assert_eq!(result["os"]["distribution"], "Ubuntu 24.04.1 LTS");
        assert_eq!(result["user"]["user"], "user");
        assert!(!result["processes"].as_array().unwrap().is_empty());
    }

    #[test]
    fn failed_git_probe_does_not_abort_other_facets() {
        let fs = MockFs::typical_host();
        let mut runner = MockRunner::typical_host();
        runner.fail(
            "git rev-parse --is-inside-work-tree",
            128,
            "fatal: not a git repository\n",
        );

        let collector = SystemCollector::new(fs, runner);
        let result = collector.collect(&CollectorConfig::new("/project")).unwrap();

        assert_eq!(result["git"], "Not in a git repository");
        assert_eq!(result["os"]["distribution"], "Ubuntu 24.04.1 LTS");
        assert!(result["memory_info"]["total_memory"].is_string());
    }

    #[test]
    fn facet_error_is_isolated_as_description() {
        // Empty fs: meminfo, net/dev etc. all missing -> facets carry errors.
        let collector = SystemCollector::new(MockFs::new(), MockRunner::new());
        let result = collector.collect(&CollectorConfig::new("/project")).unwrap();

        assert!(result["memory_info"]["error"].is_string());
        assert_eq!(result["memory_info"]["type"], "io_error");
        // os facet degrades to placeholders instead of failing.
        assert_eq!(result["os"]["distribution"], "Unknown");
    }

    #[test]
    fn collect_is_shape_stable_across_runs() {
        let collector = SystemCollector::new(MockFs::typical_host(), MockRunner::typical_host());
        let config = CollectorConfig::new("/project");

        let first = collector.collect(&config).unwrap();
        let second = collector.collect(&config).unwrap();

        let keys = |r: &CollectorResult| r.keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys(&first), keys(&second));
    }
}
