//! Python runtime and package environment collector.

use std::path::Path;
use std::time::Duration;

use serde_json::{Map, Value, json};
use tracing::warn;

use crate::collector::traits::{CommandRunner, FileSystem};
use crate::collector::{Collector, CollectorConfig, CollectorError, CollectorResult};

/// Collector for the Python environment, identifier `"python"`.
///
/// Probes the system `python3` plus any virtualenvs found under the project
/// root. A host without Python is a normal answer (`installed: false`), not
/// a collector failure.
pub struct PythonCollector<F, R> {
    fs: F,
    runner: R,
}

impl<F: FileSystem, R: CommandRunner> PythonCollector<F, R> {
    pub fn new(fs: F, runner: R) -> Self {
        Self { fs, runner }
    }

    /// Runs a command expected to print JSON; bad output becomes an error string.
    fn run_json(&self, program: &str, args: &[&str], timeout: Duration) -> Value {
        match self.runner.run(program, args, None, timeout) {
            Ok(output) if output.success() => serde_json::from_str(&output.stdout)
                .unwrap_or_else(|e| json!({"error": format!("unparseable output: {}", e)})),
            Ok(output) => json!({"error": format!("exited with status {}", output.status)}),
            Err(e) => json!({"error": e.to_string()}),
        }
    }

    /// Version string of a tool, e.g. `"Python 3.12.3"` or `"pip 24.0 from ..."`.
    fn version_of(&self, program: &str, timeout: Duration) -> Option<String> {
        let output = self.runner.run(program, &["--version"], None, timeout).ok()?;
        if !output.success() {
            return None;
        }
        // Old interpreters print the version to stderr.
        let line = if output.stdout.trim().is_empty() {
            output.stderr
        } else {
            output.stdout
        };
        Some(line.trim().to_string())
    }

    fn requirements(&self, project_root: &Path) -> Value {
        let path = project_root.join("requirements.txt");
        match self.fs.read_to_string(&path) {
            Ok(content) => json!({"exists": true, "content": content}),
            Err(_) => json!({"exists": false, "content": null}),
        }
    }

    /// Scans the project root for directories that look like virtualenvs
    /// (`<dir>/bin/python` present) and probes each one.
    fn detected_venvs(&self, project_root: &Path, timeout: Duration) -> Map<String, Value> {
        let mut detected = Map::new();
        let Ok(entries) = self.fs.read_dir(project_root) else {
            return detected;
        };

        let mut entries = entries;
        entries.sort();
        for entry in entries {
            let python = entry.join("bin/python");
            if !self.fs.exists(&python) {
                continue;
            }
            let name = entry
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let pip = entry.join("bin/pip").to_string_lossy().into_owned();
            let python = python.to_string_lossy().into_owned();

            detected.insert(
                entry.to_string_lossy().into_owned(),
                json!({
                    "name": name,
                    "path": entry.to_string_lossy(),
                    "python_version": self.version_of(&python, timeout),
                    "pip_version": self.version_of(&pip, timeout),
                    "packages": self.run_json(&pip, &["list", "--format=json"], timeout),
                }),
            );
        }
        detected
    }
}

impl<F: FileSystem, R: CommandRunner> Collector for PythonCollector<F, R> {
    fn id(&self) -> &'static str {
        "python"
    }

    fn collect(&self, config: &CollectorConfig) -> Result<CollectorResult, CollectorError> {
        let timeout = config.command_timeout;
        let mut result = CollectorResult::new();

        let Some(version) = self.version_of("python3", timeout) else {
            warn!("python3 not found, reporting uninstalled");
            result.insert("runtime".into(), json!({"installed": false}));
            return Ok(result);
        };

        let executable = match self.runner.run(
            "python3",
            &["-c", "import sys; print(sys.executable)"],
            None,
            timeout,
        ) {
            Ok(output) if output.success() => Value::String(output.stdout.trim().to_string()),
            _ => Value::Null,
        };

        result.insert(
            "runtime".into(),
            json!({
                "installed": true,
                "version": version,
                "executable": executable,
            }),
        );

        result.insert(
            "pip".into(),
            json!({
                "version": self.version_of("pip3", timeout)
                    .or_else(|| self.pip_module_version(timeout)),
                "config": self.pip_config(timeout),
            }),
        );

        result.insert(
            "packages".into(),
            json!({
                "installed": self.run_json("python3", &["-m", "pip", "list", "--format=json"], timeout),
                "outdated": self.run_json(
                    "python3",
                    &["-m", "pip", "list", "--outdated", "--format=json"],
                    timeout,
                ),
            }),
        );

        result.insert(
            "requirements".into(),
            self.requirements(&config.project_root),
        );

        let active = std::env::var("VIRTUAL_ENV").ok();
        result.insert(
            "virtual_environments".into(),
            json!({
                "active": active.as_deref().map(|path| json!({
                    "path": path,
                    "name": Path::new(path).file_name().map(|n| n.to_string_lossy().into_owned()),
                })),
                "detected": self.detected_venvs(&config.project_root, timeout),
            }),
        );

        Ok(result)
    }
}

impl<F: FileSystem, R: CommandRunner> PythonCollector<F, R> {
    fn pip_module_version(&self, timeout: Duration) -> Option<String> {
        let output = self
            .runner
            .run("python3", &["-m", "pip", "--version"], None, timeout)
            .ok()?;
        if output.success() {
            Some(output.stdout.trim().to_string())
        } else {
            None
        }
    }

    fn pip_config(&self, timeout: Duration) -> Value {
        match self
            .runner
            .run("python3", &["-m", "pip", "config", "list"], None, timeout)
        {
            Ok(output) if output.success() => Value::String(output.stdout.trim().to_string()),
            _ => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{MockFs, MockRunner};

    fn config() -> CollectorConfig {
        CollectorConfig::new("/project")
    }

    fn runner_with_python() -> MockRunner {
        let mut runner = MockRunner::new();
        runner.succeed("python3 --version", "Python 3.12.3\n");
        runner.succeed(
            "python3 -c import sys; print(sys.executable)",
            "/usr/bin/python3\n",
        );
        runner.succeed("pip3 --version", "pip 24.0 from /usr/lib/python3/dist-packages/pip (python 3.12)\n");
        runner.succeed("python3 -m pip config list", "global.index-url='https://pypi.org/simple'\n");
        runner.succeed(
            "python3 -m pip list --format=json",
            r#"[{"name": "requests", "version": "2.32.0"}, {"name": "pyyaml", "version": "6.0.1"}]"#,
        );
        runner.succeed(
            "python3 -m pip list --outdated --format=json",
            r#"[{"name": "requests", "version": "2.32.0", "latest_version": "2.32.3"}]"#,
        );
        runner
    }

    #[test]
    fn collects_runtime_and_packages() {
        let mut fs = MockFs::new();
        fs.add_file("/project/requirements.txt", "requests>=2.0\n");

        let collector = PythonCollector::new(fs, runner_with_python());
        let result = collector.collect(&config()).unwrap();

        assert_eq!(result["runtime"]["installed"], true);
        assert_eq!(result["runtime"]["version"], "Python 3.12.3");
        assert_eq!(result["runtime"]["executable"], "/usr/bin/python3");
        assert_eq!(result["packages"]["installed"][0]["name"], "requests");
        assert_eq!(result["packages"]["outdated"][0]["latest_version"], "2.32.3");
        assert_eq!(result["requirements"]["exists"], true);
        assert!(
            result["requirements"]["content"]
                .as_str()
                .unwrap()
                .contains("requests")
        );
    }

    #[test]
    fn missing_python_reports_uninstalled() {
        let collector = PythonCollector::new(MockFs::new(), MockRunner::new());
        let result = collector.collect(&config()).unwrap();

        assert_eq!(result["runtime"]["installed"], false);
        assert!(result.get("packages").is_none());
    }

    #[test]
    fn detects_venvs_under_project_root() {
        let mut fs = MockFs::new();
        fs.add_file("/project/.venv/bin/python", "");
        fs.add_file("/project/.venv/bin/pip", "");
        fs.add_dir("/project/src");

        let mut runner = runner_with_python();
        runner.succeed("/project/.venv/bin/python --version", "Python 3.12.3\n");
        runner.succeed("/project/.venv/bin/pip --version", "pip 24.0\n");
        runner.succeed(
            "/project/.venv/bin/pip list --format=json",
            r#"[{"name": "flask", "version": "3.0.0"}]"#,
        );

        let collector = PythonCollector::new(fs, runner);
        let result = collector.collect(&config()).unwrap();

        let detected = result["virtual_environments"]["detected"].as_object().unwrap();
        assert_eq!(detected.len(), 1);
        let venv = &detected["/project/.venv"];
        assert_eq!(venv["name"], ".venv");
        assert_eq!(venv["packages"][0]["name"], "flask");
    }

    #[test]
    fn broken_pip_output_is_contained() {
        let mut runner = runner_with_python();
        runner.succeed("python3 -m pip list --format=json", "this is not json");

        let collector = PythonCollector::new(MockFs::new(), runner);
        let result = collector.collect(&config()).unwrap();

        assert!(result["packages"]["installed"]["error"].is_string());
        // Other fields unaffected.
        assert_eq!(result["runtime"]["installed"], true);
    }
}
