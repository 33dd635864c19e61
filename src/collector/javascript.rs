//! JavaScript runtime, npm package and browser environment collector.

use std::path::Path;
use std::time::Duration;

use serde_json::{Map, Value, json};
use tracing::warn;

use crate::collector::traits::{CommandRunner, FileSystem};
use crate::collector::{Collector, CollectorConfig, CollectorError, CollectorResult};

/// Browser candidates probed on Linux: display name to commands to try.
const BROWSERS: [(&str, &[&str]); 8] = [
    ("Chrome", &["google-chrome", "google-chrome-stable"]),
    ("Firefox", &["firefox"]),
    ("Chromium", &["chromium-browser", "chromium"]),
    ("Opera", &["opera"]),
    ("Brave", &["brave-browser"]),
    ("Vivaldi", &["vivaldi"]),
    ("LibreWolf", &["librewolf"]),
    ("Mullvad Browser", &["mullvad-browser"]),
];

/// Collector for the JavaScript environment, identifier `"javascript"`.
///
/// Reports Node/npm presence and versions, global and project-local
/// packages, missing declared dependencies, and installed browsers. A host
/// without Node still reports browsers.
pub struct JavascriptCollector<F, R> {
    fs: F,
    runner: R,
}

impl<F: FileSystem, R: CommandRunner> JavascriptCollector<F, R> {
    pub fn new(fs: F, runner: R) -> Self {
        Self { fs, runner }
    }

    fn version_of(&self, program: &str, timeout: Duration) -> Option<String> {
        let output = self.runner.run(program, &["--version"], None, timeout).ok()?;
        if output.success() {
            Some(output.stdout.trim().to_string())
        } else {
            None
        }
    }

    fn npm_json(&self, args: &[&str], cwd: Option<&Path>, timeout: Duration) -> Value {
        match self.runner.run("npm", args, cwd, timeout) {
            // npm list exits non-zero on peer-dependency problems but still
            // prints the tree, so parse whatever came out first.
            Ok(output) => serde_json::from_str(&output.stdout).unwrap_or_else(|e| {
                json!({"error": format!("unparseable npm output: {}", e)})
            }),
            Err(e) => json!({"error": e.to_string()}),
        }
    }

    fn node_facts(&self, config: &CollectorConfig, timeout: Duration) -> Value {
        let Some(node_version) = self.version_of("node", timeout) else {
            warn!("node not found, reporting uninstalled");
            return json!({"installed": false});
        };

        let mut node = Map::new();
        node.insert("installed".into(), true.into());
        node.insert("version".into(), node_version.into());
        node.insert(
            "npm_version".into(),
            self.version_of("npm", timeout).into(),
        );
        node.insert(
            "global_packages".into(),
            self.npm_json(&["list", "-g", "--json", "--depth=0"], None, timeout),
        );

        let package_json_path = config.project_root.join("package.json");
        if self.fs.exists(&package_json_path) {
            node.insert(
                "local_packages".into(),
                self.npm_json(
                    &["list", "--json", "--depth=0"],
                    Some(&config.project_root),
                    timeout,
                ),
            );
            node.insert(
                "missing_dependencies".into(),
                self.missing_dependencies(&package_json_path, &config.project_root),
            );
        } else {
            node.insert("local_packages".into(), "No package.json found".into());
            node.insert("missing_dependencies".into(), "No package.json found".into());
        }

        node.insert(
            "npm_config".into(),
            self.npm_json(&["config", "list", "--json"], None, timeout),
        );

        Value::Object(node)
    }

    /// Compares declared dependencies against `node_modules` contents.
    fn missing_dependencies(&self, package_json_path: &Path, project_root: &Path) -> Value {
        let package_json: Value = match self
            .fs
            .read_to_string(package_json_path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()))
        {
            Ok(parsed) => parsed,
            Err(e) => return json!({"error": format!("unreadable package.json: {}", e)}),
        };

        let node_modules = project_root.join("node_modules");
        let mut missing = Vec::new();
        for section in ["dependencies", "devDependencies"] {
            if let Some(deps) = package_json[section].as_object() {
                for dep in deps.keys() {
                    if !self.fs.exists(&node_modules.join(dep)) {
                        missing.push(dep.clone());
                    }
                }
            }
        }
        missing.sort();
        missing.dedup();

        if missing.is_empty() {
            json!({
                "count": 0,
                "packages": [],
                "status": "All dependencies are installed",
            })
        } else {
            json!({
                "count": missing.len(),
                "packages": missing,
                "recommendation": "Run 'npm install' to install missing packages",
            })
        }
    }

    fn browsers(&self, timeout: Duration) -> Value {
        let mut result = Map::new();
        for (name, commands) in BROWSERS {
            let mut entry = json!({"installed": false});
            for command in commands {
                if let Some(version) = self.version_of(command, timeout) {
                    entry = json!({
                        "installed": true,
                        "command": command,
                        "version": version,
                    });
                    break;
                }
            }
            result.insert(name.to_string(), entry);
        }
        Value::Object(result)
    }
}

impl<F: FileSystem, R: CommandRunner> Collector for JavascriptCollector<F, R> {
    fn id(&self) -> &'static str {
        "javascript"
    }

    fn collect(&self, config: &CollectorConfig) -> Result<CollectorResult, CollectorError> {
        let timeout = config.command_timeout;
        let mut result = CollectorResult::new();
        result.insert("node".into(), self.node_facts(config, timeout));
        result.insert("browsers".into(), self.browsers(timeout));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{MockFs, MockRunner};

    fn config() -> CollectorConfig {
        CollectorConfig::new("/project")
    }

    fn runner_with_node() -> MockRunner {
        let mut runner = MockRunner::new();
        runner.succeed("node --version", "v20.11.0\n");
        runner.succeed("npm --version", "10.2.4\n");
        runner.succeed(
            "npm list -g --json --depth=0",
            r#"{"dependencies": {"typescript": {"version": "5.4.5"}}}"#,
        );
        runner.succeed(
            "npm list --json --depth=0",
            r#"{"name": "demo", "dependencies": {"express": {"version": "4.19.2"}}}"#,
        );
        runner.succeed("npm config list --json", r#"{"registry": "https://registry.npmjs.org/"}"#);
        runner
    }

    #[test]
    fn collects_node_and_local_packages() {
        let mut fs = MockFs::new();
        fs.add_file(
            "/project/package.json",
            r#"{"dependencies": {"express": "^4.0.0"}, "devDependencies": {"jest": "^29.0.0"}}"#,
        );
        fs.add_dir("/project/node_modules/express");
        fs.add_dir("/project/node_modules/jest");

        let collector = JavascriptCollector::new(fs, runner_with_node());
        let result = collector.collect(&config()).unwrap();

        let node = &result["node"];
        assert_eq!(node["installed"], true);
        assert_eq!(node["version"], "v20.11.0");
        assert_eq!(node["npm_version"], "10.2.4");
        assert_eq!(node["global_packages"]["dependencies"]["typescript"]["version"], "5.4.5");
        assert_eq!(node["local_packages"]["name"], "demo");
        assert_eq!(node["missing_dependencies"]["count"], 0);
    }

    #[test]
    fn reports_missing_dependencies() {
        let mut fs = MockFs::new();
        fs.add_file(
            "/project/package.json",
            r#"{"dependencies": {"express": "^4.0.0", "left-pad": "^1.3.0"}}"#,
        );
        fs.add_dir("/project/node_modules/express");

        let collector = JavascriptCollector::new(fs, runner_with_node());
        let result = collector.collect(&config()).unwrap();

        let missing = &result["node"]["missing_dependencies"];
        assert_eq!(missing["count"], 1);
        assert_eq!(missing["packages"][0], "left-pad");
        assert!(missing["recommendation"].as_str().unwrap().contains("npm install"));
    }

    #[test]
    fn no_package_json() {
        let collector = JavascriptCollector::new(MockFs::new(), runner_with_node());
        let result = collector.collect(&config()).unwrap();

        assert_eq!(result["node"]["local_packages"], "No package.json found");
    }

    #[test]
    fn missing_node_still_reports_browsers() {
        let mut runner = MockRunner::new();
        runner.succeed("firefox --version", "Mozilla Firefox 126.0\n");

        let collector = JavascriptCollector::new(MockFs::new(), runner);
        let result = collector.collect(&config()).unwrap();

        assert_eq!(result["node"]["installed"], false);
        assert_eq!(result["browsers"]["Firefox"]["installed"], true);
        assert_eq!(result["browsers"]["Firefox"]["version"], "Mozilla Firefox 126.0");
        assert_eq!(result["browsers"]["Chrome"]["installed"], false);
    }
}
