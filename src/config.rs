//! YAML configuration: output destination, logging, project scoping and the
//! collector enable-flags.
//!
//! A missing config file is not an error; it yields the defaults, which
//! enable every built-in collector. A present but malformed file is fatal,
//! as is an unrecognized key (a typo in `collectors:` would otherwise
//! silently disable a collector).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("unsupported output format '{0}': only \"json\" is supported")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub output: OutputConfig,
    pub logging: LoggingConfig,
    pub project: ProjectConfig,
    /// Collector id to enabled-flag. Ids absent from the map are disabled.
    pub collectors: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct OutputConfig {
    pub format: String,
    pub directory: PathBuf,
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ProjectConfig {
    pub root_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
            project: ProjectConfig::default(),
            // All built-in collectors run when no config file narrows the set.
            collectors: ["system", "python", "javascript"]
                .into_iter()
                .map(|id| (id.to_string(), true))
                .collect(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            directory: PathBuf::from("output"),
            filename: "system_data.json".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            directory: PathBuf::from("logs"),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Loads the configuration from `path`, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.output.format != "json" {
            return Err(ConfigError::UnsupportedFormat(self.output.format.clone()));
        }
        Ok(())
    }

    /// Destination path of the report file.
    pub fn output_path(&self) -> PathBuf {
        self.output.directory.join(&self.output.filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load(Path::new("/nonexistent/config.yaml")).unwrap();
        assert_eq!(config.output.format, "json");
        assert_eq!(config.output_path(), PathBuf::from("output/system_data.json"));
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.collectors.len(), 3);
        assert!(config.collectors.values().all(|&on| on));
    }

    #[test]
    fn full_file_round_trips() {
        let file = write_config(
            "\
output:
  format: json
  directory: /tmp/reports
  filename: facts.json
logging:
  level: DEBUG
  directory: /tmp/logs
project:
  root_dir: /home/user/project
collectors:
  system: true
  python: false
  javascript: true
",
        );

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.output_path(), PathBuf::from("/tmp/reports/facts.json"));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.project.root_dir, PathBuf::from("/home/user/project"));
        assert_eq!(config.collectors["system"], true);
        assert_eq!(config.collectors["python"], false);
    }

    #[test]
    fn partial_file_fills_defaults_per_section() {
        let file = write_config(
            "\
collectors:
  system: true
",
        );

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.output.filename, "system_data.json");
        // An explicit collectors section replaces the default set: unlisted
        // ids are disabled.
        assert_eq!(config.collectors.len(), 1);
        assert_eq!(config.collectors.get("python"), None);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let file = write_config(
            "\
output:
  format: json
  directroy: typo
",
        );

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn malformed_yaml_is_fatal() {
        let file = write_config("output: [unclosed");
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn non_json_format_is_rejected() {
        let file = write_config(
            "\
output:
  format: xml
",
        );

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(f) if f == "xml"));
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let file = write_config(
            "\
logging:
  level: TRACE
",
        );

        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
