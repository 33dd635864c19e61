//! Debug-data collectors.
//!
//! A collector produces one named facet of host or language-runtime state as
//! a JSON map. Collectors are stateless across invocations, read-only with
//! respect to the host, and independent of each other: the aggregator runs
//! whichever subset the configuration enables and isolates every failure.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                         Aggregator                            │
//! │   ┌───────────────┐  ┌────────────────┐  ┌────────────────┐   │
//! │   │SystemCollector│  │PythonCollector │  │  JsCollector   │   │
//! │   │ /proc, /etc,  │  │ python3, pip   │  │ node, npm,     │   │
//! │   │ lscpu, git... │  │ venv scan      │  │ browsers       │   │
//! │   └───────┬───────┘  └───────┬────────┘  └───────┬────────┘   │
//! │           └──────────────────┼───────────────────┘            │
//! │                  ┌───────────▼────────────┐                   │
//! │                  │ FileSystem / CmdRunner │ (traits)          │
//! │                  └───────────┬────────────┘                   │
//! └──────────────────────────────┼────────────────────────────────┘
//!                ┌───────────────┼────────────────┐
//!         ┌──────▼──────┐ ┌──────▼──────┐  ┌──────▼──────┐
//!         │RealFs/Runner│ │MockFs/Runner│  │  Scenarios  │
//!         │ (Linux)     │ │ (Testing)   │  │ (Fixtures)  │
//!         └─────────────┘ └─────────────┘  └─────────────┘
//! ```

pub mod javascript;
pub mod mock;
pub mod python;
pub mod system;
pub mod traits;

use std::path::PathBuf;
use std::time::Duration;

use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::collector::traits::CommandError;

pub use javascript::JavascriptCollector;
pub use mock::{MockFs, MockRunner};
pub use python::PythonCollector;
pub use system::SystemCollector;
pub use traits::{CommandOutput, CommandRunner, FileSystem, RealFs, RealRunner};

/// A collector's output: a JSON object describing one facet of the host.
///
/// No schema is imposed beyond JSON-serializability; each collector defines
/// its own internal shape.
pub type CollectorResult = Map<String, Value>;

/// Failure of a single collector or probe.
///
/// Converted to an `{"error": ..., "type": ...}` entry at the aggregator
/// boundary; never fatal to the run.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// An external tool failed or is missing.
    #[error("{0}")]
    Execution(String),
    /// This collector cannot run on the current platform.
    #[error("not supported: {0}")]
    NotSupported(String),
    /// A subprocess exceeded its deadline and was killed.
    #[error("timed out after {:.1}s", .0.as_secs_f64())]
    Timeout(Duration),
    /// Filesystem read failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Tool output did not parse.
    #[error("parse error: {0}")]
    Parse(String),
}

impl CollectorError {
    /// Stable classification string used in serialized error descriptions.
    pub fn kind(&self) -> &'static str {
        match self {
            CollectorError::Execution(_) => "execution_error",
            CollectorError::NotSupported(_) => "not_supported",
            CollectorError::Timeout(_) => "timeout",
            CollectorError::Io(_) => "io_error",
            CollectorError::Parse(_) => "parse_error",
        }
    }

    /// Serializes this error as the report payload for a failed collector.
    pub fn to_description(&self) -> Value {
        json!({
            "error": self.to_string(),
            "type": self.kind(),
        })
    }
}

impl From<CommandError> for CollectorError {
    fn from(e: CommandError) -> Self {
        match e {
            CommandError::NotFound(program) => {
                CollectorError::Execution(format!("command not found: {}", program))
            }
            CommandError::Io(e) => CollectorError::Io(e),
            CommandError::Timeout(d) => CollectorError::Timeout(d),
        }
    }
}

/// Shared run-time parameters passed to every collector.
///
/// `proc_path` exists so tests can point collectors at a mock tree instead
/// of the real `/proc`.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Project root used by language collectors to scope their queries.
    pub project_root: PathBuf,
    /// Base path to the proc filesystem (usually "/proc").
    pub proc_path: String,
    /// Deadline applied to each external tool invocation.
    pub command_timeout: Duration,
}

impl CollectorConfig {
    /// Default per-subprocess deadline. Package-manager queries (`npm list`,
    /// `pip list --outdated`) are the slow ones.
    pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            proc_path: "/proc".to_string(),
            command_timeout: Self::DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_proc_path(mut self, proc_path: impl Into<String>) -> Self {
        self.proc_path = proc_path.into();
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}

/// Capability contract every collector implements.
///
/// `collect` may read the filesystem and spawn transient subprocesses but
/// must not mutate host state. Failure is signalled only through the error
/// return, never as a mislabeled success.
pub trait Collector: Send + Sync {
    /// Unique identifier; the report key is derived as `"<id>_debug_data"`.
    fn id(&self) -> &'static str;

    /// Produces this collector's facet of the report.
    fn collect(&self, config: &CollectorConfig) -> Result<CollectorResult, CollectorError>;
}
