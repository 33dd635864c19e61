//! Mock command runner returning canned subprocess outputs.

use crate::collector::traits::{CommandError, CommandOutput, CommandRunner};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

/// Command runner with canned responses, keyed by the full command line.
///
/// A command with no registered response behaves as if the program were not
/// installed (`CommandError::NotFound`), which is exactly how collectors
/// discover missing tools.
#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    outputs: HashMap<String, CommandOutput>,
    hangs: HashSet<String>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(program: &str, args: &[&str]) -> String {
        let mut key = program.to_string();
        for arg in args {
            key.push(' ');
            key.push_str(arg);
        }
        key
    }

    /// Registers a successful invocation producing `stdout`.
    ///
    /// `cmdline` is the program followed by its arguments, space-joined,
    /// e.g. `"git rev-parse --abbrev-ref HEAD"`.
    pub fn succeed(&mut self, cmdline: &str, stdout: impl Into<String>) {
        self.outputs.insert(
            cmdline.to_string(),
            CommandOutput {
                status: 0,
                stdout: stdout.into(),
                stderr: String::new(),
            },
        );
    }

    /// Registers a failing invocation with the given exit code and stderr.
    pub fn fail(&mut self, cmdline: &str, status: i32, stderr: impl Into<String>) {
        self.outputs.insert(
            cmdline.to_string(),
            CommandOutput {
                status,
                stdout: String::new(),
                stderr: stderr.into(),
            },
        );
    }

    /// Registers an invocation that never finishes; `run` reports a timeout.
    pub fn hang(&mut self, cmdline: &str) {
        self.hangs.insert(cmdline.to_string());
    }
}

impl CommandRunner for MockRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        _cwd: Option<&Path>,
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        let key = Self::key(program, args);

        if self.hangs.contains(&key) {
            return Err(CommandError::Timeout(timeout));
        }

        match self.outputs.get(&key) {
            Some(output) => Ok(output.clone()),
            None => Err(CommandError::NotFound(program.to_string())),
        }
    }
}
