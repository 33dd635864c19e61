//! Git repository facts scoped to the project root.

use std::path::Path;
use std::time::Duration;

use serde_json::{Value, json};

use crate::collector::CollectorError;
use crate::collector::traits::{CommandError, CommandRunner};

/// Collects branch, short status and last commit for the project root.
///
/// Not being a repository is a normal answer, not a failure: the facet
/// reports `"Not in a git repository"` and the rest of the system facts
/// are unaffected. Only a hung git invocation surfaces as an error.
pub(super) fn git_info<R: CommandRunner>(
    runner: &R,
    project_root: &Path,
    timeout: Duration,
) -> Result<Value, CollectorError> {
    match runner.run("git", &["--version"], None, timeout) {
        Ok(output) if output.success() => {}
        Ok(_) | Err(CommandError::NotFound(_)) => {
            return Ok(Value::String("git is not installed".into()));
        }
        Err(e) => return Err(e.into()),
    }

    match runner.run(
        "git",
        &["rev-parse", "--is-inside-work-tree"],
        Some(project_root),
        timeout,
    ) {
        Ok(output) if output.success() => {}
        Ok(_) => return Ok(Value::String("Not in a git repository".into())),
        Err(e) => return Err(e.into()),
    }

    let capture = |args: &[&str]| -> String {
        match runner.run("git", args, Some(project_root), timeout) {
            Ok(output) if output.success() => output.stdout.trim().to_string(),
            _ => "N/A".to_string(),
        }
    };

    Ok(json!({
        "branch": capture(&["rev-parse", "--abbrev-ref", "HEAD"]),
        "status": capture(&["status", "--short"]),
        "last_commit": capture(&["log", "-1", "--pretty=format:%h - %s (%ci)"]),
    }))
}
