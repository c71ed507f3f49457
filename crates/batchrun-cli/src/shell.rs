//! Executor that runs a shell command per work item.

use std::process::Stdio;

use async_trait::async_trait;
use batchrun_core::WorkItem;
use batchrun_runtime::{ExecutionContext, ExecutionOutput, Executor, ExecutorError};
use tokio::process::Command;
use tracing::debug;

/// Keep at most this much of a command's output on the outcome.
const MAX_MESSAGE_CHARS: usize = 2000;

/// Runs `<shell> -c <command>` for each item.
///
/// `{id}` in the command is replaced by the item id. The child also sees
/// `BATCHRUN_ITEM_ID`, `BATCHRUN_BATCH_INDEX` and one
/// `BATCHRUN_META_<KEY>` variable per metadata entry. Exit status 0 is
/// success. Running commands are left to finish when their batch fails
/// fast; a timeout kills them.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
    command: String,
}

impl ShellExecutor {
    pub fn new(shell: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            command: command.into(),
        }
    }

    /// Command line for an item, with `{id}` substituted.
    fn command_line(&self, item: &WorkItem) -> String {
        self.command.replace("{id}", item.id().as_str())
    }
}

#[async_trait]
impl Executor for ShellExecutor {
    async fn execute(
        &self,
        item: &WorkItem,
        ctx: &ExecutionContext,
    ) -> Result<ExecutionOutput, ExecutorError> {
        let command_line = self.command_line(item);
        debug!(item_id = %item.id(), command = %command_line, "Spawning command");

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(&command_line)
            .env("BATCHRUN_ITEM_ID", item.id().as_str())
            .env("BATCHRUN_BATCH_INDEX", ctx.batch_index.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in item.metadata() {
            cmd.env(format!("BATCHRUN_META_{}", env_key(key)), value);
        }

        let output = cmd.spawn()?.wait_with_output().await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if output.status.success() {
            let detail = tail(stdout.trim(), MAX_MESSAGE_CHARS);
            return Ok(if detail.is_empty() {
                ExecutionOutput::default()
            } else {
                ExecutionOutput::with_message(detail)
            });
        }

        let status = match output.status.code() {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        };
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = if stderr.trim().is_empty() { stdout } else { stderr };
        let detail = tail(detail.trim(), MAX_MESSAGE_CHARS);

        Err(ExecutorError::Failed(if detail.is_empty() {
            status
        } else {
            format!("{}: {}", status, detail)
        }))
    }
}

/// Uppercase a metadata key and replace anything that is not valid in an
/// environment variable name.
fn env_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Last `max` characters of `s`.
fn tail(s: &str, max: usize) -> &str {
    let count = s.chars().count();
    if count <= max {
        return s;
    }
    let skip = count - max;
    match s.char_indices().nth(skip) {
        Some((offset, _)) => &s[offset..],
        None => s,
    }
}
