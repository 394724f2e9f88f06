// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Default timeout for git operations.
pub const GIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for git worktree operations (fresh checkouts can be slow).
pub const GIT_WORKTREE_TIMEOUT: Duration = Duration::from_secs(60);

/// Cap on captured subprocess output. Anything past this is a runaway
/// command, not data the engine should buffer.
pub const MAX_CAPTURED_OUTPUT: usize = 10 * 1024 * 1024;

/// Run a subprocess command with a timeout.
///
/// Wraps `Command::output()` with `tokio::time::timeout`, converting
/// timeout expiration into a descriptive error message. The child process
/// is killed automatically if the timeout elapses (via the tokio `Child`
/// drop implementation).
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(format!("{} failed: {}", description, io_err)),
        Err(_elapsed) => Err(format!(
            "{} timed out after {}s",
            description,
            timeout.as_secs()
        )),
    }
}

/// Whether a captured output exceeds the buffer cap.
pub fn output_exceeds_cap(output: &Output) -> bool {
    output.stdout.len() + output.stderr.len() > MAX_CAPTURED_OUTPUT
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
