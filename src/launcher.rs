//! Runs deployment scripts as child processes without blocking request handling.

use std::process::{ExitStatus, Output};

use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::{DeployError, Result};

/// Starts a deployment script in the background.
///
/// Implementations must return immediately; completion is reported through logs.
pub trait Launcher: Send + Sync {
    fn launch(&self, script_path: &str) -> JoinHandle<()>;
}

/// Result of a finished script.
#[derive(Debug, Clone)]
pub struct ScriptOutcome {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ScriptOutcome {
    fn from_output(output: Output) -> Self {
        Self {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[cfg(unix)]
fn shell_command(command_line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command_line);
    cmd
}

#[cfg(windows)]
fn shell_command(command_line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command_line);
    cmd
}

#[cfg(unix)]
fn termination_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn termination_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

/// Runs `command_line` through the system shell and waits for it to finish.
pub async fn run_script(command_line: &str) -> Result<ScriptOutcome> {
    let output = shell_command(command_line)
        .stdin(std::process::Stdio::null())
        .output()
        .await
        .map_err(|e| {
            DeployError::Script(format!(
                "failed to start '{}' (code: {}): {}",
                command_line,
                e.raw_os_error()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| format!("{:?}", e.kind())),
                e
            ))
        })?;

    if let Some(signal) = termination_signal(&output.status) {
        info!("Deploy script '{}' was terminated by signal {}", command_line, signal);
    }
    Ok(ScriptOutcome::from_output(output))
}

fn log_outcome(outcome: &ScriptOutcome) {
    if !outcome.success() {
        match outcome.exit_code {
            Some(code) => error!("The deployment script has finished with error: {}", code),
            None => error!("The deployment script has finished with error: terminated by signal"),
        }
    }
    if !outcome.stdout.trim().is_empty() {
        info!("Deploy script stdout:\n{}", outcome.stdout.trim_end());
    }
    if !outcome.stderr.trim().is_empty() {
        info!("Deploy script stderr:\n{}", outcome.stderr.trim_end());
    }
    match outcome.exit_code {
        Some(code) => info!("The deploy script finished with code: {}", code),
        None => info!("The deploy script finished without an exit code"),
    }
}

fn report(result: Result<ScriptOutcome>) {
    match result {
        Ok(outcome) => log_outcome(&outcome),
        Err(e) => error!("The deployment script has finished with error: {}", e),
    }
}

/// Production launcher: each call spawns its own task and child process.
///
/// There is no queueing or limiting; overlapping pushes run concurrently.
#[derive(Debug, Clone, Default)]
pub struct ShellLauncher;

impl Launcher for ShellLauncher {
    fn launch(&self, script_path: &str) -> JoinHandle<()> {
        let script_path = script_path.to_owned();
        tokio::spawn(async move { report(run_script(&script_path).await) })
    }
}
