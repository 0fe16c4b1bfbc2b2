//! External command execution behind an injectable [`Executor`] capability.
//!
//! Resources never spawn processes directly: they receive a `&dyn Executor`
//! so tests can substitute a scripted fake.  Production code uses
//! [`SystemExecutor`].
use anyhow::{Context as _, Result};
use std::process::{Command, Output};

use crate::error::ReconcileError;

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the process exited successfully.
    pub success: bool,
    /// Exit code, if the process was not terminated by a signal.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Capability for running external programs.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run a command and return its output.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::ExternalCommandFailed`] if the command exits
    /// non-zero, or an I/O error if it cannot be spawned.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult>;
}

/// Production [`Executor`] that spawns real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let result = spawn(program, args)?;
        if !result.success {
            return Err(ReconcileError::ExternalCommandFailed {
                command: command_line(program, args),
                code: result.code.unwrap_or(-1),
                stderr: result.stderr.trim().to_string(),
            }
            .into());
        }
        Ok(result)
    }
}

fn spawn(program: &str, args: &[&str]) -> Result<ExecResult> {
    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("failed to execute: {program}"))?;
    Ok(ExecResult::from(output))
}

/// Render `program` and `args` as a single shell-like string for messages.
#[must_use]
pub fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Scripted [`Executor`] fakes shared by unit tests.
#[cfg(test)]
pub mod test_helpers {
    use super::{ExecResult, Executor, command_line};
    use crate::error::ReconcileError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A mock executor that replays queued `(success, stdout)` responses in
    /// FIFO order and records every command line it was asked to run.
    ///
    /// When the queue is empty any call returns a failed response
    /// (`success = false`, stdout = `"unexpected call"`).
    #[derive(Debug, Default)]
    pub struct MockExecutor {
        responses: Mutex<VecDeque<(bool, String)>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockExecutor {
        /// Create a mock from an ordered list of `(success, stdout)` pairs.
        #[must_use]
        pub fn with_responses(responses: Vec<(bool, &str)>) -> Self {
            Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|(ok, out)| (ok, out.to_string()))
                        .collect(),
                ),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Command lines issued so far, in order.
        #[must_use]
        pub fn calls(&self) -> Vec<String> {
            self.calls
                .lock()
                .map_or_else(|_| Vec::new(), |guard| guard.clone())
        }

        fn next(&self, program: &str, args: &[&str]) -> ExecResult {
            if let Ok(mut guard) = self.calls.lock() {
                guard.push(command_line(program, args));
            }
            let (success, stdout) = self.responses.lock().map_or_else(
                |_| (false, "mutex poisoned".to_string()),
                |mut guard| {
                    guard
                        .pop_front()
                        .unwrap_or_else(|| (false, "unexpected call".to_string()))
                },
            );
            ExecResult {
                stdout,
                stderr: String::new(),
                success,
                code: Some(i32::from(!success)),
            }
        }
    }

    impl Executor for MockExecutor {
        fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
            let result = self.next(program, args);
            if result.success {
                Ok(result)
            } else {
                Err(ReconcileError::ExternalCommandFailed {
                    command: command_line(program, args),
                    code: 1,
                    stderr: result.stdout,
                }
                .into())
            }
        }
    }
}
