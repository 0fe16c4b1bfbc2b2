// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed workspace with a fluent builder and
// a scripted executor so each integration test can set up an isolated
// environment without repeating filesystem or process boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

use reconcile_cli::error::ReconcileError;
use reconcile_cli::exec::{ExecResult, Executor, command_line};

/// An isolated workspace backed by a [`tempfile::TempDir`].
pub struct Workspace {
    /// Temporary directory holding the managed files.
    pub root: tempfile::TempDir,
}

impl Workspace {
    /// Create an empty workspace.
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Absolute path of `name` inside the workspace.
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    /// Read `name` as UTF-8.
    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path(name)).expect("read workspace file")
    }

    /// Names of every entry directly under the workspace root, sorted.
    pub fn entries(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.root.path())
            .expect("read workspace dir")
            .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Fluent builder for [`Workspace`].
pub struct WorkspaceBuilder {
    ws: Workspace,
}

impl WorkspaceBuilder {
    /// Begin building an empty workspace.
    pub fn new() -> Self {
        Self {
            ws: Workspace::new(),
        }
    }

    /// Write `content` to `name`, creating parent directories.
    pub fn with_file(self, name: &str, content: &str) -> Self {
        let path = self.ws.path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, content).expect("write workspace file");
        self
    }

    /// Create an empty directory `name`.
    pub fn with_dir(self, name: &str) -> Self {
        std::fs::create_dir_all(self.ws.path(name)).expect("create dir");
        self
    }

    /// Write `manifest.toml`, replacing `{root}` with the workspace path.
    pub fn with_manifest(self, template: &str) -> Self {
        let content = template.replace("{root}", &self.ws.root.path().display().to_string());
        self.with_file("manifest.toml", &content)
    }

    /// Finish building and return the workspace.
    pub fn build(self) -> Workspace {
        self.ws
    }
}

/// Executor that replays scripted `(success, stdout)` responses in order and
/// records every command line.  Runs out of script ⇒ failed response.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    responses: Mutex<VecDeque<(bool, String)>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    /// Create an executor from ordered responses.
    pub fn new(responses: &[(bool, &str)]) -> Self {
        Self {
            responses: Mutex::new(
                responses
                    .iter()
                    .map(|(ok, out)| (*ok, (*out).to_string()))
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Command lines issued so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn next(&self, program: &str, args: &[&str]) -> ExecResult {
        self.calls
            .lock()
            .expect("calls lock")
            .push(command_line(program, args));
        let (success, stdout) = self
            .responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or((false, "unexpected call".to_string()));
        ExecResult {
            stdout,
            stderr: String::new(),
            success,
            code: Some(i32::from(!success)),
        }
    }
}

impl Executor for ScriptedExecutor {
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

/// Whether `name` looks like a backup of `base` (`base.<timestamp>~`).
pub fn is_backup_of(name: &str, base: &str) -> bool {
    name.len() > base.len() + 1
        && name.starts_with(&format!("{base}."))
        && name.ends_with('~')
}
