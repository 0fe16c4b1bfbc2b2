//! Tasks: run resources in a [`Context`] and record the results.
mod context;

pub use context::Context;

use std::path::PathBuf;

use serde::Serialize;

use crate::logging::TaskStatus;
use crate::resources::Reconcile;

/// Result of one executed task, as printed with `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    /// Task name (the resource description).
    pub name: String,
    /// Final status.
    pub status: TaskStatus,
    /// Whether anything changed (or would change).
    pub changed: bool,
    /// Change message or error description.
    pub message: String,
    /// Lines removed or objects touched.
    pub affected: usize,
    /// Lines found by an absent-mode line edit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found: Option<usize>,
    /// Backup copy taken before writing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
}

impl TaskReport {
    /// Whether the task failed.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.status == TaskStatus::Failed
    }
}

/// Reconcile `resource`, logging progress and recording the result in the
/// logger.  Errors are recorded, never propagated.
pub fn execute(resource: &dyn Reconcile, ctx: &Context) -> TaskReport {
    let name = resource.description();
    ctx.log.stage(&name);

    match resource.reconcile(ctx.dry_run) {
        Ok(outcome) => {
            let status = match (outcome.changed, ctx.dry_run) {
                (false, _) => TaskStatus::Ok,
                (true, true) => TaskStatus::DryRun,
                (true, false) => TaskStatus::Changed,
            };
            if status == TaskStatus::DryRun {
                ctx.log.dry_run(&outcome.message);
            } else {
                ctx.log.info(&outcome.summary(ctx.dry_run));
            }
            if let Some(backup) = &outcome.backup {
                ctx.log.debug(&format!("backup written to {}", backup.display()));
            }
            ctx.log.record_task(&name, status, Some(&outcome.message));
            TaskReport {
                name,
                status,
                changed: outcome.changed,
                message: outcome.message,
                affected: outcome.affected,
                found: outcome.found,
                backup: outcome.backup,
            }
        }
        Err(e) => {
            let message = format!("{e:#}");
            ctx.log.error(&format!("{name}: {message}"));
            ctx.log.record_task(&name, TaskStatus::Failed, Some(&message));
            TaskReport {
                name,
                status: TaskStatus::Failed,
                changed: false,
                message,
                affected: 0,
                found: None,
                backup: None,
            }
        }
    }
}

/// Execute every resource in order, continuing past failures.
pub fn execute_all<'r, I>(resources: I, ctx: &Context) -> Vec<TaskReport>
where
    I: IntoIterator<Item = &'r dyn Reconcile>,
{
    resources.into_iter().map(|r| execute(r, ctx)).collect()
}
