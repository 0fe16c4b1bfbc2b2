//! Command: reconcile every resource declared in a manifest.
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::{ApplyOpts, GlobalOpts};
use crate::config::Manifest;
use crate::config::validation::validate_all;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{Log, Logger};
use crate::resources::Reconcile;
use crate::tasks::{self, Context, TaskReport};

/// Run the apply command against the real `rabbitmqctl`.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded or validated, or if
/// any task fails.
pub fn run(global: &GlobalOpts, opts: &ApplyOpts, log: &Arc<Logger>) -> Result<()> {
    run_with_executor(global, opts, log, Arc::new(SystemExecutor))
}

/// Run the apply command with an injected executor.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded or validated, or if
/// any task fails.
pub fn run_with_executor(
    global: &GlobalOpts,
    opts: &ApplyOpts,
    log: &Arc<Logger>,
    executor: Arc<dyn Executor>,
) -> Result<()> {
    let reports = reconcile_manifest(global.dry_run, opts, log, executor)?;
    super::finish(&reports, global, log)
}

/// Load, validate and execute the manifest, returning one report per entry.
///
/// Every entry is validated before the first one runs.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded or an entry is invalid.
pub fn reconcile_manifest(
    dry_run: bool,
    opts: &ApplyOpts,
    log: &Arc<Logger>,
    executor: Arc<dyn Executor>,
) -> Result<Vec<TaskReport>> {
    log.stage("Loading manifest");
    let manifest = Manifest::load(&opts.manifest)
        .with_context(|| format!("loading {}", opts.manifest.display()))?;
    log.info(&format!(
        "loaded {} line and {} vhost entries",
        manifest.line.len(),
        manifest.vhost.len()
    ));

    let warnings = validate_all(&manifest);
    if !warnings.is_empty() {
        log.warn(&format!(
            "found {} manifest warning(s):",
            warnings.len()
        ));
        for warning in &warnings {
            log.warn(&format!(
                "  {} [{}]: {}",
                warning.source, warning.item, warning.message
            ));
        }
    }

    let ctx = Context::new(Arc::clone(log) as Arc<dyn Log>, dry_run, executor);
    let lines = manifest.line_resources()?;
    let vhosts = manifest.vhost_resources(ctx.executor.as_ref())?;

    let resources: Vec<&dyn Reconcile> = lines
        .iter()
        .map(|r| r as &dyn Reconcile)
        .chain(vhosts.iter().map(|r| r as &dyn Reconcile))
        .collect();
    Ok(tasks::execute_all(resources, &ctx))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::exec::test_helpers::MockExecutor;
    use crate::logging::TaskStatus;
    use std::fs;

    #[test]
    fn runs_lines_then_vhosts() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("app.conf");
        fs::write(&target, "a=1\n").unwrap();
        let manifest = dir.path().join("site.toml");
        fs::write(
            &manifest,
            format!(
                "[[line]]\npath = '{}'\nregexp = '^a='\nline = 'a=2'\n\n[[vhost]]\nname = '/test'\n",
                target.display()
            ),
        )
        .unwrap();

        let executor = Arc::new(MockExecutor::with_responses(vec![(true, "/test\tfalse\n")]));
        let log = Arc::new(Logger::with_log_file(None));
        let reports = reconcile_manifest(
            false,
            &ApplyOpts { manifest },
            &log,
            Arc::clone(&executor) as Arc<dyn Executor>,
        )
        .unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].status, TaskStatus::Changed);
        assert_eq!(reports[1].status, TaskStatus::Ok);
        assert_eq!(fs::read_to_string(&target).unwrap(), "a=2\n");
    }

    #[test]
    fn invalid_entry_stops_before_any_task() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("app.conf");
        fs::write(&target, "a=1\n").unwrap();
        let manifest = dir.path().join("site.toml");
        fs::write(
            &manifest,
            format!(
                "[[line]]\npath = '{0}'\nregexp = '^a='\nline = 'a=2'\n\n\
                 [[line]]\npath = '{0}'\nregexp = '^b='\nline = 'a=3'\n",
                target.display()
            ),
        )
        .unwrap();

        let log = Arc::new(Logger::with_log_file(None));
        let err = reconcile_manifest(
            false,
            &ApplyOpts { manifest },
            &log,
            Arc::new(MockExecutor::with_responses(vec![])),
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Entry { index: 1, .. })
        ));
        assert_eq!(fs::read_to_string(&target).unwrap(), "a=1\n");
        assert!(log.task_entries().is_empty());
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(Logger::with_log_file(None));
        let err = reconcile_manifest(
            true,
            &ApplyOpts {
                manifest: dir.path().join("nope.toml"),
            },
            &log,
            Arc::new(MockExecutor::with_responses(vec![])),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("nope.toml"));
    }
}
