//! Command: converge a message-broker virtual host.
use std::sync::Arc;

use anyhow::Result;

use crate::cli::{GlobalOpts, VhostOpts};
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{Log, Logger};
use crate::resources::vhost::Vhost;
use crate::tasks::{self, Context};

/// Run the vhost command against the real `rabbitmqctl`.
///
/// # Errors
///
/// Returns an error if the name is empty or the reconciliation fails.
pub fn run(global: &GlobalOpts, opts: &VhostOpts, log: &Arc<Logger>) -> Result<()> {
    run_with_executor(global, opts, log, Arc::new(SystemExecutor))
}

/// Run the vhost command with an injected executor.
///
/// # Errors
///
/// Returns an error if the name is empty or the reconciliation fails.
pub fn run_with_executor(
    global: &GlobalOpts,
    opts: &VhostOpts,
    log: &Arc<Logger>,
    executor: Arc<dyn Executor>,
) -> Result<()> {
    if opts.name.trim().is_empty() {
        anyhow::bail!("vhost name must not be empty");
    }

    let ctx = Context::new(Arc::clone(log) as Arc<dyn Log>, global.dry_run, executor);
    let resource = Vhost::new(
        opts.name.clone(),
        opts.state,
        opts.tracing.enabled(),
        opts.node.clone(),
        ctx.executor.as_ref(),
    );
    let report = tasks::execute(&resource, &ctx);
    super::finish(&[report], global, log)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Flag;
    use crate::exec::test_helpers::MockExecutor;
    use crate::logging::TaskStatus;
    use crate::resources::Ensure;

    fn opts(name: &str) -> VhostOpts {
        VhostOpts {
            name: name.to_string(),
            state: Ensure::Present,
            tracing: Flag::YES,
            node: None,
        }
    }

    #[test]
    fn dry_run_records_pending_change() {
        let executor = Arc::new(MockExecutor::with_responses(vec![(true, "/\tfalse\n")]));
        let log = Arc::new(Logger::with_log_file(None));
        let global = GlobalOpts {
            dry_run: true,
            json: true,
        };

        run_with_executor(&global, &opts("/test"), &log, Arc::clone(&executor) as Arc<dyn Executor>)
            .unwrap();

        assert_eq!(log.task_entries()[0].status, TaskStatus::DryRun);
        assert_eq!(executor.calls().len(), 1);
    }

    #[test]
    fn empty_name_is_rejected() {
        let executor = Arc::new(MockExecutor::with_responses(vec![]));
        let log = Arc::new(Logger::with_log_file(None));
        let global = GlobalOpts {
            dry_run: false,
            json: true,
        };
        assert!(run_with_executor(&global, &opts(""), &log, executor).is_err());
    }
}
