use std::sync::Arc;

use crate::exec::Executor;
use crate::logging::Log;

/// Shared context for task execution.
pub struct Context {
    /// Logger for output and task recording.
    pub log: Arc<dyn Log>,
    /// Whether to perform a dry run (report changes without applying).
    pub dry_run: bool,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("executor", &self.executor)
            .finish()
    }
}

impl Context {
    /// Creates a new context for task execution.
    #[must_use]
    pub fn new(log: Arc<dyn Log>, dry_run: bool, executor: Arc<dyn Executor>) -> Self {
        Self {
            log,
            dry_run,
            executor,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::exec::SystemExecutor;
    use crate::logging::Logger;

    #[test]
    fn debug_hides_log() {
        let ctx = Context::new(
            Arc::new(Logger::with_log_file(None)),
            false,
            Arc::new(SystemExecutor),
        );
        let rendered = format!("{ctx:?}");
        assert!(rendered.contains("<dyn Log>"));
        assert!(rendered.contains("dry_run: false"));
    }
}
