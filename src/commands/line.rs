//! Command: reconcile a single line in a file.
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::{GlobalOpts, LineOpts};
use crate::exec::SystemExecutor;
use crate::logging::{Log, Logger};
use crate::resources::line_in_file::LineInFile;
use crate::tasks::{self, Context};

/// Run the line command.
///
/// # Errors
///
/// Returns an error if the options are inconsistent (before the file is
/// touched) or the reconciliation fails.
pub fn run(global: &GlobalOpts, opts: &LineOpts, log: &Arc<Logger>) -> Result<()> {
    let resource = LineInFile::from_options(opts.to_options())
        .with_context(|| format!("invalid line options for {}", opts.path.display()))?;

    let ctx = Context::new(
        Arc::clone(log) as Arc<dyn Log>,
        global.dry_run,
        Arc::new(SystemExecutor),
    );
    let report = tasks::execute(&resource, &ctx);
    super::finish(&[report], global, log)
}
